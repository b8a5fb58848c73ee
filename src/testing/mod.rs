//! Helpers shared by unit and integration tests
//!
//! Always compiled so that `tests/` can use them.

pub mod setup;
pub mod stub;

pub use stub::{Reply, StubCaller};

/// Build an initialized actix test service around a [`LoginService`]
///
/// Registers the same app data and routes as the real server.
///
/// [`LoginService`]: crate::services::v1::auth::LoginService
#[macro_export]
macro_rules! service {
    ($login:expr) => {{
        let app = ::actix_web::App::new()
            .app_data(::actix_web::web::Data::new($login))
            .configure($crate::router::route);

        ::actix_web::test::init_service(app).await
    }};
}
