use actix_web::error::JsonPayloadError;
use actix_web::web::{self, Data, JsonConfig, ServiceConfig};
use actix_web::{Error, HttpRequest};
use utoipa::OpenApi;
use utoipa_swagger_ui::{SwaggerUi, Url};

use crate::api::Definition;
use crate::controllers;
use crate::error::LoginError;
use crate::metrics::AppMetrics;

/// Largest accepted login body
const MAX_BODY: usize = 16 * 1024;

/// Register every route and the app data they share
///
/// The caller provides `Data<LoginService>`.
pub fn route(app: &mut ServiceConfig) {
    app.app_data(Data::new(AppMetrics::new()));
    app.app_data(JsonConfig::default().limit(MAX_BODY).error_handler(malformed_body));

    // Auth
    app.service(controllers::v1::auth::login);

    // Meta
    app.service(controllers::version::version);

    // Health check endpoints
    app.service(controllers::health::health);
    app.service(controllers::health::ready);

    // Metrics endpoint
    app.service(controllers::metrics::metrics);

    // must at the end!
    app.service(web::redirect("/docs", "/docs/"));
    app.service(SwaggerUi::new("/docs/{_:.*}").urls(vec![(
        Url::new("Authentication", "/api.json"),
        Definition::openapi(),
    )]));
}

/// Unreadable login bodies are an internal error, not a client error
fn malformed_body(err: JsonPayloadError, req: &HttpRequest) -> Error {
    ::tracing::warn!(path = %req.path(), error = %err, "Rejected malformed request body");
    LoginError::InvalidRequest(err.to_string()).into()
}
