use actix_web::post;
use actix_web::web::{Data, Json, ReqData};

use crate::error::{ErrorResponse, LoginError};
use crate::metrics::AppMetrics;
use crate::requests::v1::auth::LoginRequest;
use crate::responses::v1::auth::Authenticated;
use crate::services::v1::auth::LoginService;
use crate::telemetry::TraceContext;

/// Exchange a username and password for an access token
///
/// Fail if:
/// - the user does not exist or the password is wrong (401, same message)
/// - users-api is unreachable, slow, failing, or its circuit is open (503)
/// - users-api returned something that is not a user record (500)
#[utoipa::path(
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        Authenticated,
        (status = 401, description = "Unknown user or wrong password", body = ErrorResponse),
        (status = 500, description = "Malformed request or unexpected failure", body = ErrorResponse),
        (status = 503, description = "users-api unavailable", body = ErrorResponse),
    )
)]
#[post("/login")]
pub async fn login(
    service: Data<LoginService>,
    metrics: Data<AppMetrics>,
    trace: Option<ReqData<TraceContext>>,
    Json(request): Json<LoginRequest>,
) -> Result<Authenticated, LoginError> {
    let result = service
        .login_traced(&request.username, &request.password, trace.as_deref())
        .await;

    let outcome = match &result {
        Ok(_) => "success",
        Err(e) => {
            ::tracing::warn!(
                username = %request.username,
                outcome = e.outcome(),
                error = %e,
                "Login failed"
            );
            e.outcome()
        }
    };

    metrics.record_login_attempt(outcome);

    let signed = result?;
    Ok(Authenticated {
        access_token: signed.token,
    })
}
