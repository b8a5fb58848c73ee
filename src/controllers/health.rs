//! Health check endpoints
//!
//! `/health` reports liveness only. `/ready` reflects the users-api circuit
//! breaker: while it is open every login would fail fast, so the instance
//! reports itself unready.

use actix_web::{HttpResponse, get};
use actix_web::web::{Data, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::resilience::CircuitState;
use crate::services::v1::auth::LoginService;

/// Liveness health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LivenessResponse {
    /// Service status
    pub status: String,
    /// Timestamp of the check
    pub timestamp: DateTime<Utc>,
}

/// Readiness health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessResponse {
    /// `ready` or `not_ready`
    pub status: String,
    /// Timestamp of the check
    pub timestamp: DateTime<Utc>,
    /// Application version
    pub version: String,
    /// users-api breaker state: `Closed`, `HalfOpen`, `Open` or `Disabled`
    pub users_api: String,
}

/// Liveness check endpoint
///
/// Always 200 while the process is serving requests.
#[utoipa::path(
    tag = "Health",
    responses(
        (status = 200, description = "Service is alive", body = LivenessResponse),
    )
)]
#[get("/health")]
pub async fn health() -> Json<LivenessResponse> {
    ::tracing::debug!("Liveness check: healthy");

    Json(LivenessResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
    })
}

/// Readiness probe
///
/// 503 while the users-api circuit is open.
#[utoipa::path(
    tag = "Health",
    responses(
        (status = 200, description = "Service is ready", body = ReadinessResponse),
        (status = 503, description = "users-api circuit is open", body = ReadinessResponse),
    )
)]
#[get("/ready")]
pub async fn ready(service: Data<LoginService>) -> HttpResponse {
    let state = service.breaker_state();
    let is_ready = state != Some(CircuitState::Open);
    let status = if is_ready { "ready" } else { "not_ready" };
    let users_api = state.map_or_else(|| "Disabled".to_string(), |state| state.to_string());

    ::tracing::debug!(status = %status, users_api = %users_api, "Readiness check performed");

    let response = ReadinessResponse {
        status: status.to_string(),
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        users_api,
    };

    if is_ready {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}
