//! Login error taxonomy and its HTTP mapping
//!
//! Only coarse categories cross the HTTP boundary. Variants carry the detail
//! that goes to server-side logs; the response body never does.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::clients::DependencyError;
use crate::resilience::CircuitBreakerError;
use crate::security::TokenError;

pub const GENERIC_MESSAGE: &str = "something went wrong, please try again later";
pub const WRONG_CREDENTIALS_MESSAGE: &str = "username or password is invalid";
pub const DEPENDENCY_UNAVAILABLE_MESSAGE: &str = "users-api unavailable, try again later";

/// Body of every error response
#[derive(Clone, Debug, Deserialize, Serialize, ToSchema, PartialEq, Eq)]
pub struct ErrorResponse {
    #[schema(example = "username or password is invalid")]
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    /// The request body could not be read as credentials
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// Unknown user or wrong password, deliberately indistinguishable
    #[error("username or password is invalid")]
    CredentialsInvalid,
    /// Breaker open, transport failure, non-2xx answer or deadline exceeded
    #[error("users-api unavailable: {0}")]
    DependencyUnavailable(String),
    /// The users API answered 2xx with a body that is not a user record
    #[error("users-api returned an undecodable user record: {0}")]
    UnreadableUser(#[source] serde_json::Error),
    #[error(transparent)]
    Signing(#[from] TokenError),
}

impl LoginError {
    /// Label used in logs and the `auth_login_attempts_total` metric
    pub fn outcome(&self) -> &'static str {
        match self {
            LoginError::InvalidRequest(_) => "invalid_request",
            LoginError::CredentialsInvalid => "invalid_credentials",
            LoginError::DependencyUnavailable(_) => "dependency_unavailable",
            LoginError::UnreadableUser(_) => "unreadable_user",
            LoginError::Signing(_) => "signing_failure",
        }
    }

    fn public_message(&self) -> &'static str {
        match self {
            LoginError::CredentialsInvalid => WRONG_CREDENTIALS_MESSAGE,
            LoginError::DependencyUnavailable(_) => DEPENDENCY_UNAVAILABLE_MESSAGE,
            _ => GENERIC_MESSAGE,
        }
    }
}

impl From<DependencyError> for LoginError {
    fn from(e: DependencyError) -> Self {
        match e {
            DependencyError::NotFound => LoginError::CredentialsInvalid,
            DependencyError::Decode(e) => LoginError::UnreadableUser(e),
            e @ (DependencyError::Transport(_)
            | DependencyError::Timeout
            | DependencyError::Status { .. }) => LoginError::DependencyUnavailable(e.to_string()),
        }
    }
}

impl From<CircuitBreakerError<DependencyError>> for LoginError {
    fn from(e: CircuitBreakerError<DependencyError>) -> Self {
        match e {
            CircuitBreakerError::Rejected(rejected) => {
                LoginError::DependencyUnavailable(rejected.to_string())
            }
            CircuitBreakerError::Inner(e) => e.into(),
        }
    }
}

impl ResponseError for LoginError {
    fn status_code(&self) -> StatusCode {
        match self {
            LoginError::CredentialsInvalid => StatusCode::UNAUTHORIZED,
            LoginError::DependencyUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            LoginError::InvalidRequest(_)
            | LoginError::UnreadableUser(_)
            | LoginError::Signing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            message: self.public_message().to_string(),
        })
    }
}
