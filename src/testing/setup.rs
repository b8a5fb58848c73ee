use std::sync::Arc;
use std::time::Duration;

use crate::clients::{DependencyCaller, UsersClient};
use crate::config::{AppConfig, WithDefaults};
use crate::resilience::CircuitBreaker;
use crate::security::{AllowSet, TokenIssuer};
use crate::services::v1::auth::LoginService;
use crate::services::v1::auth::login::USERS_API;

pub const SECRET: &str = "test-secret-do-not-use-in-production";
pub const USERS_API_ADDRESS: &str = "http://users-api:8083";

/// The credentials every deployment ships with
pub fn allow_set() -> AllowSet {
    AllowSet::new(["admin_admin", "johnd_foo", "janed_ddd"])
}

pub fn token_issuer() -> TokenIssuer {
    TokenIssuer::new(SECRET.as_bytes(), Duration::from_secs(60), "read")
}

/// Defaults plus a signing secret and the shipped allow-list
pub fn config() -> AppConfig {
    let mut config = AppConfig::with_defaults();
    config.auth.jwt.secret = SECRET.to_string();
    config.auth.allowed_credentials = ["admin_admin", "johnd_foo", "janed_ddd"]
        .map(String::from)
        .to_vec();
    config.users_api.address = USERS_API_ADDRESS.to_string();
    config
}

/// A login service talking to `caller`, guarded by a default breaker
pub fn login_service(caller: Arc<dyn DependencyCaller>) -> LoginService {
    LoginService::new(
        UsersClient::new(USERS_API_ADDRESS, caller),
        Some(CircuitBreaker::new(USERS_API)),
        allow_set(),
        token_issuer(),
    )
}
