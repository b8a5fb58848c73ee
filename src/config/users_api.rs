use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{ConfigError, Validate, WithDefaults};

/// Location and latency budget of the users API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsersApiConfig {
    /// Base address, e.g. `http://users-api:8083`
    #[serde(default = "default_address")]
    pub address: String,
    /// Transport timeout of a single outbound request, in milliseconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
    /// Budget of a whole login attempt, in milliseconds
    #[serde(default = "default_login_deadline")]
    pub login_deadline_ms: u64,
}

fn default_address() -> String {
    "http://127.0.0.1:8083".to_string()
}

fn default_request_timeout() -> u64 {
    800
}

fn default_login_deadline() -> u64 {
    900
}

impl UsersApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn login_deadline(&self) -> Duration {
        Duration::from_millis(self.login_deadline_ms)
    }
}

impl Default for UsersApiConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            request_timeout_ms: default_request_timeout(),
            login_deadline_ms: default_login_deadline(),
        }
    }
}

impl Validate for UsersApiConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.address.starts_with("http://") || self.address.starts_with("https://")) {
            return Err(ConfigError::ValidationError(format!(
                "users_api.address must be an http(s) URL, got '{}'",
                self.address
            )));
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::ValidationError("users_api.request_timeout_ms must be > 0".to_string()));
        }
        if self.login_deadline_ms == 0 {
            return Err(ConfigError::ValidationError("users_api.login_deadline_ms must be > 0".to_string()));
        }
        Ok(())
    }
}

impl WithDefaults for UsersApiConfig {
    fn with_defaults() -> Self {
        Self::default()
    }
}
