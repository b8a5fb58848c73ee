use serde::{Deserialize, Serialize};

use super::{ConfigError, Validate, WithDefaults};

/// Longest accepted token lifetime, ten years in seconds
pub const MAX_TOKEN_TTL: u64 = 10 * 365 * 24 * 60 * 60;

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthConfig {
    /// Accepted `username_password` keys
    #[serde(default)]
    pub allowed_credentials: Vec<String>,
    /// Token signing configuration
    #[serde(default = "JwtConfig::default")]
    pub jwt: JwtConfig,
}

/// JWT (JSON Web Token) configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// HS256 secret, shared with the users API. No fallback value is provided.
    #[serde(default)]
    pub secret: String,
    /// Lifetime of user access tokens in seconds
    #[serde(default = "default_access_token_ttl")]
    pub access_token_ttl: u64,
    /// Lifetime of service tokens presented to the users API, in seconds
    #[serde(default = "default_service_token_ttl")]
    pub service_token_ttl: u64,
    /// Scope claim carried by service tokens
    #[serde(default = "default_service_scope")]
    pub service_scope: String,
}

fn default_access_token_ttl() -> u64 {
    72 * 60 * 60 // 72 hours
}

fn default_service_token_ttl() -> u64 {
    60
}

fn default_service_scope() -> String {
    "read".to_string()
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            access_token_ttl: default_access_token_ttl(),
            service_token_ttl: default_service_token_ttl(),
            service_scope: default_service_scope(),
        }
    }
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("access_token_ttl", &self.access_token_ttl)
            .field("service_token_ttl", &self.service_token_ttl)
            .field("service_scope", &self.service_scope)
            .finish()
    }
}

impl Validate for AuthConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.allowed_credentials.iter().any(|key| key.is_empty()) {
            return Err(ConfigError::ValidationError(
                "auth.allowed_credentials cannot contain empty entries".to_string(),
            ));
        }
        self.jwt.validate()
    }
}

impl Validate for JwtConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.secret.is_empty() {
            return Err(ConfigError::ValidationError(
                "auth.jwt.secret must be set (JWT_SECRET or AUTH_GATEWAY__AUTH__JWT__SECRET)".to_string(),
            ));
        }
        if !(1..=MAX_TOKEN_TTL).contains(&self.access_token_ttl) {
            return Err(ConfigError::ValidationError(format!(
                "auth.jwt.access_token_ttl must be between 1 and {} seconds",
                MAX_TOKEN_TTL
            )));
        }
        if !(1..=MAX_TOKEN_TTL).contains(&self.service_token_ttl) {
            return Err(ConfigError::ValidationError(format!(
                "auth.jwt.service_token_ttl must be between 1 and {} seconds",
                MAX_TOKEN_TTL
            )));
        }
        if self.service_scope.is_empty() {
            return Err(ConfigError::ValidationError("auth.jwt.service_scope cannot be empty".to_string()));
        }
        Ok(())
    }
}

impl WithDefaults for AuthConfig {
    fn with_defaults() -> Self {
        Self::default()
    }
}
