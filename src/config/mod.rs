pub mod app;
pub mod auth;
pub mod observability;
pub mod resilience;
pub mod users_api;

pub use app::{AppConfig, AppMetadata, ServerConfig};
pub use auth::{AuthConfig, JwtConfig};
pub use observability::{LogFormat, ObservabilityConfig, TracingConfig};
pub use resilience::{CircuitBreakerConfig, ResilienceConfig};
pub use users_api::UsersApiConfig;

/// Errors raised while loading or validating configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("invalid configuration: {0}")]
    ValidationError(String),
}

/// Semantic validation applied after deserialization
pub trait Validate {
    fn validate(&self) -> Result<(), ConfigError>;
}

/// Construct a section populated with its built-in defaults
pub trait WithDefaults {
    fn with_defaults() -> Self;
}

/// Load the application configuration from files and environment variables
pub fn load() -> Result<AppConfig, ConfigError> {
    app::load_config()
}
