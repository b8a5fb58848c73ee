use serde::{Deserialize, Serialize};

use super::{
    AuthConfig, ConfigError, ObservabilityConfig, ResilienceConfig, UsersApiConfig, Validate,
    WithDefaults,
};

/// Environment variable prefix, e.g. `AUTH_GATEWAY__SERVER__PORT=8080`
pub const ENV_PREFIX: &str = "AUTH_GATEWAY";

/// Variable names used by existing deployments, mapped onto config keys
const LEGACY_ENV: &[(&str, &str)] = &[
    ("AUTH_API_PORT", "server.port"),
    ("USERS_API_ADDRESS", "users_api.address"),
    ("JWT_SECRET", "auth.jwt.secret"),
    ("ZIPKIN_URL", "observability.tracing.collector_url"),
];

/// Top-level application configuration that aggregates all config modules
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application metadata
    #[serde(default)]
    pub app: AppMetadata,
    /// HTTP listener
    #[serde(default)]
    pub server: ServerConfig,
    /// Users API location and latency budget
    #[serde(default)]
    pub users_api: UsersApiConfig,
    /// Allow-list and token signing
    #[serde(default)]
    pub auth: AuthConfig,
    /// Circuit breaker policy
    #[serde(default)]
    pub resilience: ResilienceConfig,
    /// Logging and distributed tracing
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Application metadata configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppMetadata {
    /// Application name
    #[serde(default = "default_app_name")]
    pub name: String,
    /// Application version
    #[serde(default = "default_app_version")]
    pub version: String,
    /// Application environment (development, staging, production)
    #[serde(default = "default_environment")]
    pub environment: String,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Number of actix workers, defaults to the CPU count
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_app_name() -> String {
    "auth-gateway".to_string()
}

fn default_app_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_workers() -> usize {
    num_cpus::get()
}

impl Default for AppMetadata {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            version: default_app_version(),
            environment: default_environment(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: default_workers(),
        }
    }
}

impl Validate for AppMetadata {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.name.is_empty() {
            return Err(ConfigError::ValidationError("app.name cannot be empty".to_string()));
        }
        if self.version.is_empty() {
            return Err(ConfigError::ValidationError("app.version cannot be empty".to_string()));
        }
        if self.environment.is_empty() {
            return Err(ConfigError::ValidationError("app.environment cannot be empty".to_string()));
        }
        Ok(())
    }
}

impl Validate for ServerConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::ValidationError("server.host cannot be empty".to_string()));
        }
        if self.port == 0 {
            return Err(ConfigError::ValidationError("server.port must be > 0".to_string()));
        }
        if self.workers == 0 {
            return Err(ConfigError::ValidationError("server.workers must be > 0".to_string()));
        }
        Ok(())
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.app.validate()?;
        self.server.validate()?;
        self.users_api.validate()?;
        self.auth.validate()?;
        self.resilience.validate()?;
        self.observability.validate()?;
        Ok(())
    }
}

impl WithDefaults for AppConfig {
    fn with_defaults() -> Self {
        Self {
            app: AppMetadata::default(),
            server: ServerConfig::default(),
            users_api: UsersApiConfig::with_defaults(),
            auth: AuthConfig::with_defaults(),
            resilience: ResilienceConfig::with_defaults(),
            observability: ObservabilityConfig::with_defaults(),
        }
    }
}

/// Load configuration from files and environment variables
///
/// Configuration loading follows this precedence (highest to lowest):
/// 1. Legacy variables: AUTH_API_PORT, USERS_API_ADDRESS, JWT_SECRET, ZIPKIN_URL
/// 2. Environment variables: AUTH_GATEWAY__SERVER__PORT=8080
/// 3. config/local.toml (git-ignored, developer overrides)
/// 4. config/{APP_ENV}.toml (development/staging/production)
/// 5. config/default.toml (base defaults)
pub fn load_config() -> Result<AppConfig, ConfigError> {
    use config::{Config, Environment, File};

    let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

    let mut builder = Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name(&format!("config/{}", env)).required(false))
        .add_source(File::with_name("config/local").required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("auth.allowed_credentials")
                .try_parsing(true),
        );

    for (variable, key) in LEGACY_ENV {
        let value = std::env::var(variable).ok().filter(|value| !value.is_empty());
        builder = builder.set_override_option(*key, value)?;
    }

    let app_config: AppConfig = builder.build()?.try_deserialize()?;

    app_config.validate()?;

    Ok(app_config)
}
