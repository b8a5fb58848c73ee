use serde::{Deserialize, Serialize};

use super::{ConfigError, Validate, WithDefaults};

/// Logging and distributed tracing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Log line format
    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,
    /// Outbound trace propagation
    #[serde(default)]
    pub tracing: TracingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Distributed tracing configuration
///
/// When a collector is configured, inbound requests and users API calls are
/// recorded as spans and exported to it in Zipkin v2 JSON, and B3 headers are
/// propagated to the users API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TracingConfig {
    /// Zipkin-compatible span endpoint, e.g. `http://zipkin:9411/api/v2/spans`
    #[serde(default)]
    pub collector_url: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
            tracing: TracingConfig::default(),
        }
    }
}

impl Validate for ObservabilityConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.log_level.is_empty() {
            return Err(ConfigError::ValidationError("observability.log_level cannot be empty".to_string()));
        }
        if let Some(url) = &self.tracing.collector_url
            && !(url.starts_with("http://") || url.starts_with("https://"))
        {
            return Err(ConfigError::ValidationError(format!(
                "observability.tracing.collector_url must be an http(s) URL, got '{}'",
                url
            )));
        }
        Ok(())
    }
}

impl WithDefaults for ObservabilityConfig {
    fn with_defaults() -> Self {
        Self::default()
    }
}
