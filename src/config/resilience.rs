use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{ConfigError, Validate, WithDefaults};

/// Resilience configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ResilienceConfig {
    /// Circuit breaker guarding the users API
    #[serde(default = "CircuitBreakerConfig::default")]
    pub circuit_breaker: CircuitBreakerConfig,
}

/// Circuit breaker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    /// Enable circuit breaker
    #[serde(default = "default_circuit_breaker_enabled")]
    pub enabled: bool,
    /// Minimum number of requests in a window before the breaker may trip
    #[serde(default = "default_min_requests")]
    pub min_requests: u32,
    /// Failure ratio (0.0 - 1.0] at which the breaker trips
    #[serde(default = "default_failure_ratio")]
    pub failure_ratio: f64,
    /// Observation window in seconds; counts reset when it elapses
    #[serde(default = "default_interval")]
    pub interval: u64,
    /// Seconds the breaker stays open before probing
    #[serde(default = "default_cooldown")]
    pub cooldown: u64,
    /// Probes admitted while half-open; that many successes close the breaker
    #[serde(default = "default_max_probes")]
    pub max_probes: u32,
}

fn default_circuit_breaker_enabled() -> bool {
    true
}

fn default_min_requests() -> u32 {
    10
}

fn default_failure_ratio() -> f64 {
    0.5
}

fn default_interval() -> u64 {
    30
}

fn default_cooldown() -> u64 {
    10
}

fn default_max_probes() -> u32 {
    3
}

impl CircuitBreakerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown)
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            enabled: default_circuit_breaker_enabled(),
            min_requests: default_min_requests(),
            failure_ratio: default_failure_ratio(),
            interval: default_interval(),
            cooldown: default_cooldown(),
            max_probes: default_max_probes(),
        }
    }
}

impl Validate for ResilienceConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.circuit_breaker.validate()
    }
}

impl Validate for CircuitBreakerConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !self.enabled {
            return Ok(());
        }
        if self.min_requests == 0 {
            return Err(ConfigError::ValidationError("resilience.circuit_breaker.min_requests must be > 0 when circuit breaker is enabled".to_string()));
        }
        if !(self.failure_ratio > 0.0 && self.failure_ratio <= 1.0) {
            return Err(ConfigError::ValidationError("resilience.circuit_breaker.failure_ratio must be within (0.0, 1.0]".to_string()));
        }
        if self.cooldown == 0 {
            return Err(ConfigError::ValidationError("resilience.circuit_breaker.cooldown must be > 0 when circuit breaker is enabled".to_string()));
        }
        if self.max_probes == 0 {
            return Err(ConfigError::ValidationError("resilience.circuit_breaker.max_probes must be > 0 when circuit breaker is enabled".to_string()));
        }
        Ok(())
    }
}

impl WithDefaults for ResilienceConfig {
    fn with_defaults() -> Self {
        Self::default()
    }
}

impl WithDefaults for CircuitBreakerConfig {
    fn with_defaults() -> Self {
        Self::default()
    }
}
