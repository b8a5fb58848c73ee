//! Configuration loading tests
//!
//! These mutate process environment variables, so every test is `#[serial]`.

use auth_gateway::config::*;
use serial_test::serial;

const LEGACY: &[&str] = &["AUTH_API_PORT", "USERS_API_ADDRESS", "JWT_SECRET", "ZIPKIN_URL"];

mod utils {
    /// Remove every variable the loader reads
    pub fn clean_env_vars() {
        let keys: Vec<String> = std::env::vars()
            .filter(|(k, _)| k.starts_with(auth_gateway::config::app::ENV_PREFIX))
            .map(|(k, _)| k)
            .collect();

        for key in keys.iter().map(String::as_str).chain(super::LEGACY.iter().copied()) {
            unsafe { std::env::remove_var(key) };
        }
        unsafe { std::env::remove_var("APP_ENV") };
    }

    pub fn set(key: &str, value: &str) {
        unsafe { std::env::set_var(key, value) };
    }
}

// =============================================================================
// Files
// =============================================================================

#[test]
#[serial]
fn test_load_development_config() {
    utils::clean_env_vars();

    let config = load().expect("development config should load");

    assert_eq!(config.app.name, "auth-gateway");
    assert_eq!(config.app.environment, "development");
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.users_api.address, "http://127.0.0.1:8083");
    assert_eq!(config.users_api.request_timeout_ms, 800);
    assert_eq!(config.users_api.login_deadline_ms, 900);
    assert_eq!(
        config.auth.allowed_credentials,
        vec!["admin_admin", "johnd_foo", "janed_ddd"]
    );
    assert!(!config.auth.jwt.secret.is_empty());
    assert_eq!(config.auth.jwt.access_token_ttl, 259_200);
    assert_eq!(config.auth.jwt.service_scope, "read");
    assert!(config.resilience.circuit_breaker.enabled);
    assert_eq!(config.resilience.circuit_breaker.min_requests, 10);
    assert_eq!(config.observability.log_format, LogFormat::Pretty);
    assert!(config.observability.tracing.collector_url.is_none());
}

#[test]
#[serial]
fn test_production_requires_a_secret() {
    utils::clean_env_vars();
    utils::set("APP_ENV", "production");

    let err = load().unwrap_err();

    assert!(matches!(err, ConfigError::ValidationError(_)));
    assert!(err.to_string().contains("auth.jwt.secret"));

    utils::clean_env_vars();
}

#[test]
#[serial]
fn test_production_overlay() {
    utils::clean_env_vars();
    utils::set("APP_ENV", "production");
    utils::set("JWT_SECRET", "prod-secret");

    let config = load().expect("production config should load");

    assert_eq!(config.app.environment, "production");
    assert_eq!(config.observability.log_format, LogFormat::Json);
    assert_eq!(config.auth.jwt.secret, "prod-secret");

    utils::clean_env_vars();
}

// =============================================================================
// Environment variables
// =============================================================================

#[test]
#[serial]
fn test_prefixed_env_overrides_files() {
    utils::clean_env_vars();
    utils::set("AUTH_GATEWAY__SERVER__PORT", "9090");
    utils::set("AUTH_GATEWAY__USERS_API__LOGIN_DEADLINE_MS", "1500");
    utils::set("AUTH_GATEWAY__RESILIENCE__CIRCUIT_BREAKER__ENABLED", "false");

    let config = load().unwrap();

    assert_eq!(config.server.port, 9090);
    assert_eq!(config.users_api.login_deadline_ms, 1500);
    assert!(!config.resilience.circuit_breaker.enabled);

    utils::clean_env_vars();
}

#[test]
#[serial]
fn test_allowed_credentials_from_env_list() {
    utils::clean_env_vars();
    utils::set("AUTH_GATEWAY__AUTH__ALLOWED_CREDENTIALS", "alice_wonder,bob_builder");

    let config = load().unwrap();

    assert_eq!(
        config.auth.allowed_credentials,
        vec!["alice_wonder", "bob_builder"]
    );

    utils::clean_env_vars();
}

#[test]
#[serial]
fn test_legacy_variables_are_honoured() {
    utils::clean_env_vars();
    utils::set("AUTH_API_PORT", "8081");
    utils::set("USERS_API_ADDRESS", "http://users-api:8083");
    utils::set("JWT_SECRET", "legacy-secret");
    utils::set("ZIPKIN_URL", "http://zipkin:9411/api/v2/spans");

    let config = load().unwrap();

    assert_eq!(config.server.port, 8081);
    assert_eq!(config.users_api.address, "http://users-api:8083");
    assert_eq!(config.auth.jwt.secret, "legacy-secret");
    assert_eq!(
        config.observability.tracing.collector_url.as_deref(),
        Some("http://zipkin:9411/api/v2/spans")
    );

    utils::clean_env_vars();
}

#[test]
#[serial]
fn test_legacy_variables_take_precedence() {
    utils::clean_env_vars();
    utils::set("AUTH_GATEWAY__SERVER__PORT", "9090");
    utils::set("AUTH_API_PORT", "8081");

    let config = load().unwrap();

    assert_eq!(config.server.port, 8081);

    utils::clean_env_vars();
}

#[test]
#[serial]
fn test_empty_legacy_variable_is_ignored() {
    utils::clean_env_vars();
    utils::set("ZIPKIN_URL", "");

    let config = load().unwrap();

    assert!(config.observability.tracing.collector_url.is_none());

    utils::clean_env_vars();
}

// =============================================================================
// Validation
// =============================================================================

#[test]
#[serial]
fn test_invalid_failure_ratio_is_rejected() {
    utils::clean_env_vars();
    utils::set("AUTH_GATEWAY__RESILIENCE__CIRCUIT_BREAKER__FAILURE_RATIO", "1.5");

    let err = load().unwrap_err();

    assert!(err.to_string().contains("failure_ratio"));

    utils::clean_env_vars();
}

#[test]
#[serial]
fn test_invalid_users_api_address_is_rejected() {
    utils::clean_env_vars();
    utils::set("USERS_API_ADDRESS", "users-api:8083");

    let err = load().unwrap_err();

    assert!(err.to_string().contains("users_api.address"));

    utils::clean_env_vars();
}

#[test]
#[serial]
fn test_unparseable_value_is_a_load_error() {
    utils::clean_env_vars();
    utils::set("AUTH_GATEWAY__SERVER__PORT", "not-a-port");

    let err = load().unwrap_err();

    assert!(matches!(err, ConfigError::Load(_)));

    utils::clean_env_vars();
}
