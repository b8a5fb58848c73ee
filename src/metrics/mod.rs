pub mod middleware;

pub use middleware::MetricsMiddleware;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::fmt;
use std::sync::{Arc, OnceLock};

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

const LATENCY_BUCKETS: &[f64] = &[0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 0.9, 1.0, 5.0];

#[derive(Clone)]
pub struct AppMetrics {
    prometheus_handle: Arc<PrometheusHandle>,
}

impl AppMetrics {
    pub fn new() -> Self {
        Self::with_config(None)
    }

    /// Install the process-wide Prometheus recorder on first use
    ///
    /// Later calls reuse the installed recorder; their config is ignored.
    pub fn with_config(config: Option<&crate::config::AppConfig>) -> Self {
        let handle = PROMETHEUS_HANDLE.get_or_init(|| {
            let builder = PrometheusBuilder::new();

            // Add global labels from config
            let builder = if let Some(cfg) = config {
                builder
                    .add_global_label("service", cfg.app.name.clone())
                    .add_global_label("version", cfg.app.version.clone())
                    .add_global_label("environment", cfg.app.environment.clone())
            } else {
                builder
            };

            let builder = builder
                .set_buckets_for_metric(
                    Matcher::Full("http_requests_duration_seconds".to_string()),
                    LATENCY_BUCKETS,
                )
                .expect("Failed to set buckets for http_requests_duration_seconds")
                .set_buckets_for_metric(
                    Matcher::Full("users_api_requests_duration_seconds".to_string()),
                    LATENCY_BUCKETS,
                )
                .expect("Failed to set buckets for users_api_requests_duration_seconds");

            let handle = builder
                .install_recorder()
                .expect("Failed to install Prometheus recorder");

            // descriptions only stick once the recorder is installed
            Self::describe_metrics();

            handle
        });

        Self {
            prometheus_handle: Arc::new(handle.clone()),
        }
    }

    fn describe_metrics() {
        // HTTP metrics
        describe_counter!("http_requests_total", "Total number of HTTP requests");
        describe_histogram!(
            "http_requests_duration_seconds",
            "HTTP request duration in seconds"
        );
        describe_gauge!(
            "http_requests_in_flight",
            "Number of HTTP requests currently being processed"
        );

        // Auth metrics
        describe_counter!(
            "auth_login_attempts_total",
            "Total number of login attempts by outcome"
        );

        // Dependency metrics
        describe_histogram!(
            "users_api_requests_duration_seconds",
            "Duration of users-api lookups in seconds, by outcome"
        );
        describe_gauge!(
            "circuit_breaker_state",
            "Circuit breaker state (0 closed, 1 half-open, 2 open)"
        );
    }

    // HTTP metrics
    pub fn record_http_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        counter!(
            "http_requests_total",
            "method" => method.to_string(),
            "path" => path.to_string(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            "http_requests_duration_seconds",
            "method" => method.to_string(),
            "path" => path.to_string()
        )
        .record(duration_secs);
    }

    pub fn http_request_start(&self) {
        gauge!("http_requests_in_flight").increment(1.0);
    }

    pub fn http_request_end(&self) {
        gauge!("http_requests_in_flight").decrement(1.0);
    }

    // Auth metrics
    pub fn record_login_attempt(&self, outcome: &'static str) {
        counter!("auth_login_attempts_total", "outcome" => outcome).increment(1);
    }

    // Dependency metrics
    pub fn record_users_api_call(&self, outcome: &'static str, duration_secs: f64) {
        histogram!("users_api_requests_duration_seconds", "outcome" => outcome).record(duration_secs);
    }

    // Prometheus export
    pub fn render(&self) -> String {
        self.prometheus_handle.render()
    }
}

impl Default for AppMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AppMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppMetrics").finish_non_exhaustive()
    }
}
