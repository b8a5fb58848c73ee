//! Logging setup and distributed tracing
//!
//! `RUST_LOG` takes precedence over the configured level when set. Spans are
//! exported only when a Zipkin collector is configured.

pub mod b3;
pub mod middleware;
pub mod zipkin;

pub use b3::TraceContext;
pub use middleware::TraceMiddleware;
pub use zipkin::{PendingSpan, SpanKind, ZipkinReporter};

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{LogFormat, ObservabilityConfig};

/// Install the global tracing subscriber
///
/// Later calls are no-ops, so tests may call this freely.
pub fn init(config: &ObservabilityConfig) {
    let filter = filter(config);
    let registry = tracing_subscriber::registry().with(filter);

    let result = match config.log_format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
            .try_init(),
    };

    if result.is_err() {
        ::tracing::debug!("Tracing subscriber already installed");
    }
}

fn filter(config: &ObservabilityConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}
