pub mod api;
pub mod clients;
pub mod config;
pub mod controllers;
pub mod error;
pub mod metrics;
pub mod models;
pub mod requests;
pub mod resilience;
pub mod responses;
pub mod router;
pub mod security;
pub mod services;
pub mod telemetry;

// Testing utilities (always available for integration tests)
pub mod testing;

// Re-export commonly used types for convenience
pub use clients::{DependencyCaller, PlainCaller, TracedCaller, UsersClient};
pub use error::LoginError;
pub use metrics::{AppMetrics, MetricsMiddleware};
pub use resilience::{CircuitBreaker, CircuitState};
pub use security::{AllowSet, TokenIssuer};
pub use services::v1::auth::LoginService;
pub use telemetry::{TraceContext, TraceMiddleware, ZipkinReporter};
