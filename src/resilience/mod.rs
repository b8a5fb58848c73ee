//! Resilience patterns for calls to remote dependencies
//!
//! # Available Patterns
//!
//! - **Circuit Breaker**: stops calling a failing dependency for a cooldown
//!   period, then probes recovery with a bounded number of calls.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use auth_gateway::resilience::{CircuitBreaker, CircuitBreakerConfig};
//!
//! # async fn example() {
//! let config = CircuitBreakerConfig {
//!     min_requests: 10,
//!     failure_ratio: 0.5,
//!     interval: Duration::from_secs(30),
//!     cooldown: Duration::from_secs(10),
//!     max_probes: 3,
//! };
//!
//! let cb = CircuitBreaker::with_config("users-api", config);
//!
//! let result = cb.call(async {
//!     Ok::<_, std::io::Error>(())
//! }).await;
//! # }
//! ```

mod circuit_breaker;

pub use circuit_breaker::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError, CircuitState, Counts, Rejected,
    Ticket,
};
