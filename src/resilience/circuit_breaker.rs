//! Circuit Breaker Pattern Implementation
//!
//! Guards calls to a remote dependency. The breaker observes the outcome of
//! every admitted call and stops sending traffic once the dependency looks
//! unhealthy, then cautiously probes for recovery.
//!
//! # State Machine
//!
//! ```text
//! ┌─────────┐
//! │ Closed  │ ◄──────────────────┐
//! │ (Normal)│                    │
//! └────┬────┘                    │
//!      │ requests >= min_requests│ max_probes
//!      │ and failure ratio       │ consecutive successes
//!      │ >= failure_ratio        │
//!      ▼                         │
//! ┌─────────┐    cooldown   ┌────┴──────┐
//! │  Open   │───────────────► HalfOpen  │
//! │(Failing)│                │ (Probing) │
//! └─────────┘◄───────────────└───────────┘
//!                any failure
//! ```
//!
//! While closed, counts are kept for a fixed observation window and cleared
//! whenever the window elapses. Every state change starts a new generation;
//! outcomes reported for an older generation are discarded so a slow call
//! admitted before a transition cannot disturb the new state.
//!
//! # Example
//!
//! ```rust
//! use auth_gateway::resilience::CircuitBreaker;
//!
//! # async fn example() {
//! let cb = CircuitBreaker::new("users-api");
//!
//! let result = cb.call(async { Ok::<_, std::io::Error>(42) }).await;
//! assert!(result.is_ok());
//! # }
//! ```

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::time::{Duration, Instant};

/// Circuit breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Normal operation, allowing all requests through
    Closed,
    /// Failing state, rejecting all requests until the cooldown expires
    Open,
    /// Testing state, allowing a bounded number of probes through
    HalfOpen,
}

impl CircuitState {
    /// Numeric encoding used by the `circuit_breaker_state` gauge
    pub fn as_gauge(self) -> f64 {
        match self {
            CircuitState::Closed => 0.0,
            CircuitState::HalfOpen => 1.0,
            CircuitState::Open => 2.0,
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "Closed"),
            CircuitState::Open => write!(f, "Open"),
            CircuitState::HalfOpen => write!(f, "HalfOpen"),
        }
    }
}

/// Outcome counters of the current generation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub requests: u32,
    pub total_successes: u32,
    pub total_failures: u32,
    pub consecutive_successes: u32,
    pub consecutive_failures: u32,
}

impl Counts {
    fn on_request(&mut self) {
        self.requests += 1;
    }

    fn on_success(&mut self) {
        self.total_successes += 1;
        self.consecutive_successes += 1;
        self.consecutive_failures = 0;
    }

    fn on_failure(&mut self) {
        self.total_failures += 1;
        self.consecutive_failures += 1;
        self.consecutive_successes = 0;
    }

    /// Failures over admitted requests (0.0 when nothing was admitted)
    pub fn failure_ratio(&self) -> f64 {
        if self.requests == 0 {
            return 0.0;
        }
        self.total_failures as f64 / self.requests as f64
    }
}

/// Circuit breaker configuration
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Minimum requests in the window before the breaker may trip
    pub min_requests: u32,
    /// Failure ratio at which the breaker trips
    pub failure_ratio: f64,
    /// Length of the closed-state observation window; zero never clears counts
    pub interval: Duration,
    /// How long the breaker stays open
    pub cooldown: Duration,
    /// Probes admitted while half-open
    pub max_probes: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            min_requests: 10,
            failure_ratio: 0.5,
            interval: Duration::from_secs(30),
            cooldown: Duration::from_secs(10),
            max_probes: 3,
        }
    }
}

impl From<&crate::config::CircuitBreakerConfig> for CircuitBreakerConfig {
    fn from(settings: &crate::config::CircuitBreakerConfig) -> Self {
        Self {
            min_requests: settings.min_requests,
            failure_ratio: settings.failure_ratio,
            interval: settings.interval(),
            cooldown: settings.cooldown(),
            max_probes: settings.max_probes,
        }
    }
}

/// Why a call was not admitted
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejected {
    #[error("circuit breaker {name} is open")]
    Open { name: String },
    #[error("circuit breaker {name} is half-open and all probe slots are taken")]
    TooManyRequests { name: String },
}

/// Circuit breaker error
#[derive(Debug, thiserror::Error)]
pub enum CircuitBreakerError<E> {
    /// The breaker refused to run the operation
    #[error(transparent)]
    Rejected(#[from] Rejected),
    /// The underlying operation failed
    #[error("operation failed: {0}")]
    Inner(#[source] E),
}

#[derive(Debug)]
struct Inner {
    state: CircuitState,
    generation: u64,
    counts: Counts,
    expiry: Option<Instant>,
}

struct Shared {
    name: String,
    config: CircuitBreakerConfig,
    inner: Mutex<Inner>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Applies time-driven transitions and returns the state and generation in effect at `now`
    fn current(&self, inner: &mut Inner, now: Instant) -> (CircuitState, u64) {
        match inner.state {
            CircuitState::Closed => {
                if inner.expiry.is_some_and(|expiry| expiry <= now) {
                    self.new_generation(inner, now);
                }
            }
            CircuitState::Open => {
                if inner.expiry.is_some_and(|expiry| expiry <= now) {
                    self.set_state(inner, CircuitState::HalfOpen, now);
                }
            }
            CircuitState::HalfOpen => {}
        }
        (inner.state, inner.generation)
    }

    fn set_state(&self, inner: &mut Inner, state: CircuitState, now: Instant) {
        if inner.state == state {
            return;
        }

        let previous = inner.state;
        inner.state = state;
        self.new_generation(inner, now);

        ::metrics::gauge!("circuit_breaker_state", "name" => self.name.clone()).set(state.as_gauge());

        match state {
            CircuitState::Open => tracing::warn!(
                circuit_breaker = %self.name,
                state = %format_args!("{} -> {}", previous, state),
                cooldown_ms = self.config.cooldown.as_millis() as u64,
                "Circuit breaker opened"
            ),
            _ => tracing::info!(
                circuit_breaker = %self.name,
                state = %format_args!("{} -> {}", previous, state),
                "Circuit breaker state changed"
            ),
        }
    }

    fn new_generation(&self, inner: &mut Inner, now: Instant) {
        inner.generation += 1;
        inner.counts = Counts::default();
        inner.expiry = match inner.state {
            CircuitState::Closed if self.config.interval.is_zero() => None,
            CircuitState::Closed => Some(now + self.config.interval),
            CircuitState::Open => Some(now + self.config.cooldown),
            CircuitState::HalfOpen => None,
        };
    }

    fn ready_to_trip(&self, counts: &Counts) -> bool {
        counts.requests >= self.config.min_requests
            && counts.failure_ratio() >= self.config.failure_ratio
    }

    fn on_success(&self, inner: &mut Inner, state: CircuitState, now: Instant) {
        match state {
            CircuitState::Closed => inner.counts.on_success(),
            CircuitState::HalfOpen => {
                inner.counts.on_success();
                if inner.counts.consecutive_successes >= self.config.max_probes {
                    self.set_state(inner, CircuitState::Closed, now);
                }
            }
            CircuitState::Open => {}
        }
    }

    fn on_failure(&self, inner: &mut Inner, state: CircuitState, now: Instant) {
        match state {
            CircuitState::Closed => {
                inner.counts.on_failure();
                if self.ready_to_trip(&inner.counts) {
                    tracing::debug!(
                        circuit_breaker = %self.name,
                        requests = inner.counts.requests,
                        failures = inner.counts.total_failures,
                        "Failure ratio reached"
                    );
                    self.set_state(inner, CircuitState::Open, now);
                }
            }
            CircuitState::HalfOpen => self.set_state(inner, CircuitState::Open, now),
            CircuitState::Open => {}
        }
    }
}

/// Admission granted by [`CircuitBreaker::allow_request`]
///
/// Hand it back through [`CircuitBreaker::record_outcome`]. A ticket dropped
/// without an outcome (the caller went away) gives its slot back without
/// counting as success or failure.
#[must_use = "report the outcome with CircuitBreaker::record_outcome"]
pub struct Ticket {
    shared: Arc<Shared>,
    generation: u64,
    settled: bool,
}

impl fmt::Debug for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ticket")
            .field("circuit_breaker", &self.shared.name)
            .field("generation", &self.generation)
            .finish()
    }
}

impl Drop for Ticket {
    fn drop(&mut self) {
        if self.settled {
            return;
        }

        let mut inner = self.shared.lock();
        let (_, generation) = self.shared.current(&mut inner, Instant::now());
        if generation == self.generation {
            inner.counts.requests = inner.counts.requests.saturating_sub(1);
        }
    }
}

/// Windowed, ratio-based circuit breaker
///
/// All state lives behind a single mutex, so concurrent callers always observe
/// one consistent state and exactly one of them performs any given transition.
/// Cloning is cheap and clones share state.
#[derive(Clone)]
pub struct CircuitBreaker {
    shared: Arc<Shared>,
}

impl CircuitBreaker {
    /// Create a new circuit breaker with default configuration
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, CircuitBreakerConfig::default())
    }

    /// Create a new circuit breaker with custom configuration
    pub fn with_config(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        let name = name.into();
        let now = Instant::now();
        let expiry = (!config.interval.is_zero()).then(|| now + config.interval);

        ::metrics::gauge!("circuit_breaker_state", "name" => name.clone())
            .set(CircuitState::Closed.as_gauge());

        Self {
            shared: Arc::new(Shared {
                name,
                config,
                inner: Mutex::new(Inner {
                    state: CircuitState::Closed,
                    generation: 0,
                    counts: Counts::default(),
                    expiry,
                }),
            }),
        }
    }

    /// Get the circuit breaker name
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Current state, after applying any elapsed window or cooldown
    pub fn state(&self) -> CircuitState {
        let mut inner = self.shared.lock();
        self.shared.current(&mut inner, Instant::now()).0
    }

    /// Snapshot of the current generation's counters
    pub fn counts(&self) -> Counts {
        let mut inner = self.shared.lock();
        self.shared.current(&mut inner, Instant::now());
        inner.counts
    }

    /// Ask to run one call against the dependency
    pub fn allow_request(&self) -> Result<Ticket, Rejected> {
        let mut inner = self.shared.lock();
        let (state, generation) = self.shared.current(&mut inner, Instant::now());

        match state {
            CircuitState::Open => {
                return Err(Rejected::Open {
                    name: self.shared.name.clone(),
                });
            }
            CircuitState::HalfOpen if inner.counts.requests >= self.shared.config.max_probes => {
                return Err(Rejected::TooManyRequests {
                    name: self.shared.name.clone(),
                });
            }
            _ => {}
        }

        inner.counts.on_request();

        Ok(Ticket {
            shared: self.shared.clone(),
            generation,
            settled: false,
        })
    }

    /// Report how an admitted call went
    ///
    /// A ticket issued by another breaker is not counted here; dropping it
    /// releases its slot in the breaker that issued it.
    pub fn record_outcome(&self, mut ticket: Ticket, success: bool) {
        if !Arc::ptr_eq(&ticket.shared, &self.shared) {
            tracing::debug!(
                circuit_breaker = %self.shared.name,
                issuer = %ticket.shared.name,
                "Ignoring outcome of a foreign ticket"
            );
            return;
        }

        ticket.settled = true;

        let now = Instant::now();
        let mut inner = self.shared.lock();
        let (state, generation) = self.shared.current(&mut inner, now);

        if generation != ticket.generation {
            return;
        }

        if success {
            self.shared.on_success(&mut inner, state, now);
        } else {
            self.shared.on_failure(&mut inner, state, now);
        }
    }

    /// Execute an operation protected by the circuit breaker
    ///
    /// Any `Err` counts as a failure.
    pub async fn call<F, T, E>(&self, f: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: Future<Output = Result<T, E>>,
    {
        self.call_with(f, Result::is_ok).await
    }

    /// Execute an operation, letting `is_success` decide how the result counts
    ///
    /// Useful when some errors are authoritative answers from a healthy
    /// dependency rather than signs of trouble.
    pub async fn call_with<F, T, E, P>(
        &self,
        f: F,
        is_success: P,
    ) -> Result<T, CircuitBreakerError<E>>
    where
        F: Future<Output = Result<T, E>>,
        P: FnOnce(&Result<T, E>) -> bool,
    {
        let ticket = self.allow_request()?;
        let result = f.await;
        self.record_outcome(ticket, is_success(&result));
        result.map_err(CircuitBreakerError::Inner)
    }
}

impl fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.shared.lock();
        f.debug_struct("CircuitBreaker")
            .field("name", &self.shared.name)
            .field("state", &inner.state)
            .field("generation", &inner.generation)
            .field("counts", &inner.counts)
            .field("config", &self.shared.config)
            .finish()
    }
}
