use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::clients::{DependencyCaller, DependencyError, UsersClient};
use crate::config::AppConfig;
use crate::error::LoginError;
use crate::metrics::AppMetrics;
use crate::models::v1::user::UserRecord;
use crate::resilience::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
use crate::security::{AllowSet, SignedToken, TokenIssuer};
use crate::telemetry::TraceContext;

/// Name of the breaker guarding the users API
pub const USERS_API: &str = "users-api";

// 72 hours
pub const LIFETIME: Duration = Duration::from_secs(72 * 60 * 60);

/// Latency budget of one login attempt
pub const DEADLINE: Duration = Duration::from_millis(900);

/// Credential-validation orchestrator
///
/// Fetches the user through the circuit breaker, checks the credentials
/// against the allow-set and signs an access token from the fetched record.
/// Cheap to clone; clones share the breaker.
#[derive(Clone, Debug)]
pub struct LoginService {
    users: UsersClient,
    breaker: Option<CircuitBreaker>,
    allowed: AllowSet,
    issuer: TokenIssuer,
    lifetime: Duration,
    deadline: Duration,
    metrics: Option<AppMetrics>,
}

impl LoginService {
    pub fn new(
        users: UsersClient,
        breaker: Option<CircuitBreaker>,
        allowed: AllowSet,
        issuer: TokenIssuer,
    ) -> Self {
        Self {
            users,
            breaker,
            allowed,
            issuer,
            lifetime: LIFETIME,
            deadline: DEADLINE,
            metrics: None,
        }
    }

    pub fn from_config(config: &AppConfig, caller: Arc<dyn DependencyCaller>) -> Self {
        let settings = &config.resilience.circuit_breaker;
        let breaker = settings
            .enabled
            .then(|| CircuitBreaker::with_config(USERS_API, CircuitBreakerConfig::from(settings)));

        Self::new(
            UsersClient::new(&config.users_api.address, caller),
            breaker,
            AllowSet::new(config.auth.allowed_credentials.iter().cloned()),
            TokenIssuer::from_config(&config.auth.jwt),
        )
        .with_lifetime(Duration::from_secs(config.auth.jwt.access_token_ttl))
        .with_deadline(config.users_api.login_deadline())
    }

    pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_metrics(mut self, metrics: AppMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    pub fn breaker(&self) -> Option<&CircuitBreaker> {
        self.breaker.as_ref()
    }

    /// State of the users API breaker, `None` when the breaker is disabled
    pub fn breaker_state(&self) -> Option<CircuitState> {
        self.breaker.as_ref().map(CircuitBreaker::state)
    }

    /// Validate `username`/`password` and issue an access token
    ///
    /// Fail if:
    /// - the user does not exist or the password does not match (same error)
    /// - the users API is unavailable, slow, or the breaker is open
    /// - the users API answers with something that is not a user record
    /// - the token cannot be signed
    pub async fn login(&self, username: &str, password: &str) -> Result<SignedToken, LoginError> {
        self.login_traced(username, password, None).await
    }

    /// [`login`](Self::login) with the users API call parented to `trace`
    #[tracing::instrument(skip(self, password, trace), fields(username = %username))]
    pub async fn login_traced(
        &self,
        username: &str,
        password: &str,
        trace: Option<&TraceContext>,
    ) -> Result<SignedToken, LoginError> {
        let start = Instant::now();

        let user = self.fetch_user(username, trace).await?;

        if !self.allowed.is_authorized(username, password) {
            return Err(LoginError::CredentialsInvalid);
        }

        let token = self.issuer.issue(&user, self.lifetime)?;

        tracing::info!(
            role = %user.role,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Login succeeded"
        );

        Ok(token)
    }

    async fn fetch_user(&self, username: &str, trace: Option<&TraceContext>) -> Result<UserRecord, LoginError> {
        let service_token = self.issuer.service_token(username)?;

        let fetch = async {
            let start = Instant::now();
            let result = tokio::time::timeout(
                self.deadline,
                self.users.fetch_user_traced(username, &service_token, trace),
            )
            .await
            .unwrap_or(Err(DependencyError::Timeout));

            if let Some(metrics) = &self.metrics {
                metrics.record_users_api_call(dependency_outcome(&result), start.elapsed().as_secs_f64());
            }

            result
        };

        match &self.breaker {
            Some(breaker) => Ok(breaker.call_with(fetch, is_healthy_answer).await?),
            None => Ok(fetch.await?),
        }
    }
}

fn is_healthy_answer(result: &Result<UserRecord, DependencyError>) -> bool {
    match result {
        Ok(_) => true,
        Err(e) => e.counts_as_success(),
    }
}

fn dependency_outcome(result: &Result<UserRecord, DependencyError>) -> &'static str {
    match result {
        Ok(_) => "success",
        Err(DependencyError::NotFound) => "not_found",
        Err(DependencyError::Timeout) => "timeout",
        Err(DependencyError::Transport(_)) => "transport",
        Err(DependencyError::Status { .. }) => "status",
        Err(DependencyError::Decode(_)) => "decode",
    }
}
