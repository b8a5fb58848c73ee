//! Outbound HTTP to the users API
//!
//! [`DependencyCaller`] is the transport capability: it performs one GET and
//! hands back status and body. [`PlainCaller`] uses awc directly,
//! [`TracedCaller`] decorates another caller with B3 propagation headers and
//! reports a client span per call. The choice is made once at startup by
//! [`from_config`], so nothing above this module knows whether tracing is on.
//!
//! [`UsersClient`] turns those raw responses into user records and classifies
//! failures.

pub mod plain;
pub mod traced;
pub mod users;

use std::fmt;
use std::sync::Arc;

use actix_web::web::Bytes;
use async_trait::async_trait;

use crate::config::AppConfig;
use crate::telemetry::{TraceContext, ZipkinReporter};

pub use plain::PlainCaller;
pub use traced::TracedCaller;
pub use users::{DependencyError, UsersClient};

/// A GET request to send to a dependency
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutboundRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    /// Span of the inbound request this call is made for
    pub trace: Option<TraceContext>,
}

impl OutboundRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
            trace: None,
        }
    }

    pub fn with_trace(mut self, trace: Option<TraceContext>) -> Self {
        self.trace = trace;
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Status and body of a dependency response
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutboundResponse {
    pub status: u16,
    pub body: Bytes,
}

impl OutboundResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallError {
    #[error("request timed out")]
    Timeout,
    #[error("{0}")]
    Transport(String),
}

/// Transport used to reach a dependency
///
/// Futures are not required to be `Send`: awc clients are bound to the actix
/// worker thread that created them.
#[async_trait(?Send)]
pub trait DependencyCaller: Send + Sync + fmt::Debug {
    async fn call(&self, request: OutboundRequest) -> Result<OutboundResponse, CallError>;
}

/// Select the transport for the users API once, at startup
///
/// Calls are traced when a span reporter is available.
pub fn from_config(config: &AppConfig, reporter: Option<ZipkinReporter>) -> Arc<dyn DependencyCaller> {
    let plain = PlainCaller::new(config.users_api.request_timeout());

    match reporter {
        Some(reporter) => {
            tracing::info!("Tracing enabled for users-api calls");
            Arc::new(TracedCaller::new(Arc::new(plain), reporter))
        }
        None => {
            tracing::info!("Tracing collector not configured, users-api calls are not traced");
            Arc::new(plain)
        }
    }
}
