use std::sync::Arc;

use super::{CallError, DependencyCaller, OutboundRequest};
use crate::models::v1::user::UserRecord;
use crate::telemetry::TraceContext;

/// Longest slice of an error body kept for diagnostics
const MAX_DIAGNOSTIC_BODY: usize = 512;

#[derive(Debug, thiserror::Error)]
pub enum DependencyError {
    #[error("users-api request failed: {0}")]
    Transport(String),
    #[error("users-api did not answer in time")]
    Timeout,
    #[error("user not found")]
    NotFound,
    #[error("users-api {status}: {body}")]
    Status { status: u16, body: String },
    #[error("users-api returned an undecodable user record: {0}")]
    Decode(#[source] serde_json::Error),
}

impl DependencyError {
    /// Whether the breaker should treat this as a healthy answer
    ///
    /// A 404 is the users API working correctly; counting it as a failure
    /// would let unknown usernames trip the breaker.
    pub fn counts_as_success(&self) -> bool {
        matches!(self, DependencyError::NotFound)
    }
}

impl From<CallError> for DependencyError {
    fn from(e: CallError) -> Self {
        match e {
            CallError::Timeout => DependencyError::Timeout,
            CallError::Transport(message) => DependencyError::Transport(message),
        }
    }
}

/// Client of the users API
#[derive(Clone, Debug)]
pub struct UsersClient {
    address: String,
    caller: Arc<dyn DependencyCaller>,
}

impl UsersClient {
    pub fn new(address: impl Into<String>, caller: Arc<dyn DependencyCaller>) -> Self {
        let address = address.into().trim_end_matches('/').to_string();
        Self { address, caller }
    }

    pub fn user_url(&self, username: &str) -> String {
        format!("{}/users/{}", self.address, urlencoding::encode(username))
    }

    /// `GET {address}/users/{username}`, authenticated with `service_token`
    ///
    /// Does not retry.
    pub async fn fetch_user(
        &self,
        username: &str,
        service_token: &str,
    ) -> Result<UserRecord, DependencyError> {
        self.fetch_user_traced(username, service_token, None).await
    }

    /// [`fetch_user`](Self::fetch_user) on behalf of a traced inbound request
    pub async fn fetch_user_traced(
        &self,
        username: &str,
        service_token: &str,
        parent: Option<&TraceContext>,
    ) -> Result<UserRecord, DependencyError> {
        let request = OutboundRequest::get(self.user_url(username))
            .header("Authorization", format!("Bearer {}", service_token))
            .with_trace(parent.cloned());

        let response = self.caller.call(request).await?;

        if response.status == 404 {
            return Err(DependencyError::NotFound);
        }

        if !response.is_success() {
            let body = String::from_utf8_lossy(&response.body);
            let body = match body.char_indices().nth(MAX_DIAGNOSTIC_BODY) {
                Some((end, _)) => format!("{}...", &body[..end]),
                None => body.into_owned(),
            };
            return Err(DependencyError::Status {
                status: response.status,
                body,
            });
        }

        serde_json::from_slice(&response.body).map_err(DependencyError::Decode)
    }
}
