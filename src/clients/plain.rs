use std::time::Duration;

use async_trait::async_trait;
use awc::Client;
use awc::error::SendRequestError;

use super::{CallError, DependencyCaller, OutboundRequest, OutboundResponse};

/// Largest response body accepted from a dependency
const MAX_BODY: usize = 256 * 1024;

/// Untraced awc transport
#[derive(Clone, Debug)]
pub struct PlainCaller {
    timeout: Duration,
}

impl PlainCaller {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait(?Send)]
impl DependencyCaller for PlainCaller {
    async fn call(&self, request: OutboundRequest) -> Result<OutboundResponse, CallError> {
        let client = Client::builder().timeout(self.timeout).finish();

        let mut outbound = client.get(&request.url);
        for header in request.headers {
            outbound = outbound.insert_header(header);
        }

        let mut response = outbound.send().await.map_err(|e| match e {
            SendRequestError::Timeout => CallError::Timeout,
            e => CallError::Transport(e.to_string()),
        })?;

        let status = response.status().as_u16();
        let body = response
            .body()
            .limit(MAX_BODY)
            .await
            .map_err(|e| CallError::Transport(e.to_string()))?;

        Ok(OutboundResponse { status, body })
    }
}
