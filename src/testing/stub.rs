use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use actix_web::web::Bytes;
use async_trait::async_trait;

use crate::clients::{CallError, DependencyCaller, OutboundRequest, OutboundResponse};

/// Scripted answer of a [`StubCaller`]
#[derive(Clone, Debug)]
pub enum Reply {
    Respond { status: u16, body: String },
    /// Fail with a transport timeout immediately
    Timeout,
    /// Fail as if the connection was refused
    Refused,
    /// Never answer within any realistic deadline
    Hang,
}

impl Reply {
    pub fn json(status: u16, body: &str) -> Self {
        Reply::Respond {
            status,
            body: body.to_string(),
        }
    }

    pub fn status(status: u16) -> Self {
        Reply::Respond {
            status,
            body: String::new(),
        }
    }

    /// The users API record of `username`
    pub fn user(username: &str, first_name: &str, last_name: &str, role: &str) -> Self {
        Reply::json(
            200,
            &serde_json::json!({
                "username": username,
                "firstname": first_name,
                "lastname": last_name,
                "role": role,
            })
            .to_string(),
        )
    }
}

/// In-memory [`DependencyCaller`] replaying scripted replies
///
/// Replies are consumed in order; the last one repeats forever. Every request
/// is recorded so tests can assert on what was (or was not) sent.
#[derive(Debug)]
pub struct StubCaller {
    script: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<OutboundRequest>>,
}

impl StubCaller {
    pub fn always(reply: Reply) -> Self {
        Self::sequence([reply])
    }

    pub fn sequence(replies: impl IntoIterator<Item = Reply>) -> Self {
        let script: VecDeque<_> = replies.into_iter().collect();
        assert!(!script.is_empty(), "StubCaller needs at least one reply");

        Self {
            script: Mutex::new(script),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Replace the remaining script
    pub fn set(&self, reply: Reply) {
        let mut script = self.script.lock().unwrap();
        script.clear();
        script.push_back(reply);
    }

    pub fn requests(&self) -> Vec<OutboundRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn next(&self) -> Reply {
        let mut script = self.script.lock().unwrap();
        if script.len() > 1 {
            script.pop_front().unwrap()
        } else {
            script.front().cloned().unwrap()
        }
    }
}

#[async_trait(?Send)]
impl DependencyCaller for StubCaller {
    async fn call(&self, request: OutboundRequest) -> Result<OutboundResponse, CallError> {
        self.requests.lock().unwrap().push(request);

        match self.next() {
            Reply::Respond { status, body } => Ok(OutboundResponse {
                status,
                body: Bytes::from(body),
            }),
            Reply::Timeout => Err(CallError::Timeout),
            Reply::Refused => Err(CallError::Transport("connection refused".to_string())),
            Reply::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(CallError::Timeout)
            }
        }
    }
}
