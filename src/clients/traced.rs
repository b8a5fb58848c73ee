use std::sync::Arc;

use async_trait::async_trait;
use tracing::Instrument;

use super::{CallError, DependencyCaller, OutboundRequest, OutboundResponse};
use crate::telemetry::{PendingSpan, SpanKind, TraceContext, ZipkinReporter};

/// Decorates a caller with B3 trace propagation and a client span per call
///
/// A call made on behalf of a traced inbound request becomes a child of that
/// request's span; any other call starts a new trace. The context is sent as
/// `X-B3-*` headers so the dependency can join the trace, and the finished
/// span goes to the reporter.
#[derive(Debug)]
pub struct TracedCaller {
    inner: Arc<dyn DependencyCaller>,
    reporter: ZipkinReporter,
}

impl TracedCaller {
    pub fn new(inner: Arc<dyn DependencyCaller>, reporter: ZipkinReporter) -> Self {
        Self { inner, reporter }
    }
}

#[async_trait(?Send)]
impl DependencyCaller for TracedCaller {
    async fn call(&self, request: OutboundRequest) -> Result<OutboundResponse, CallError> {
        let context = request
            .trace
            .as_ref()
            .map_or_else(TraceContext::root, TraceContext::child);

        let span = tracing::info_span!(
            "dependency_call",
            service = %self.reporter.service(),
            trace_id = %context.trace_id,
            span_id = %context.span_id,
            url = %request.url,
        );

        let mut pending = PendingSpan::start(context.clone(), "get", SpanKind::Client);
        pending.tag("http.method", "GET");
        pending.tag("http.url", &request.url);

        let request = context
            .headers()
            .into_iter()
            .fold(request, |request, (name, value)| request.header(name, value));

        let result = self.inner.call(request).instrument(span.clone()).await;

        match &result {
            Ok(response) => {
                pending.tag("http.status_code", response.status);
                if response.status >= 500 {
                    pending.tag("error", response.status);
                }
                span.in_scope(|| tracing::debug!(status = response.status, "Dependency responded"));
            }
            Err(e) => {
                pending.tag("error", e);
                span.in_scope(|| tracing::debug!(error = %e, "Dependency call failed"));
            }
        }
        self.reporter.report(pending);

        result
    }
}
