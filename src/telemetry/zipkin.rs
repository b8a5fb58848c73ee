//! Span export to a Zipkin collector
//!
//! Finished spans go onto a bounded queue. A background task drains it and
//! posts batches to the collector as Zipkin v2 JSON. A full queue or an
//! unreachable collector drops spans; request handling never waits on export.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::mpsc;

use super::b3::TraceContext;
use crate::config::AppConfig;

const QUEUE_CAPACITY: usize = 1024;
const MAX_BATCH: usize = 100;
const EXPORT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpanKind {
    Client,
    Server,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    pub service_name: String,
}

/// A finished span in the Zipkin v2 model
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Span {
    pub trace_id: String,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub name: String,
    pub kind: SpanKind,
    /// Start, in microseconds since the epoch
    pub timestamp: i64,
    /// Microseconds
    pub duration: u64,
    pub local_endpoint: Endpoint,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

/// A span that has started and not yet been reported
#[derive(Debug)]
pub struct PendingSpan {
    context: TraceContext,
    name: String,
    kind: SpanKind,
    timestamp: i64,
    started: Instant,
    tags: BTreeMap<String, String>,
}

impl PendingSpan {
    pub fn start(context: TraceContext, name: impl Into<String>, kind: SpanKind) -> Self {
        Self {
            context,
            name: name.into(),
            kind,
            timestamp: chrono::Utc::now().timestamp_micros(),
            started: Instant::now(),
            tags: BTreeMap::new(),
        }
    }

    pub fn context(&self) -> &TraceContext {
        &self.context
    }

    pub fn tag(&mut self, key: impl Into<String>, value: impl ToString) {
        self.tags.insert(key.into(), value.to_string());
    }

    fn finish(self, service: &str) -> Span {
        Span {
            trace_id: self.context.trace_id,
            id: self.context.span_id,
            parent_id: self.context.parent_id,
            name: self.name,
            kind: self.kind,
            timestamp: self.timestamp,
            duration: (self.started.elapsed().as_micros() as u64).max(1),
            local_endpoint: Endpoint {
                service_name: service.to_string(),
            },
            tags: self.tags,
        }
    }
}

/// Handle for reporting spans to one collector
///
/// Cheap to clone; all clones feed the same export task.
#[derive(Clone, Debug)]
pub struct ZipkinReporter {
    service: String,
    queue: mpsc::Sender<Span>,
}

impl ZipkinReporter {
    /// Start the export task on the current actix runtime
    pub fn spawn(collector: impl Into<String>, service: impl Into<String>) -> Self {
        let (queue, spans) = mpsc::channel(QUEUE_CAPACITY);
        actix_web::rt::spawn(export(collector.into(), spans));

        Self {
            service: service.into(),
            queue,
        }
    }

    /// Reporter feeding an existing queue instead of a collector
    #[cfg(test)]
    pub(crate) fn from_parts(service: impl Into<String>, queue: mpsc::Sender<Span>) -> Self {
        Self {
            service: service.into(),
            queue,
        }
    }

    /// Reporter for the configured collector, if any
    pub fn from_config(config: &AppConfig) -> Option<Self> {
        let collector = config.observability.tracing.collector_url.as_deref()?;
        tracing::info!(collector = %collector, "Exporting spans to Zipkin");
        Some(Self::spawn(collector, &config.app.name))
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    /// Finish the span and queue it for export
    ///
    /// Spans of unsampled traces are dropped here.
    pub fn report(&self, span: PendingSpan) {
        if !span.context.sampled {
            return;
        }

        if let Err(e) = self.queue.try_send(span.finish(&self.service)) {
            tracing::debug!(error = %e, "Dropping span, export queue unavailable");
        }
    }
}

async fn export(collector: String, mut spans: mpsc::Receiver<Span>) {
    let client = awc::Client::builder().timeout(EXPORT_TIMEOUT).finish();
    let mut batch = Vec::with_capacity(MAX_BATCH);

    while let Some(span) = spans.recv().await {
        batch.push(span);
        while batch.len() < MAX_BATCH {
            match spans.try_recv() {
                Ok(span) => batch.push(span),
                Err(_) => break,
            }
        }

        match client.post(&collector).send_json(&batch).await {
            Ok(response) if response.status().is_success() => {
                tracing::trace!(spans = batch.len(), "Spans exported");
            }
            Ok(response) => {
                tracing::warn!(status = response.status().as_u16(), spans = batch.len(), "Collector rejected spans");
            }
            Err(e) => {
                tracing::warn!(error = %e, spans = batch.len(), "Failed to export spans");
            }
        }

        batch.clear();
    }

    tracing::debug!("Span export stopped");
}
