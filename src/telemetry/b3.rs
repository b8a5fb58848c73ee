//! B3 trace context
//!
//! Multi-header form only: `X-B3-TraceId`, `X-B3-SpanId`,
//! `X-B3-ParentSpanId`, `X-B3-Sampled`.

use actix_web::http::header::HeaderMap;

pub const TRACE_ID: &str = "X-B3-TraceId";
pub const SPAN_ID: &str = "X-B3-SpanId";
pub const PARENT_SPAN_ID: &str = "X-B3-ParentSpanId";
pub const SAMPLED: &str = "X-B3-Sampled";

/// Position of one span inside a trace
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraceContext {
    pub trace_id: String,
    pub span_id: String,
    pub parent_id: Option<String>,
    pub sampled: bool,
}

impl TraceContext {
    /// First span of a new, sampled trace
    pub fn root() -> Self {
        Self {
            trace_id: trace_id(),
            span_id: span_id(),
            parent_id: None,
            sampled: true,
        }
    }

    /// A span nested under this one, in the same trace
    pub fn child(&self) -> Self {
        Self {
            trace_id: self.trace_id.clone(),
            span_id: span_id(),
            parent_id: Some(self.span_id.clone()),
            sampled: self.sampled,
        }
    }

    /// Read the context a caller sent along, if it sent a usable one
    ///
    /// Ids that are not hex of the B3 lengths are ignored, and the request
    /// then starts a fresh trace.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let value = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

        let trace_id = value(TRACE_ID).filter(|id| is_hex_id(id, &[16, 32]))?;
        let span_id = value(SPAN_ID).filter(|id| is_hex_id(id, &[16]))?;
        let parent_id = value(PARENT_SPAN_ID).filter(|id| is_hex_id(id, &[16]));
        let sampled = !matches!(value(SAMPLED), Some("0") | Some("false"));

        Some(Self {
            trace_id: trace_id.to_ascii_lowercase(),
            span_id: span_id.to_ascii_lowercase(),
            parent_id: parent_id.map(str::to_ascii_lowercase),
            sampled,
        })
    }

    /// Headers that hand this context to the next hop
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = vec![
            (TRACE_ID, self.trace_id.clone()),
            (SPAN_ID, self.span_id.clone()),
        ];
        if let Some(parent) = &self.parent_id {
            headers.push((PARENT_SPAN_ID, parent.clone()));
        }
        headers.push((SAMPLED, if self.sampled { "1" } else { "0" }.to_string()));
        headers
    }
}

fn is_hex_id(id: &str, lengths: &[usize]) -> bool {
    lengths.contains(&id.len()) && id.bytes().all(|b| b.is_ascii_hexdigit())
}

fn trace_id() -> String {
    format!("{:032x}", rand::random::<u128>())
}

fn span_id() -> String {
    format!("{:016x}", rand::random::<u64>())
}
