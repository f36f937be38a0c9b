//! Correlation IDs tying error responses to log lines.

use std::fmt;

use http::{HeaderMap, HeaderName, HeaderValue};
use uuid::Uuid;

/// Header carrying the correlation id in both directions
pub static CORRELATION_HEADER: HeaderName = HeaderName::from_static("x-correlation-id");

/// Per-request correlation id, inserted into request extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CorrelationId(pub Uuid);

impl CorrelationId {
    /// Reuse a well-formed inbound id, otherwise mint a fresh one
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(&CORRELATION_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s.trim()).ok())
            .map(CorrelationId)
            .unwrap_or_else(|| CorrelationId(Uuid::new_v4()))
    }

    pub fn header_value(&self) -> HeaderValue {
        let mut buf = Uuid::encode_buffer();
        let text = self.0.hyphenated().encode_lower(&mut buf);
        HeaderValue::from_str(text).unwrap_or_else(|_| HeaderValue::from_static("invalid"))
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
