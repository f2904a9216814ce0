//! Payload decoding and decode-failure diagnostics.

use crate::types::event::GlobalEvent;

/// A frame payload that could not be decoded into a [`GlobalEvent`].
///
/// Never ends a stream; it is handed to the session's [`DiagnosticSink`]
/// and the payload is dropped.
#[derive(Debug, thiserror::Error)]
#[error("failed to decode event payload: {source}")]
pub struct DecodeError {
    /// The raw payload as received after the `data: ` prefix.
    pub payload: String,
    #[source]
    pub source: serde_json::Error,
}

/// Parse one frame payload.
///
/// # Errors
///
/// Returns a [`DecodeError`] if the payload is not a JSON object of the
/// [`GlobalEvent`] shape.
pub fn decode_global_event(payload: &str) -> Result<GlobalEvent, DecodeError> {
    serde_json::from_str(payload).map_err(|source| DecodeError {
        payload: payload.to_string(),
        source,
    })
}

/// Receives decode failures from a stream session.
///
/// Called synchronously on the task that is consuming the stream, so
/// implementations must not block.
pub trait DiagnosticSink: Send + Sync {
    fn on_decode_error(&self, endpoint: &str, err: &DecodeError);
}

impl<F> DiagnosticSink for F
where
    F: Fn(&str, &DecodeError) + Send + Sync,
{
    fn on_decode_error(&self, endpoint: &str, err: &DecodeError) {
        self(endpoint, err)
    }
}

/// Default sink: logs through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn on_decode_error(&self, endpoint: &str, err: &DecodeError) {
        tracing::warn!(
            "Failed to parse SSE event endpoint={}: {} - Raw data: {}",
            endpoint,
            err.source,
            err.payload
        );
    }
}
