//! Error types for the OpenCode client.
//!
//! Every fallible operation returns [`Result`]. Stream consumers see at most
//! one terminal [`OpencodeError`]; malformed event payloads are reported
//! separately through [`crate::sse::DecodeError`] and never end a stream.

use std::fmt;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, OpencodeError>;

/// Why a connection-level failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionErrorKind {
    /// The connection could not be established (DNS, refused, TLS, ...).
    Failed,
    /// No response headers arrived before the connect deadline.
    Timeout,
    /// The connection broke after the stream had started.
    Lost,
}

impl fmt::Display for ConnectionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Failed => "connection failed",
            Self::Timeout => "connection timed out",
            Self::Lost => "connection lost",
        };
        f.write_str(s)
    }
}

/// Errors returned by the OpenCode client.
#[derive(Debug, thiserror::Error)]
pub enum OpencodeError {
    /// The server could not be reached, or stopped being reachable.
    #[error("{kind} ({url}): {message}")]
    Connection {
        /// Failure category.
        kind: ConnectionErrorKind,
        /// Endpoint that was being contacted.
        url: String,
        /// Human readable description.
        message: String,
        /// Underlying transport error, if any.
        #[source]
        source: Option<reqwest::Error>,
    },

    /// The server answered with a non-success status.
    #[error("API error {status}: {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body (possibly truncated for stream requests).
        body: String,
    },

    /// Any other transport-level error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Client configuration is incomplete or malformed.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Operation not allowed in the current state.
    #[error("invalid state: {0}")]
    State(String),
}

impl OpencodeError {
    pub(crate) fn connection(
        kind: ConnectionErrorKind,
        url: impl Into<String>,
        message: impl Into<String>,
        source: Option<reqwest::Error>,
    ) -> Self {
        Self::Connection {
            kind,
            url: url.into(),
            message: message.into(),
            source,
        }
    }

    /// Classify a `reqwest` error raised while sending a request.
    ///
    /// Timeouts and connect failures become [`OpencodeError::Connection`];
    /// everything else stays an [`OpencodeError::Http`].
    pub(crate) fn from_send(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::connection(
                ConnectionErrorKind::Timeout,
                url,
                format!("request timed out: {err}"),
                Some(err),
            )
        } else if err.is_connect() || err.is_request() {
            Self::connection(
                ConnectionErrorKind::Failed,
                url,
                format!("failed to connect: {err}"),
                Some(err),
            )
        } else {
            Self::Http(err)
        }
    }

    /// HTTP status code for [`OpencodeError::Api`] errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Response body for [`OpencodeError::Api`] errors.
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Api { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Connection failure category, if this is a connection error.
    pub fn connection_kind(&self) -> Option<ConnectionErrorKind> {
        match self {
            Self::Connection { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }

    /// `404` from the server.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// `400` from the server, typically a schema validation failure.
    pub fn is_validation_error(&self) -> bool {
        self.status() == Some(400)
    }

    /// Any `5xx` status.
    pub fn is_server_error(&self) -> bool {
        matches!(self.status(), Some(500..=599))
    }

    /// The `name` field of a JSON error body such as
    /// `{"name":"NotFound","message":"..."}`.
    pub fn api_error_name(&self) -> Option<String> {
        let body = self.body()?;
        let value: serde_json::Value = serde_json::from_str(body).ok()?;
        value.get("name")?.as_str().map(ToOwned::to_owned)
    }
}
