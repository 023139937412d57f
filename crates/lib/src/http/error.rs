//! Error types for the HTTP request wrapper.

use thiserror::Error;

/// Errors produced by the API client.
///
/// Each variant carries the human-readable message extracted from the
/// backend's JSON error body (or a synthesized fallback), so the UI layer
/// can display it verbatim. All payloads are strings: the whole error tree
/// is `Clone` because the fetch coordinator broadcasts one settlement to
/// every caller awaiting the same resource key.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum HttpError {
    /// The backend rejected the credentials or token (HTTP 401).
    #[error("unauthorized: {message}")]
    Unauthorized { message: String },

    /// The caller lacks rights to the resource (HTTP 403).
    #[error("forbidden: {message}")]
    Forbidden { message: String },

    /// The resource does not exist (HTTP 404).
    #[error("not found: {message}")]
    NotFound { message: String },

    /// Any other non-success HTTP status.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The request never produced an HTTP response (offline, DNS failure,
    /// timeout, connection refused).
    #[error("network error: {0}")]
    Network(String),

    /// The response body could not be decoded as the expected JSON shape.
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl HttpError {
    /// Classify a non-success HTTP status with its extracted message.
    pub(crate) fn from_status(status: u16, message: String) -> Self {
        match status {
            401 => HttpError::Unauthorized { message },
            403 => HttpError::Forbidden { message },
            404 => HttpError::NotFound { message },
            _ => HttpError::Api { status, message },
        }
    }

    /// The HTTP status this error corresponds to, if it came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            HttpError::Unauthorized { .. } => Some(401),
            HttpError::Forbidden { .. } => Some(403),
            HttpError::NotFound { .. } => Some(404),
            HttpError::Api { status, .. } => Some(*status),
            HttpError::Network(_) | HttpError::Decode(_) => None,
        }
    }
}
