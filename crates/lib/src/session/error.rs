//! Error types for the session manager.

use thiserror::Error;

/// Errors raised by session operations.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum SessionError {
    /// The backend rejected the login credentials.
    #[error("invalid credentials: {message}")]
    InvalidCredentials { message: String },

    /// The backend rejected the registration data (validation errors,
    /// duplicate email or username). The message carries the backend's
    /// response verbatim, which may be a JSON object keyed by field.
    #[error("registration rejected: {message}")]
    Registration { message: String },
}
