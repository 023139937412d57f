//!
//! Byline client core: the session and fetch machinery behind a blog
//! platform front-end.
//!
//! ## Core Concepts
//!
//! * **Session (`session::SessionManager`)**: the single source of truth for
//!   "who is logged in". Loads the persisted token at startup, validates it,
//!   exposes login/register/logout, and broadcasts every state transition.
//! * **Fetch coordination (`fetch::Fetcher`)**: keyed resource retrieval
//!   with per-key request de-duplication, a short-lived TTL cache, and
//!   cooperative cancellation bound to consumer lifecycles
//!   (`fetch::FetchScope`).
//! * **API client (`http::ApiClient`)**: the shared request wrapper. Attaches
//!   the bearer header from the token store, classifies error responses, and
//!   runs a single refresh-and-replay cycle on 401.
//! * **Token storage (`storage::TokenStore`)**: durable client-side storage
//!   for the access and refresh tokens, in-memory or file-backed.
//!
//! The UI layer (rendering, routing, styling) lives elsewhere; it consumes
//! session snapshots, fetch results and typed API payloads from this crate.

pub mod clock;
pub mod config;
pub mod fetch;
pub mod http;
pub mod session;
pub mod storage;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::ClientConfig;
pub use fetch::{CancelToken, FetchScope, Fetcher};
pub use http::ApiClient;
pub use session::{Destination, Navigator, NoopNavigator, Session, SessionManager, SessionStatus};
pub use storage::{FileTokenStore, MemoryTokenStore, TokenStore};

/// Result type used throughout the Byline library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the Byline library.
///
/// Unlike most error trees this one is `Clone`: the fetch coordinator
/// broadcasts a single settlement — success or failure — to every caller
/// awaiting the same resource key, so failures must be shareable. Every
/// wrapped error carries string payloads only.
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Structured HTTP/API errors from the http module
    #[error(transparent)]
    Http(#[from] http::HttpError),

    /// Structured session errors from the session module
    #[error(transparent)]
    Session(#[from] session::SessionError),

    /// Structured fetch coordination errors from the fetch module
    #[error(transparent)]
    Fetch(#[from] fetch::FetchError),

    /// Structured storage errors from the storage module
    #[error(transparent)]
    Storage(#[from] storage::StorageError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Http(_) => "http",
            Error::Session(_) => "session",
            Error::Fetch(_) => "fetch",
            Error::Storage(_) => "storage",
        }
    }

    /// Check if this error is a 401 from the backend (expired or missing
    /// authentication).
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Error::Http(http::HttpError::Unauthorized { .. }))
    }

    /// Check if this error is a rejected login.
    pub fn is_invalid_credentials(&self) -> bool {
        matches!(
            self,
            Error::Session(session::SessionError::InvalidCredentials { .. })
        )
    }

    /// Check if this error is a 403: the resource exists but the caller
    /// lacks rights to it.
    pub fn is_forbidden(&self) -> bool {
        matches!(self, Error::Http(http::HttpError::Forbidden { .. }))
    }

    /// Check if this error indicates a resource was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Http(http::HttpError::NotFound { .. }))
    }

    /// Check if this error is a transport-level failure (offline, timeout,
    /// server unreachable).
    pub fn is_network_error(&self) -> bool {
        matches!(self, Error::Http(http::HttpError::Network(_)))
    }

    /// Check if this error is a cancelled fetch. Cancellations are never
    /// user-visible: callers discard them silently.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Fetch(fetch::FetchError::Cancelled { .. }))
    }
}
