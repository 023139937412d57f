//! Error types for the fetch coordinator.

use thiserror::Error;

/// Errors raised by the fetch coordinator itself.
///
/// Loader failures pass through unchanged; the coordinator only adds the
/// cancellation outcome.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum FetchError {
    /// The request was cancelled: the consumer re-keyed or was torn down
    /// before settlement. By policy this is never shown to the user —
    /// callers detect it via [`Error::is_cancelled`](crate::Error::is_cancelled)
    /// and discard it.
    #[error("request for {key} was cancelled")]
    Cancelled { key: String },
}
