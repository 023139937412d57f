//! Session state types and the UI navigation seam.

use crate::http::types::User;

/// Where the session stands in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// The initial validation pass has not finished yet. Never re-entered.
    Loading,
    /// A user and token are present.
    Authenticated,
    /// No user, no token.
    Anonymous,
}

/// Snapshot of the authenticated-user state.
///
/// Fields are private so the invariant holds by construction: the status is
/// `Authenticated` exactly when both user and token are present.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    user: Option<User>,
    token: Option<String>,
    status: SessionStatus,
}

impl Session {
    pub(crate) fn loading() -> Self {
        Self {
            user: None,
            token: None,
            status: SessionStatus::Loading,
        }
    }

    pub(crate) fn anonymous() -> Self {
        Self {
            user: None,
            token: None,
            status: SessionStatus::Anonymous,
        }
    }

    pub(crate) fn authenticated(user: User, token: String) -> Self {
        Self {
            user: Some(user),
            token: Some(token),
            status: SessionStatus::Authenticated,
        }
    }

    /// The authenticated user, if any.
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// The in-memory access token, if any.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_authenticated(&self) -> bool {
        self.status == SessionStatus::Authenticated
    }

    /// Whether the initial validation pass is still running. Consumers that
    /// need auth state should defer action until this clears.
    pub fn is_loading(&self) -> bool {
        self.status == SessionStatus::Loading
    }

    /// Authorization header value for the current token, or `None` when
    /// anonymous.
    pub fn auth_header(&self) -> Option<String> {
        self.token.as_ref().map(|token| format!("Bearer {token}"))
    }
}

/// Navigation targets the session layer can request from the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// The landing view, after a successful login.
    Home,
    /// The login view; `just_registered` is set when arriving from a
    /// successful registration so the UI can show a confirmation notice.
    Login { just_registered: bool },
}

/// Receives navigation signals from the session layer.
///
/// The UI supplies the implementation (router push, screen switch, ...);
/// headless consumers use [`NoopNavigator`].
pub trait Navigator: Send + Sync {
    fn navigate(&self, destination: Destination);
}

/// Navigator that ignores every signal.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn navigate(&self, _destination: Destination) {}
}
