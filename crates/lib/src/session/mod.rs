//! Session lifecycle management.
//!
//! [`SessionManager`] is the single source of truth for "who is logged in".
//! It loads the persisted token at startup, validates it against the
//! backend, exposes login/register/logout, and broadcasts every state
//! transition through a watch channel. The state machine is
//! `Loading → {Authenticated, Anonymous}`, then `Authenticated ↔ Anonymous`
//! via login and logout; `Loading` is never re-entered. Validation failures
//! always land on `Anonymous` — the session never fails open.

mod error;
mod types;

use std::sync::{Arc, Weak};

use tokio::sync::watch;
use tracing::{debug, info};

use crate::{
    Error, Result,
    http::{ApiClient, AuthSink, HttpError},
    http::types::{Credentials, RegisterData, RegisterReceipt, User},
    storage::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY},
};

pub use error::SessionError;
pub use types::{Destination, Navigator, NoopNavigator, Session, SessionStatus};

/// Owns the authenticated-user lifecycle.
///
/// Cheap to clone; clones share the same state. Constructed explicitly (no
/// module singleton) so each test builds its own isolated instance.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    client: ApiClient,
    navigator: Arc<dyn Navigator>,
    state: watch::Sender<Session>,
    init_lock: tokio::sync::Mutex<()>,
}

impl SessionManager {
    /// Create a session manager over the given API client.
    ///
    /// Starts in `Loading`; call [`initialize`](Self::initialize) to settle
    /// the initial state. Installs itself into the client so a failed token
    /// refresh demotes the session immediately.
    pub fn new(client: ApiClient, navigator: Arc<dyn Navigator>) -> Self {
        let (state, _) = watch::channel(Session::loading());
        let inner = Arc::new(SessionInner {
            client,
            navigator,
            state,
            init_lock: tokio::sync::Mutex::new(()),
        });
        let inner_dyn: Arc<dyn AuthSink> = inner.clone();
        let sink: Weak<dyn AuthSink> = Arc::downgrade(&inner_dyn);
        inner.client.install_auth_sink(sink);
        Self { inner }
    }

    /// Validate the persisted token and settle the initial session state.
    ///
    /// With no persisted token this resolves to `Anonymous` without any
    /// network call. A rejected token (or any network failure during the
    /// lookup) clears the persisted credentials and also resolves to
    /// `Anonymous`. Runs the validation pass at most once: once the state
    /// has left `Loading`, further calls return the current snapshot.
    pub async fn initialize(&self) -> Result<Session> {
        let _guard = self.inner.init_lock.lock().await;
        if !self.snapshot().is_loading() {
            return Ok(self.snapshot());
        }

        let store = self.inner.client.token_store();
        let Some(token) = store.get(ACCESS_TOKEN_KEY)? else {
            debug!("no persisted token, starting anonymous");
            self.inner.set_state(Session::anonymous());
            return Ok(self.snapshot());
        };

        match self.inner.client.current_user(None).await {
            Ok(user) => {
                // The lookup may have refreshed the access token on the way
                let token = store.get(ACCESS_TOKEN_KEY)?.unwrap_or(token);
                self.inner
                    .set_state(Session::authenticated(user, token));
            }
            Err(err) => {
                debug!(error = %err, "persisted token rejected, clearing credentials");
                store.remove(ACCESS_TOKEN_KEY)?;
                store.remove(REFRESH_TOKEN_KEY)?;
                self.inner.set_state(Session::anonymous());
            }
        }
        Ok(self.snapshot())
    }

    /// Exchange credentials for tokens, fetch the user, and authenticate.
    ///
    /// On success both tokens are persisted and the UI is signalled to
    /// navigate home. On any failure the session state is left untouched
    /// and the error is returned to the caller; there is no retry.
    pub async fn login(&self, credentials: Credentials) -> Result<User> {
        let tokens = match self.inner.client.issue_token(&credentials).await {
            Ok(tokens) => tokens,
            Err(Error::Http(HttpError::Unauthorized { message })) => {
                return Err(SessionError::InvalidCredentials { message }.into());
            }
            Err(err) => return Err(err),
        };
        let user = self.inner.client.current_user(Some(&tokens.access)).await?;

        let store = self.inner.client.token_store();
        store.set(ACCESS_TOKEN_KEY, &tokens.access)?;
        store.set(REFRESH_TOKEN_KEY, &tokens.refresh)?;

        info!(user = %user.username, "login succeeded");
        self.inner
            .set_state(Session::authenticated(user.clone(), tokens.access));
        self.inner.navigator.navigate(Destination::Home);
        Ok(user)
    }

    /// Submit a registration. Does not authenticate; on success the UI is
    /// signalled to navigate to the login view with a "just registered"
    /// marker.
    pub async fn register(&self, data: RegisterData) -> Result<RegisterReceipt> {
        let receipt = match self.inner.client.register(&data).await {
            Ok(receipt) => receipt,
            Err(Error::Http(HttpError::Api {
                status: 400,
                message,
            })) => {
                return Err(SessionError::Registration { message }.into());
            }
            Err(err) => return Err(err),
        };
        info!(user = %data.username, "registration submitted");
        self.inner.navigator.navigate(Destination::Login {
            just_registered: true,
        });
        Ok(receipt)
    }

    /// Clear persisted credentials and reset to `Anonymous`.
    ///
    /// Safe to call when already anonymous.
    pub fn logout(&self) -> Result<()> {
        let store = self.inner.client.token_store();
        store.remove(ACCESS_TOKEN_KEY)?;
        store.remove(REFRESH_TOKEN_KEY)?;
        self.inner.set_state(Session::anonymous());
        self.inner.navigator.navigate(Destination::Login {
            just_registered: false,
        });
        Ok(())
    }

    /// Authorization header for the current in-memory token, or `None` when
    /// not authenticated.
    pub fn auth_header(&self) -> Option<String> {
        self.snapshot().auth_header()
    }

    /// Current session snapshot.
    pub fn snapshot(&self) -> Session {
        self.inner.state.borrow().clone()
    }

    /// Subscribe to session state transitions.
    ///
    /// The receiver observes every transition; dropping it unsubscribes.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.inner.state.subscribe()
    }

    /// The API client this session manager authenticates.
    pub fn client(&self) -> &ApiClient {
        &self.inner.client
    }
}

impl SessionInner {
    fn set_state(&self, next: Session) {
        let next_status = next.status();
        let previous = self.state.send_replace(next);
        if previous.status() != next_status {
            info!(from = ?previous.status(), to = ?next_status, "session state changed");
        }
    }
}

impl AuthSink for SessionInner {
    fn credentials_revoked(&self) {
        // Only an established session demotes here; during the initialize
        // pass the pending lookup settles the state itself.
        if self.state.borrow().is_authenticated() {
            debug!("credentials revoked, demoting session to anonymous");
            self.set_state(Session::anonymous());
        }
    }
}
