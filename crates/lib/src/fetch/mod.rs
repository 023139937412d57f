//! Keyed resource fetching with de-duplication, caching and cancellation.
//!
//! A [`Fetcher`] coordinates fetches for one kind of resource (e.g. articles
//! by id): for any key at most one request is outbound at a time, recent
//! results are served from a short-lived cache, and every caller interested
//! in the same key receives the same settlement. A [`FetchScope`] binds the
//! coordinator to one UI consumer's lifecycle: switching the consumer to a
//! different key (or dropping the scope) cancels the request it initiated
//! and guarantees a late settlement for the old key never surfaces.
//!
//! Cancellation is cooperative and advisory. The [`CancelToken`] handed to a
//! loader may be polled to stop network work early, but correctness does not
//! depend on it: the coordinator discards the result of a cancelled request
//! at settlement time regardless.

mod cache;
mod error;

use std::collections::HashMap;
use std::future::Future;
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicU64, Ordering},
};
use std::time::Duration;

use tokio::sync::watch;
use tracing::debug;

use crate::{
    Result,
    clock::{Clock, SystemClock},
};

use cache::ResourceCache;
pub use error::FetchError;

/// Cooperative cancellation flag shared between a consumer and a loader.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

type Settlement<T> = Option<Result<T>>;

struct InFlight<T> {
    id: u64,
    cancel: CancelToken,
    rx: watch::Receiver<Settlement<T>>,
}

struct FetchState<T> {
    cache: ResourceCache<T>,
    in_flight: HashMap<String, InFlight<T>>,
}

struct FetcherInner<T> {
    state: Mutex<FetchState<T>>,
    clock: Arc<dyn Clock>,
    next_id: AtomicU64,
}

/// Coordinates fetches for one kind of keyed resource.
///
/// Explicitly constructed and cheap to clone; clones share the cache and the
/// in-flight map. Tests build a fresh instance per case.
pub struct Fetcher<T> {
    inner: Arc<FetcherInner<T>>,
}

impl<T> Clone for Fetcher<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

enum Role<T> {
    /// Served from cache.
    Cached(T),
    /// An in-flight request for this key exists; await it.
    Join(watch::Receiver<Settlement<T>>),
    /// This call starts the request.
    Initiate {
        id: u64,
        rx: watch::Receiver<Settlement<T>>,
        tx: watch::Sender<Settlement<T>>,
    },
}

impl<T: Clone + Send + Sync + 'static> Fetcher<T> {
    /// Create a fetcher with the given cache TTL, on the system clock.
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    /// Create a fetcher using the configured cache TTL.
    pub fn from_config(config: &crate::ClientConfig) -> Self {
        Self::new(config.cache_ttl)
    }

    /// Create a fetcher with an explicit time provider.
    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(FetcherInner {
                state: Mutex::new(FetchState {
                    cache: ResourceCache::new(ttl),
                    in_flight: HashMap::new(),
                }),
                clock,
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Open a cancellation scope for one consumer.
    pub fn scope(&self) -> FetchScope<T> {
        FetchScope {
            fetcher: self.clone(),
            state: Mutex::new(ScopeState {
                key: None,
                epoch: 0,
                cancel: None,
            }),
        }
    }

    /// Fetch the resource for `key`.
    ///
    /// Serves a fresh cache entry without invoking `loader`; joins an
    /// existing in-flight request for the key; otherwise invokes `loader`
    /// with `cancel` and registers the request so concurrent callers share
    /// it. The cache/in-flight decision happens under one lock acquisition,
    /// so two callers can never both start a request for the same key.
    ///
    /// The loader runs as a spawned task: a caller that is dropped
    /// mid-await never strands the other callers awaiting the same key.
    pub async fn fetch<F, Fut>(&self, key: &str, cancel: CancelToken, loader: F) -> Result<T>
    where
        F: FnOnce(CancelToken) -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let role = {
            let now = self.inner.clock.now_millis();
            let mut state = self.inner.state.lock().unwrap();
            if let Some(value) = state.cache.get(key, now) {
                Role::Cached(value)
            } else {
                let joinable = state
                    .in_flight
                    .get(key)
                    .filter(|in_flight| !in_flight.cancel.is_cancelled())
                    .map(|in_flight| in_flight.rx.clone());
                match joinable {
                    Some(rx) => Role::Join(rx),
                    None => {
                        if state.in_flight.contains_key(key) {
                            debug!(key, "superseding cancelled in-flight request");
                        }
                        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
                        let (tx, rx) = watch::channel(None);
                        state.in_flight.insert(
                            key.to_string(),
                            InFlight {
                                id,
                                cancel: cancel.clone(),
                                rx: rx.clone(),
                            },
                        );
                        Role::Initiate { id, rx, tx }
                    }
                }
            }
        };

        match role {
            Role::Cached(value) => {
                debug!(key, "serving cached resource");
                Ok(value)
            }
            Role::Join(rx) => {
                debug!(key, "joining in-flight request");
                Self::await_settlement(rx, key).await
            }
            Role::Initiate { id, rx, tx } => {
                let inner = Arc::clone(&self.inner);
                let owned_key = key.to_string();
                let future = loader(cancel.clone());
                tokio::spawn(async move {
                    let outcome = future.await;
                    inner.settle(&owned_key, id, &cancel, outcome, tx);
                });
                Self::await_settlement(rx, key).await
            }
        }
    }

    /// Drop the cache entry for `key`. Call after a mutation that affects a
    /// previously fetched resource.
    pub fn invalidate(&self, key: &str) {
        self.inner.state.lock().unwrap().cache.remove(key);
    }

    /// Drop every cache entry.
    pub fn invalidate_all(&self) {
        self.inner.state.lock().unwrap().cache.clear();
    }

    async fn await_settlement(
        mut rx: watch::Receiver<Settlement<T>>,
        key: &str,
    ) -> Result<T> {
        loop {
            if let Some(settled) = rx.borrow_and_update().clone() {
                return settled;
            }
            if rx.changed().await.is_err() {
                // Sender vanished without settling; treat as cancelled
                return Err(FetchError::Cancelled {
                    key: key.to_string(),
                }
                .into());
            }
        }
    }
}

impl<T: Clone + Send + Sync + 'static> FetcherInner<T> {
    /// Apply a request's settlement.
    ///
    /// The request id is compared against the registered in-flight entry: a
    /// superseded request must not clear the newer marker or write the
    /// cache. A cancelled request settles as `Cancelled` for every waiter
    /// and writes nothing.
    fn settle(
        &self,
        key: &str,
        id: u64,
        cancel: &CancelToken,
        outcome: Result<T>,
        tx: watch::Sender<Settlement<T>>,
    ) {
        let settled = if cancel.is_cancelled() {
            debug!(key, "request cancelled, discarding result");
            Err(FetchError::Cancelled {
                key: key.to_string(),
            }
            .into())
        } else {
            outcome
        };

        {
            let now = self.clock.now_millis();
            let mut state = self.state.lock().unwrap();
            let current = state
                .in_flight
                .get(key)
                .is_some_and(|in_flight| in_flight.id == id);
            if current {
                state.in_flight.remove(key);
                if let Ok(value) = &settled {
                    state.cache.insert(key.to_string(), value.clone(), now);
                }
            }
        }

        let _ = tx.send(Some(settled));
    }
}

struct ScopeState {
    key: Option<String>,
    epoch: u64,
    cancel: Option<CancelToken>,
}

/// Per-consumer lifecycle binding for a [`Fetcher`].
///
/// One scope per UI consumer instance (e.g. one article-detail view). When
/// the consumer's key changes, the request the scope initiated is cancelled
/// and any late settlement for the old key resolves as `Cancelled` for this
/// consumer. Dropping the scope cancels its outstanding request.
pub struct FetchScope<T> {
    fetcher: Fetcher<T>,
    state: Mutex<ScopeState>,
}

impl<T: Clone + Send + Sync + 'static> FetchScope<T> {
    /// Fetch `key` within this consumer's lifecycle.
    pub async fn fetch<F, Fut>(&self, key: &str, loader: F) -> Result<T>
    where
        F: FnOnce(CancelToken) -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let (cancel, epoch) = {
            let mut state = self.state.lock().unwrap();
            if state.key.as_deref() != Some(key) {
                if let Some(previous) = state.cancel.take() {
                    debug!(from = ?state.key, to = key, "scope re-keyed, cancelling previous request");
                    previous.cancel();
                }
                state.key = Some(key.to_string());
                state.epoch += 1;
            }
            let cancel = state
                .cancel
                .get_or_insert_with(CancelToken::new)
                .clone();
            (cancel, state.epoch)
        };

        let outcome = self.fetcher.fetch(key, cancel, loader).await;

        let state = self.state.lock().unwrap();
        if state.epoch != epoch {
            // The consumer moved on while this request was in flight; its
            // result must not reach the new key's state
            return Err(FetchError::Cancelled {
                key: key.to_string(),
            }
            .into());
        }
        outcome
    }

    /// The key this scope is currently bound to.
    pub fn key(&self) -> Option<String> {
        self.state.lock().unwrap().key.clone()
    }
}

impl<T> Drop for FetchScope<T> {
    fn drop(&mut self) {
        if let Some(cancel) = self.state.lock().unwrap().cancel.take() {
            cancel.cancel();
        }
    }
}
