//! Session manager: the single owner of "who is signed in".
//!
//! The manager is an explicit instance handed to consumers. It restores the
//! session from the token store at construction, moves between
//! [`SessionState::Anonymous`] and [`SessionState::Authenticated`] on
//! sign-in, sign-out and forced invalidation, and notifies subscribers
//! synchronously on every transition.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use tracing::{info, instrument, warn};

use crate::api::ApiClient;
use crate::error::ApiResult;
use crate::models::{Credentials, User};

/// Current session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Nobody is signed in.
    #[default]
    Anonymous,
    /// Signed in as this user.
    Authenticated(User),
}

impl SessionState {
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    #[must_use]
    pub const fn user(&self) -> Option<&User> {
        match self {
            Self::Authenticated(user) => Some(user),
            Self::Anonymous => None,
        }
    }
}

/// Handle returned by [`SessionManager::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Arc<dyn Fn(&SessionState) + Send + Sync>;

/// Owns the in-memory session and its subscribers.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    client: ApiClient,
    state: Mutex<SessionState>,
    subscribers: Mutex<Vec<(SubscriptionId, Subscriber)>>,
    next_subscription: AtomicU64,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("state", &self.current())
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    /// Restore the session persisted in `client`'s token store and start
    /// listening for forced invalidation.
    ///
    /// The session starts authenticated only when both a cached user and a
    /// token pair are stored.
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        let restored = match (client.store().cached_user(), client.has_tokens()) {
            (Some(user), true) => SessionState::Authenticated(user),
            _ => SessionState::Anonymous,
        };

        let inner = Arc::new(SessionInner {
            client,
            state: Mutex::new(restored),
            subscribers: Mutex::new(Vec::new()),
            next_subscription: AtomicU64::new(0),
        });

        let weak: Weak<SessionInner> = Arc::downgrade(&inner);
        inner.client.on_session_invalidated(move || {
            if let Some(inner) = weak.upgrade() {
                warn!("Session invalidated by failed token refresh");
                inner.transition(SessionState::Anonymous, false);
            }
        });

        Self { inner }
    }

    /// The client this session drives.
    #[must_use]
    pub fn client(&self) -> &ApiClient {
        &self.inner.client
    }

    /// Snapshot of the current session.
    #[must_use]
    pub fn current(&self) -> SessionState {
        self.inner.lock_state().clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner.lock_state().is_authenticated()
    }

    /// The signed-in user, if any.
    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.inner.lock_state().user().cloned()
    }

    /// Sign in (or register, for `Credentials::Register`) and persist the
    /// resulting session.
    ///
    /// Signing in while already authenticated replaces the session. A token
    /// refresh still in flight for the old session is discarded.
    ///
    /// # Errors
    ///
    /// Returns the server's error when the credentials are rejected, or
    /// `ApiError::Storage` when the session could not be persisted. The
    /// session is unchanged on error.
    #[instrument(skip_all, fields(email = %credentials.email()))]
    pub async fn sign_in(&self, credentials: &Credentials) -> ApiResult<User> {
        let response = self.inner.client.authenticate(credentials).await?;

        let _guard = self.inner.client.lock_session().await;
        self.inner
            .client
            .store()
            .save_session(&response.tokens, &response.user)?;

        info!(user_id = %response.user.id, "Signed in");
        self.inner
            .transition(SessionState::Authenticated(response.user.clone()), true);
        Ok(response.user)
    }

    /// End the session.
    ///
    /// The server-side logout is best-effort: its failure is logged and the
    /// local session ends regardless, and a token refresh still in flight
    /// cannot bring it back.
    #[instrument(skip(self))]
    pub async fn sign_out(&self) {
        let _guard = self.inner.client.lock_session().await;
        if let Err(e) = self.inner.client.logout().await {
            warn!(error = %e, "Server logout failed, ending session locally");
        }
        if let Err(e) = self.inner.client.store().clear() {
            warn!(error = %e, "Failed to clear session storage");
        }

        info!("Signed out");
        self.inner.transition(SessionState::Anonymous, false);
    }

    /// Call `callback` with the new state after every transition.
    ///
    /// Subscribers run synchronously in registration order.
    pub fn subscribe(
        &self,
        callback: impl Fn(&SessionState) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.inner.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.inner
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(callback)));
        id
    }

    /// Stop notifying a subscriber. Returns whether it was registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self
            .inner
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let before = subscribers.len();
        subscribers.retain(|(existing, _)| *existing != id);
        subscribers.len() != before
    }
}

impl SessionInner {
    fn lock_state(&self) -> std::sync::MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Move to `next` and notify subscribers, unless nothing changed and
    /// `always_notify` is false.
    fn transition(&self, next: SessionState, always_notify: bool) {
        {
            let mut state = self.lock_state();
            if *state == next && !always_notify {
                return;
            }
            state.clone_from(&next);
        }

        let subscribers: Vec<Subscriber> = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();
        for callback in subscribers {
            callback(&next);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use vitrine_core::{Email, UserId};

    use super::*;
    use crate::config::ClientConfig;
    use crate::models::TokenPair;
    use crate::store::{MemoryTokenStore, TokenStore};

    fn user() -> User {
        User {
            id: UserId::new("u1"),
            name: "Ana".to_string(),
            email: Email::parse("ana@x.com").unwrap(),
        }
    }

    fn manager(store: MemoryTokenStore) -> SessionManager {
        // Nothing listens on this port; every test here stays offline.
        let config = ClientConfig::new("http://127.0.0.1:9").unwrap();
        SessionManager::new(ApiClient::with_store(&config, Arc::new(store)).unwrap())
    }

    #[test]
    fn test_restores_cached_user() {
        let store = MemoryTokenStore::with_session(TokenPair::new("a1", "r1"), Some(user()));
        let session = manager(store);
        assert!(session.is_authenticated());
        assert_eq!(session.user(), Some(user()));
    }

    #[test]
    fn test_cached_user_without_tokens_is_anonymous() {
        let store = MemoryTokenStore::new();
        store.save_user(&user()).unwrap();
        assert_eq!(manager(store).current(), SessionState::Anonymous);
    }

    #[test]
    fn test_subscribers_notified_in_order_on_transition() {
        let store = MemoryTokenStore::with_session(TokenPair::new("a1", "r1"), Some(user()));
        let session = manager(store);
        let seen = Arc::new(Mutex::new(Vec::new()));

        for n in 0..2 {
            let seen = Arc::clone(&seen);
            session.subscribe(move |state| {
                seen.lock().unwrap().push((n, state.is_authenticated()));
            });
        }

        session.inner.transition(SessionState::Anonymous, false);
        // A second identical transition is not a change.
        session.inner.transition(SessionState::Anonymous, false);

        assert_eq!(*seen.lock().unwrap(), vec![(0, false), (1, false)]);
    }

    #[test]
    fn test_unsubscribe() {
        let session = manager(MemoryTokenStore::new());
        let calls = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&calls);
        let id = session.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(session.unsubscribe(id));
        assert!(!session.unsubscribe(id));
        session
            .inner
            .transition(SessionState::Authenticated(user()), true);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_sign_out_succeeds_when_server_unreachable() {
        let store = MemoryTokenStore::with_session(TokenPair::new("a1", "r1"), Some(user()));
        let session = manager(store);

        session.sign_out().await;

        assert_eq!(session.current(), SessionState::Anonymous);
        assert!(!session.client().has_tokens());
        assert!(session.client().store().cached_user().is_none());
    }
}
