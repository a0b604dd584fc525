//! Persistence of the session: token pair and cached user.
//!
//! The client only talks to a [`TokenStore`]; the HTTP core reads and rotates
//! tokens through it and the session manager clears it on sign-out.
//! [`FileTokenStore`] survives process restarts, [`MemoryTokenStore`] does not.

mod file;
mod memory;

pub use file::FileTokenStore;
pub use memory::MemoryTokenStore;

use secrecy::SecretString;
use thiserror::Error;

use crate::models::{TokenPair, User};

/// Errors raised while persisting session state.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize session: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to replace session file: {0}")]
    Persist(#[from] tempfile::PersistError),
}

/// Storage for the token pair and the last known user.
///
/// Implementations keep both tokens together: after any write either both
/// are present or neither is. Reads never fail; unreadable state reads as
/// absent.
pub trait TokenStore: Send + Sync {
    /// Current access token.
    fn access_token(&self) -> Option<SecretString>;

    /// Current refresh token.
    fn refresh_token(&self) -> Option<SecretString>;

    /// Both tokens, if stored.
    fn tokens(&self) -> Option<TokenPair>;

    /// Replace both tokens.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the new state could not be persisted.
    fn save_tokens(&self, tokens: &TokenPair) -> Result<(), StoreError>;

    /// Replace the pair only while its refresh token is still `expected`.
    ///
    /// `None` forgets tokens and user. Returns `false`, writing nothing,
    /// when the stored pair is absent or was replaced meanwhile.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the new state could not be persisted.
    fn replace_tokens_if(
        &self,
        expected: &SecretString,
        next: Option<&TokenPair>,
    ) -> Result<bool, StoreError>;

    /// Last user returned by a successful sign-in.
    fn cached_user(&self) -> Option<User>;

    /// Remember `user` for the next process start.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the new state could not be persisted.
    fn save_user(&self, user: &User) -> Result<(), StoreError>;

    /// Store the pair and user of a new sign-in as one write.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the new state could not be persisted; the
    /// previous session is then left untouched.
    fn save_session(&self, tokens: &TokenPair, user: &User) -> Result<(), StoreError>;

    /// Forget tokens and user.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the cleared state could not be persisted.
    fn clear(&self) -> Result<(), StoreError>;
}

/// In-process snapshot shared by both stores.
#[derive(Debug, Clone, Default)]
struct StoredSession {
    tokens: Option<TokenPair>,
    user: Option<User>,
}

impl StoredSession {
    fn holds_refresh_token(&self, expected: &SecretString) -> bool {
        self.tokens
            .as_ref()
            .is_some_and(|t| t.has_refresh_token(expected))
    }

    fn replace_tokens(&mut self, next: Option<&TokenPair>) {
        match next {
            Some(tokens) => self.tokens = Some(tokens.clone()),
            None => *self = Self::default(),
        }
    }
}
