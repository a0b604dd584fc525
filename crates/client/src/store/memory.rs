use std::sync::{PoisonError, RwLock};

use secrecy::SecretString;

use super::{StoredSession, StoreError, TokenStore};
use crate::models::{TokenPair, User};

/// Token store that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    state: RwLock<StoredSession>,
}

impl MemoryTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that starts out signed in.
    #[must_use]
    pub fn with_session(tokens: TokenPair, user: Option<User>) -> Self {
        Self {
            state: RwLock::new(StoredSession {
                tokens: Some(tokens),
                user,
            }),
        }
    }

    fn read<T>(&self, f: impl FnOnce(&StoredSession) -> T) -> T {
        f(&self.state.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn write(&self, f: impl FnOnce(&mut StoredSession)) {
        f(&mut self.state.write().unwrap_or_else(PoisonError::into_inner));
    }
}

impl TokenStore for MemoryTokenStore {
    fn access_token(&self) -> Option<SecretString> {
        self.read(|s| s.tokens.as_ref().map(|t| t.access_token().clone()))
    }

    fn refresh_token(&self) -> Option<SecretString> {
        self.read(|s| s.tokens.as_ref().map(|t| t.refresh_token().clone()))
    }

    fn tokens(&self) -> Option<TokenPair> {
        self.read(|s| s.tokens.clone())
    }

    fn save_tokens(&self, tokens: &TokenPair) -> Result<(), StoreError> {
        self.write(|s| s.tokens = Some(tokens.clone()));
        Ok(())
    }

    fn replace_tokens_if(
        &self,
        expected: &SecretString,
        next: Option<&TokenPair>,
    ) -> Result<bool, StoreError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if !state.holds_refresh_token(expected) {
            return Ok(false);
        }
        state.replace_tokens(next);
        Ok(true)
    }

    fn cached_user(&self) -> Option<User> {
        self.read(|s| s.user.clone())
    }

    fn save_user(&self, user: &User) -> Result<(), StoreError> {
        self.write(|s| s.user = Some(user.clone()));
        Ok(())
    }

    fn save_session(&self, tokens: &TokenPair, user: &User) -> Result<(), StoreError> {
        self.write(|s| {
            s.tokens = Some(tokens.clone());
            s.user = Some(user.clone());
        });
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.write(|s| *s = StoredSession::default());
        Ok(())
    }
}
