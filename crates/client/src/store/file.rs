use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use super::{StoreError, StoredSession, TokenStore};
use crate::models::{TokenPair, User};

/// On-disk layout of the session file.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user: Option<serde_json::Value>,
}

/// Token store backed by a JSON file.
///
/// The file is read once in [`open`](Self::open) and rewritten on every
/// change by writing a sibling temp file and renaming it over the original,
/// so a crash mid-write leaves the previous state intact.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    state: Mutex<StoredSession>,
}

impl FileTokenStore {
    /// Open the store at `path`, loading whatever session it holds.
    ///
    /// A missing or unreadable file yields an empty session.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let state = load(&path);
        Self {
            path,
            state: Mutex::new(state),
        }
    }

    /// Location of the session file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read<T>(&self, f: impl FnOnce(&StoredSession) -> T) -> T {
        f(&self.state.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Apply `f` and persist the result. The in-memory state only changes if
    /// the write succeeds.
    fn update(&self, f: impl FnOnce(&mut StoredSession)) -> Result<(), StoreError> {
        self.update_if(|state| {
            f(state);
            true
        })
        .map(|_| ())
    }

    /// Like [`update`](Self::update), but `f` may decline the change by
    /// returning `false`, in which case nothing is written.
    fn update_if(&self, f: impl FnOnce(&mut StoredSession) -> bool) -> Result<bool, StoreError> {
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = guard.clone();
        if !f(&mut next) {
            return Ok(false);
        }
        write_atomically(&self.path, &document_from(&next))?;
        *guard = next;
        Ok(true)
    }
}

impl TokenStore for FileTokenStore {
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
        self.update(|s| s.tokens = Some(tokens.clone()))
    }

    fn replace_tokens_if(
        &self,
        expected: &SecretString,
        next: Option<&TokenPair>,
    ) -> Result<bool, StoreError> {
        self.update_if(|s| {
            if !s.holds_refresh_token(expected) {
                return false;
            }
            s.replace_tokens(next);
            true
        })
    }

    fn cached_user(&self) -> Option<User> {
        self.read(|s| s.user.clone())
    }

    fn save_user(&self, user: &User) -> Result<(), StoreError> {
        self.update(|s| s.user = Some(user.clone()))
    }

    fn save_session(&self, tokens: &TokenPair, user: &User) -> Result<(), StoreError> {
        self.update(|s| {
            s.tokens = Some(tokens.clone());
            s.user = Some(user.clone());
        })
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.update(|s| *s = StoredSession::default())
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn load(path: &Path) -> StoredSession {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return StoredSession::default(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Could not read session file");
            return StoredSession::default();
        }
    };

    let document: SessionDocument = match serde_json::from_str(&raw) {
        Ok(document) => document,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Ignoring corrupt session file");
            return StoredSession::default();
        }
    };

    let tokens = match (document.access_token, document.refresh_token) {
        (Some(access), Some(refresh)) => Some(TokenPair::new(access, refresh)),
        (None, None) => None,
        _ => {
            warn!(path = %path.display(), "Session file holds only one token, discarding both");
            None
        }
    };

    let user = document.user.and_then(|value| {
        serde_json::from_value::<User>(value)
            .inspect_err(|e| debug!(error = %e, "Ignoring unreadable cached user"))
            .ok()
    });

    StoredSession { tokens, user }
}

fn document_from(state: &StoredSession) -> SessionDocument {
    SessionDocument {
        access_token: state
            .tokens
            .as_ref()
            .map(|t| t.access_token().expose_secret().to_owned()),
        refresh_token: state
            .tokens
            .as_ref()
            .map(|t| t.refresh_token().expose_secret().to_owned()),
        user: state
            .user
            .as_ref()
            .and_then(|u| serde_json::to_value(u).ok()),
    }
}

fn write_atomically(path: &Path, document: &SessionDocument) -> Result<(), StoreError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut file = NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(&mut file, document)?;
    file.write_all(b"\n")?;
    file.as_file().sync_all()?;
    file.persist(path)?;

    debug!(path = %path.display(), "Session file written");
    Ok(())
}
