//! Authentication session with durable persistence.
//!
//! Tokens are kept under the same two keys a browser front end would use in
//! `localStorage`, so the storage layout stays familiar.

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use wiredesk_shared::AuthTokens;

use crate::storage::{self, Storage, StorageError};

const ACCESS_TOKEN_KEY: &str = "access_token";
const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Stored token pair
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
}

impl From<AuthTokens> for Session {
    fn from(tokens: AuthTokens) -> Self {
        Self {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        }
    }
}

/// Session handle shared by the transport client and the controllers.
///
/// Reads come from memory; every change is written through to storage.
#[derive(Clone)]
pub struct AuthSession {
    storage: Arc<dyn Storage>,
    current: Arc<RwLock<Option<Session>>>,
}

impl AuthSession {
    /// Restore whatever session the storage holds.
    ///
    /// A session needs an access token; a missing refresh token is stored as
    /// empty rather than discarding the login.
    pub fn load(storage: Arc<dyn Storage>) -> Result<Self, StorageError> {
        let access: Option<String> = storage::load(storage.as_ref(), ACCESS_TOKEN_KEY)?;
        let refresh: Option<String> = storage::load(storage.as_ref(), REFRESH_TOKEN_KEY)?;
        let session = access.map(|access_token| Session {
            access_token,
            refresh_token: refresh.unwrap_or_default(),
        });
        if session.is_some() {
            crate::log_debug!("Restored stored session");
        }
        Ok(Self {
            storage,
            current: Arc::new(RwLock::new(session)),
        })
    }

    pub fn get(&self) -> Option<Session> {
        self.read().clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.read().as_ref().map(|s| s.access_token.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().is_some()
    }

    /// Adopt a session. It is live in memory even if persisting it fails.
    pub fn save(&self, session: Session) -> Result<(), StorageError> {
        *self.write() = Some(session.clone());
        storage::save(self.storage.as_ref(), ACCESS_TOKEN_KEY, &session.access_token)?;
        storage::save(self.storage.as_ref(), REFRESH_TOKEN_KEY, &session.refresh_token)?;
        Ok(())
    }

    /// Forget the session. Memory is cleared even when storage fails.
    pub fn clear(&self) -> Result<(), StorageError> {
        *self.write() = None;
        self.storage.remove_item(ACCESS_TOKEN_KEY)?;
        self.storage.remove_item(REFRESH_TOKEN_KEY)?;
        Ok(())
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Option<Session>> {
        self.current.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Option<Session>> {
        self.current.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileStorage, MemoryStorage};

    fn session(token: &str) -> Session {
        Session {
            access_token: token.to_string(),
            refresh_token: format!("{token}-refresh"),
        }
    }

    #[test]
    fn empty_storage_is_signed_out() {
        let auth = AuthSession::load(Arc::new(MemoryStorage::new())).unwrap();
        assert!(!auth.is_authenticated());
        assert_eq!(auth.access_token(), None);
    }

    #[test]
    fn session_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let auth = AuthSession::load(Arc::new(FileStorage::new(dir.path()))).unwrap();
        auth.save(session("tok")).unwrap();

        let reloaded = AuthSession::load(Arc::new(FileStorage::new(dir.path()))).unwrap();
        assert_eq!(reloaded.get(), Some(session("tok")));

        reloaded.clear().unwrap();
        let after_clear = AuthSession::load(Arc::new(FileStorage::new(dir.path()))).unwrap();
        assert!(!after_clear.is_authenticated());
    }

    #[test]
    fn clones_share_state() {
        let auth = AuthSession::load(Arc::new(MemoryStorage::new())).unwrap();
        let other = auth.clone();
        auth.save(session("a")).unwrap();
        assert_eq!(other.access_token().as_deref(), Some("a"));
        other.clear().unwrap();
        assert!(!auth.is_authenticated());
    }
}
