//! Session and token store.
//!
//! One [`SessionStore`] exists per running client. It is constructed at
//! composition time and shared by reference (`Arc`) into the request client
//! and the route guard; nothing else holds session state.
//!
//! # Logout vs reset
//!
//! - [`SessionStore::reset`] clears every in-memory field and leaves the
//!   persisted snapshot alone. Used for account switching and refresh flows.
//! - [`SessionStore::logout`] resets and then purges the persisted snapshot.
//!   This is the full teardown.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use hotmeal_core::{Role, UserId};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::storage::{StorageError, StorageGateway, keys, restore_or_default, save_json};

/// Name shown for a session that is not logged in.
pub const GUEST_NAME: &str = "Guest";

/// Read-only view of the session, without the credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Whether a credential is present.
    pub logged_in: bool,
    /// Role of the logged-in account. Meaningful only when `logged_in`.
    pub role: Option<Role>,
    /// Backend id of the logged-in account. Meaningful only when `logged_in`.
    pub account_id: Option<UserId>,
    /// Name to greet the user with.
    pub display_name: String,
}

/// On-disk form of the session.
#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedSession {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    role: Option<Role>,
    #[serde(default)]
    account_id: Option<UserId>,
    #[serde(default)]
    display_name: Option<String>,
}

#[derive(Default)]
struct SessionInner {
    token: Option<SecretString>,
    role: Option<Role>,
    account_id: Option<UserId>,
    display_name: Option<String>,
    /// Bumped on every login and every handled rejection. A response
    /// carrying an older epoch belongs to a session that is already gone.
    epoch: u64,
}

impl SessionInner {
    fn clear(&mut self) {
        self.token = None;
        self.role = None;
        self.account_id = None;
        self.display_name = None;
    }

    fn to_persisted(&self) -> PersistedSession {
        PersistedSession {
            token: self.token.as_ref().map(|t| t.expose_secret().to_string()),
            role: self.role,
            account_id: self.account_id,
            display_name: self.display_name.clone(),
        }
    }
}

/// The client's single session: credential plus login state.
pub struct SessionStore {
    inner: RwLock<SessionInner>,
    storage: Arc<dyn StorageGateway>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.read();
        f.debug_struct("SessionStore")
            .field("token", &inner.token.as_ref().map(|_| "[REDACTED]"))
            .field("role", &inner.role)
            .field("account_id", &inner.account_id)
            .field("display_name", &inner.display_name)
            .field("epoch", &inner.epoch)
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Create an empty session backed by `storage`, ignoring any snapshot.
    #[must_use]
    pub fn new(storage: Arc<dyn StorageGateway>) -> Self {
        Self {
            inner: RwLock::new(SessionInner::default()),
            storage,
        }
    }

    /// Restore the session persisted in `storage`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage gateway fails. An unreadable snapshot
    /// is discarded and yields an empty session.
    pub fn restore(storage: Arc<dyn StorageGateway>) -> Result<Self, StorageError> {
        let persisted: PersistedSession = restore_or_default(storage.as_ref(), keys::SESSION)?;
        let token = persisted.token.filter(|t| !t.is_empty());
        let inner = if token.is_some() {
            SessionInner {
                token: token.map(SecretString::from),
                role: persisted.role,
                account_id: persisted.account_id,
                display_name: persisted.display_name,
                ..SessionInner::default()
            }
        } else {
            SessionInner::default()
        };
        tracing::debug!(logged_in = inner.token.is_some(), "Session restored");
        Ok(Self {
            inner: RwLock::new(inner),
            storage,
        })
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Log in with a display name and credential.
    ///
    /// Role and account id are cleared; use [`Self::login_as`] when the
    /// backend reports them.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be persisted. The in-memory
    /// session is updated regardless.
    pub fn login(&self, display_name: &str, token: SecretString) -> Result<(), StorageError> {
        self.login_as(display_name, token, None, None)
    }

    /// Log in and record the account's role and id.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be persisted. The in-memory
    /// session is updated regardless.
    pub fn login_as(
        &self,
        display_name: &str,
        token: SecretString,
        role: Option<Role>,
        account_id: Option<UserId>,
    ) -> Result<(), StorageError> {
        let mut inner = self.write();
        inner.token = Some(token);
        inner.role = role;
        inner.account_id = account_id;
        inner.display_name = Some(display_name.to_string());
        inner.epoch += 1;
        tracing::info!(role = ?role, account_id = ?account_id, "Logged in");
        // Persist under the lock so a concurrent teardown cannot interleave.
        save_json(self.storage.as_ref(), keys::SESSION, &inner.to_persisted())
    }

    /// Clear every field to its default without touching persisted storage.
    pub fn reset(&self) {
        self.write().clear();
        tracing::debug!("Session reset");
    }

    /// Full teardown: reset, then purge the persisted snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be removed. The in-memory
    /// session is cleared regardless.
    pub fn logout(&self) -> Result<(), StorageError> {
        let mut inner = self.write();
        inner.clear();
        self.storage.remove(keys::SESSION)?;
        tracing::info!("Logged out");
        Ok(())
    }

    /// Handle a rejection of a request dispatched under `epoch`.
    ///
    /// Returns `true` only for the first call per epoch and then advances
    /// the epoch, so a batch of concurrent 401 responses is handled once
    /// while a later request (dispatched under the new epoch) is handled
    /// again. A logged-in session is torn down and its snapshot purged.
    pub(crate) fn expire(&self, epoch: u64) -> bool {
        let mut inner = self.write();
        if inner.epoch != epoch {
            return false;
        }
        inner.epoch += 1;
        if inner.token.is_some() {
            inner.clear();
            if let Err(e) = self.storage.remove(keys::SESSION) {
                tracing::warn!(error = %e, "Failed to purge persisted session after expiry");
            }
            tracing::info!(epoch, "Session expired");
        }
        true
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Whether a credential is present.
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.read().token.is_some()
    }

    /// The current credential, if any.
    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        self.read().token.clone()
    }

    /// Role of the logged-in account.
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        let inner = self.read();
        inner.token.as_ref().and(inner.role)
    }

    /// Backend id of the logged-in account.
    #[must_use]
    pub fn account_id(&self) -> Option<UserId> {
        let inner = self.read();
        inner.token.as_ref().and(inner.account_id)
    }

    /// Current login epoch.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.read().epoch
    }

    /// Read-only view without the credential.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let inner = self.read();
        let logged_in = inner.token.is_some();
        SessionSnapshot {
            logged_in,
            role: if logged_in { inner.role } else { None },
            account_id: if logged_in { inner.account_id } else { None },
            display_name: inner
                .display_name
                .clone()
                .filter(|_| logged_in)
                .unwrap_or_else(|| GUEST_NAME.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn store() -> (Arc<MemoryStorage>, SessionStore) {
        let storage = Arc::new(MemoryStorage::new());
        let session = SessionStore::new(storage.clone());
        (storage, session)
    }

    #[test]
    fn test_new_session_is_anonymous() {
        let (_, session) = store();
        assert!(!session.is_logged_in());
        assert!(session.token().is_none());
        assert_eq!(session.snapshot().display_name, GUEST_NAME);
    }

    #[test]
    fn test_login_sets_credential_and_persists() {
        let (storage, session) = store();
        session
            .login("alice", SecretString::from("tok-1"))
            .expect("login");

        assert!(session.is_logged_in());
        assert_eq!(
            session.token().map(|t| t.expose_secret().to_string()),
            Some("tok-1".to_string())
        );
        assert!(storage.raw(keys::SESSION).is_some_and(|b| b.contains("tok-1")));
    }

    #[test]
    fn test_logout_purges_persisted_credential() {
        let (storage, session) = store();
        session
            .login_as("alice", SecretString::from("tok-1"), Some(Role::Staff), Some(UserId::new(4)))
            .expect("login");

        session.logout().expect("logout");

        assert!(!session.is_logged_in());
        assert_eq!(session.role(), None);
        assert_eq!(session.account_id(), None);
        assert!(!storage.contains(keys::SESSION));
    }

    #[test]
    fn test_reset_leaves_persisted_storage_untouched() {
        let (storage, session) = store();
        session
            .login_as("alice", SecretString::from("tok-1"), Some(Role::Admin), None)
            .expect("login");
        let before = storage.raw(keys::SESSION);

        session.reset();

        assert!(!session.is_logged_in());
        assert_eq!(session.role(), None);
        assert_eq!(storage.raw(keys::SESSION), before);
    }

    #[test]
    fn test_restore_reloads_persisted_session() {
        let storage = Arc::new(MemoryStorage::new());
        SessionStore::new(storage.clone())
            .login_as("bob", SecretString::from("tok-2"), Some(Role::User), Some(UserId::new(9)))
            .expect("login");

        let restored = SessionStore::restore(storage).expect("restore");
        let snapshot = restored.snapshot();
        assert!(snapshot.logged_in);
        assert_eq!(snapshot.role, Some(Role::User));
        assert_eq!(snapshot.account_id, Some(UserId::new(9)));
        assert_eq!(snapshot.display_name, "bob");
    }

    #[test]
    fn test_restore_after_reset_brings_session_back() {
        let storage = Arc::new(MemoryStorage::new());
        let session = SessionStore::new(storage.clone());
        session
            .login("carol", SecretString::from("tok-3"))
            .expect("login");
        session.reset();

        let restored = SessionStore::restore(storage).expect("restore");
        assert!(restored.is_logged_in());
    }

    #[test]
    fn test_role_is_hidden_without_token() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .save(keys::SESSION, r#"{"token":null,"role":"ADMIN","account_id":1}"#)
            .expect("save");

        let restored = SessionStore::restore(storage).expect("restore");
        assert!(!restored.is_logged_in());
        assert_eq!(restored.role(), None);
        assert_eq!(restored.snapshot().role, None);
    }

    #[test]
    fn test_expire_is_idempotent_per_epoch() {
        let (storage, session) = store();
        session
            .login("alice", SecretString::from("tok-1"))
            .expect("login");
        let epoch = session.epoch();

        assert!(session.expire(epoch));
        assert!(!session.expire(epoch));
        assert!(!session.is_logged_in());
        assert!(!storage.contains(keys::SESSION));
    }

    #[test]
    fn test_expire_ignores_superseded_session() {
        let (_, session) = store();
        session
            .login("alice", SecretString::from("old"))
            .expect("login");
        let stale = session.epoch();
        session
            .login("alice", SecretString::from("new"))
            .expect("login");

        assert!(!session.expire(stale));
        assert!(session.is_logged_in());
    }

    #[test]
    fn test_expire_anonymous_once_per_epoch() {
        let (_, session) = store();
        let epoch = session.epoch();

        assert!(session.expire(epoch));
        assert!(!session.expire(epoch));

        let next = session.epoch();
        assert_ne!(next, epoch);
        assert!(session.expire(next));
    }

    #[test]
    fn test_login_after_expiry_is_persisted() {
        let (storage, session) = store();
        session.login("alice", SecretString::from("old")).expect("login");
        assert!(session.expire(session.epoch()));

        session.login("alice", SecretString::from("new")).expect("login");

        assert!(storage.raw(keys::SESSION).is_some_and(|b| b.contains("new")));
    }

    #[test]
    fn test_debug_redacts_token() {
        let (_, session) = store();
        session
            .login("alice", SecretString::from("super-secret"))
            .expect("login");
        let debug = format!("{session:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
