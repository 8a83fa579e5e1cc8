//! Key/value persistence for the authenticated session.
//!
//! Two scopes exist: a durable one that survives restarts and a session-lived one
//! that does not. [`AuthStorage`] is the only component that writes auth keys to
//! either of them.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value as JsonValue;

use crate::config::StorageKeys;
use crate::types::User;

/// A string key/value scope.
pub trait Storage: Send + Sync + 'static {
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value. Backends that can fail log the failure and keep going.
    fn set(&self, key: &str, value: &str);

    fn remove(&self, key: &str);
}

/// Process-lifetime storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries().insert(key.to_owned(), value.to_owned());
    }

    fn remove(&self, key: &str) {
        self.entries().remove(key);
    }
}

/// Storage backed by a single JSON object document on disk.
///
/// Every mutation reads the document, applies the change and writes it back.
/// An unreadable or malformed document is treated as empty.
#[derive(Debug)]
pub struct JsonFileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStorage {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> serde_json::Map<String, JsonValue> {
        let Ok(raw) = std::fs::read_to_string(&self.path) else {
            return serde_json::Map::new();
        };
        match serde_json::from_str::<JsonValue>(&raw) {
            Ok(JsonValue::Object(map)) => map,
            Ok(_) | Err(_) => {
                tracing::warn!(path = %self.path.display(), "Storage document malformed, treating as empty");
                serde_json::Map::new()
            }
        }
    }

    fn write_document(&self, doc: &serde_json::Map<String, JsonValue>) {
        let result = serde_json::to_string_pretty(doc)
            .map_err(std::io::Error::other)
            .and_then(|body| std::fs::write(&self.path, body));
        if let Err(e) = result {
            tracing::warn!(path = %self.path.display(), error = %e, "Storage write failed");
        }
    }

    fn update(&self, apply: impl FnOnce(&mut serde_json::Map<String, JsonValue>)) {
        let _guard = self
            .lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut doc = self.read_document();
        apply(&mut doc);
        self.write_document(&doc);
    }
}

impl Storage for JsonFileStorage {
    fn get(&self, key: &str) -> Option<String> {
        let _guard = self
            .lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        match self.read_document().remove(key)? {
            JsonValue::String(s) => Some(s),
            _ => None,
        }
    }

    fn set(&self, key: &str, value: &str) {
        self.update(|doc| {
            doc.insert(key.to_owned(), JsonValue::String(value.to_owned()));
        });
    }

    fn remove(&self, key: &str) {
        self.update(|doc| {
            doc.remove(key);
        });
    }
}

/// Which scope holds the live copy of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageScope {
    Durable,
    SessionLived,
}

/// Persisted representation of an authenticated session.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredAuth {
    pub token: String,
    pub user: User,
    pub refresh_token: Option<String>,
    pub remember: bool,
}

/// Owner of the auth keys in both scopes.
#[derive(Clone)]
pub struct AuthStorage {
    durable: Arc<dyn Storage>,
    session: Arc<dyn Storage>,
    keys: StorageKeys,
}

impl AuthStorage {
    #[must_use]
    pub fn new(durable: Arc<dyn Storage>, session: Arc<dyn Storage>, keys: StorageKeys) -> Self {
        Self {
            durable,
            session,
            keys,
        }
    }

    /// Both scopes in memory, for shells that never persist across restarts.
    #[must_use]
    pub fn in_memory(keys: StorageKeys) -> Self {
        Self::new(
            Arc::new(MemoryStorage::new()),
            Arc::new(MemoryStorage::new()),
            keys,
        )
    }

    fn scope(&self, scope: StorageScope) -> &dyn Storage {
        match scope {
            StorageScope::Durable => self.durable.as_ref(),
            StorageScope::SessionLived => self.session.as_ref(),
        }
    }

    /// Write the session to the scope selected by `remember` and purge the other one.
    pub fn persist(&self, auth: &StoredAuth) {
        let user_json = match serde_json::to_string(&auth.user) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize user, session not persisted");
                return;
            }
        };

        let (live, stale) = if auth.remember {
            (StorageScope::Durable, StorageScope::SessionLived)
        } else {
            (StorageScope::SessionLived, StorageScope::Durable)
        };
        self.purge_scope(stale);

        let target = self.scope(live);
        target.set(&self.keys.token, &auth.token);
        target.set(&self.keys.user, &user_json);
        match &auth.refresh_token {
            Some(refresh) => target.set(&self.keys.refresh_token, refresh),
            None => target.remove(&self.keys.refresh_token),
        }
        if auth.remember {
            self.durable.set(&self.keys.remember_me, "true");
        }
    }

    /// Read the live session, durable scope first.
    ///
    /// Returns `None` when the token or user is missing or the user JSON is malformed.
    #[must_use]
    pub fn load(&self) -> Option<StoredAuth> {
        let token = self.read(&self.keys.token)?;
        let user_json = self.read(&self.keys.user)?;
        let user = match serde_json::from_str::<User>(&user_json) {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!(error = %e, "Stored user is malformed, ignoring");
                return None;
            }
        };
        Some(StoredAuth {
            token,
            user,
            refresh_token: self.refresh_token(),
            remember: self.remembered(),
        })
    }

    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.read(&self.keys.token)
    }

    #[must_use]
    pub fn refresh_token(&self) -> Option<String> {
        self.read(&self.keys.refresh_token)
    }

    /// Whether the durable scope carries the remember flag.
    #[must_use]
    pub fn remembered(&self) -> bool {
        self.durable.get(&self.keys.remember_me).as_deref() == Some("true")
    }

    /// Remove every auth key from both scopes.
    pub fn purge(&self) {
        self.purge_scope(StorageScope::Durable);
        self.purge_scope(StorageScope::SessionLived);
    }

    fn purge_scope(&self, scope: StorageScope) {
        let target = self.scope(scope);
        target.remove(&self.keys.token);
        target.remove(&self.keys.user);
        target.remove(&self.keys.refresh_token);
        if scope == StorageScope::Durable {
            target.remove(&self.keys.remember_me);
        }
    }

    fn read(&self, key: &str) -> Option<String> {
        self.durable
            .get(key)
            .filter(|v| !v.is_empty())
            .or_else(|| self.session.get(key).filter(|v| !v.is_empty()))
    }
}

impl std::fmt::Debug for AuthStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthStorage").field("keys", &self.keys).finish_non_exhaustive()
    }
}
