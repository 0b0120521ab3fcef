// feed-client/src/store.rs
use chrono::{DateTime, Utc};
use common::models::session::timestamp_from_millis;
use common::Session;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const TOKEN_KEY: &str = "twitch_token";
pub const TOKEN_TIME_KEY: &str = "token_time";
pub const USER_ID_KEY: &str = "user_id";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("store file {path} is not a JSON object: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// String key-value storage
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn delete(&mut self, key: &str) -> Result<(), StoreError>;
}

/// In-process store; nothing survives the process
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Store persisted as a flat JSON object. Every mutation rewrites the file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: HashMap<String, String>,
}

impl FileStore {
    /// Open the store at `path`; a missing file reads as empty
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        let entries = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => HashMap::new(),
            Ok(raw) => serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => HashMap::new(),
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        tracing::debug!("Opened token store {} with {} entries", path.display(), entries.len());
        Ok(Self { path, entries })
    }

    // Write `entries` out; the in-memory map is only replaced once the file holds it
    fn commit(&mut self, entries: HashMap<String, String>) -> Result<(), StoreError> {
        let raw = serde_json::to_string_pretty(&entries).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })?;

        fs::write(&self.path, raw).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;

        self.entries = entries;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.clone();
        entries.insert(key.to_string(), value.to_string());
        self.commit(entries)
    }

    fn delete(&mut self, key: &str) -> Result<(), StoreError> {
        if !self.entries.contains_key(key) {
            return Ok(());
        }

        let mut entries = self.entries.clone();
        entries.remove(key);
        self.commit(entries)
    }
}

/// Session persistence on top of a [`KeyValueStore`]. Expiry is the caller's concern.
#[derive(Debug)]
pub struct TokenStore<S> {
    store: S,
}

impl<S: KeyValueStore> TokenStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn save(&mut self, token: &str, issued_at: DateTime<Utc>) -> Result<(), StoreError> {
        self.store.set(TOKEN_KEY, token)?;
        self.store.set(TOKEN_TIME_KEY, &issued_at.timestamp_millis().to_string())
    }

    pub fn save_user_id(&mut self, user_id: &str) -> Result<(), StoreError> {
        self.store.set(USER_ID_KEY, user_id)
    }

    /// Stored session, if a token and a readable issue time are both present
    pub fn load(&self) -> Option<Session> {
        let token = self.store.get(TOKEN_KEY)?;

        let issued_at = match self.store.get(TOKEN_TIME_KEY).as_deref().and_then(timestamp_from_millis) {
            Some(issued_at) => issued_at,
            None => {
                tracing::warn!("Stored token has no usable issue time, ignoring it");
                return None;
            }
        };

        let session = Session::new(token, issued_at);
        Some(match self.store.get(USER_ID_KEY) {
            Some(user_id) => session.with_user_id(user_id),
            None => session,
        })
    }

    pub fn clear(&mut self) -> Result<(), StoreError> {
        self.store.delete(TOKEN_KEY)?;
        self.store.delete(TOKEN_TIME_KEY)?;
        self.store.delete(USER_ID_KEY)
    }

    pub fn inner(&self) -> &S {
        &self.store
    }
}
