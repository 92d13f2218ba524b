//! Durable key-value persistence backing every stateful store.
//!
//! Each logical store (progression, balance, referral) serializes its whole
//! state under one key as a JSON envelope `{ "state": …, "version": N }`.
//! Saving is an explicit step: the session calls [`save_state`] after each
//! command completes. Nothing is written implicitly.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// Keys of the logical stores.
pub mod keys {
    pub const PROGRESSION: &str = "solar-system-storage";
    pub const BALANCE: &str = "game-balance-storage";
    pub const REFERRAL: &str = "referral-storage";
    pub const DEVICE_ID: &str = "cosmic-voyage-device-id";
}

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    fn set(&self, key: &str, value: &[u8]) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Volatile store, used by tests and when no data directory is configured.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        self.entries().insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries().remove(key);
        Ok(())
    }
}

/// One file per key inside a directory. Writes go to a temp file first and
/// are renamed into place.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", file))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    state: T,
    version: u32,
}

/// Raw `state` object of a store, or `None` when absent or unreadable.
/// Unreadable data is logged and treated as absent.
pub fn load_state(store: &dyn KeyValueStore, key: &str) -> Option<Value> {
    let bytes = match store.get(key) {
        Ok(Some(bytes)) => bytes,
        Ok(None) => return None,
        Err(e) => {
            log::error!("Failed to read {}: {}", key, e);
            return None;
        }
    };
    match serde_json::from_slice::<Envelope<Value>>(&bytes) {
        Ok(envelope) => Some(envelope.state),
        Err(e) => {
            log::error!("Discarding unreadable {}: {}", key, e);
            None
        }
    }
}

/// Typed variant of [`load_state`]. A version mismatch is treated as absent.
pub fn load_typed<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
    version: u32,
) -> Option<T> {
    let bytes = store.get(key).ok().flatten()?;
    match serde_json::from_slice::<Envelope<T>>(&bytes) {
        Ok(envelope) if envelope.version == version => Some(envelope.state),
        Ok(envelope) => {
            log::warn!(
                "Ignoring {} with version {} (expected {})",
                key,
                envelope.version,
                version
            );
            None
        }
        Err(e) => {
            log::error!("Discarding unreadable {}: {}", key, e);
            None
        }
    }
}

pub fn save_state<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    version: u32,
    state: &T,
) -> Result<()> {
    let bytes = serde_json::to_vec(&Envelope { state, version })?;
    store.set(key, &bytes)
}
