//! Pseudo-anonymous device identifier.

use rand::Rng;

use crate::error::Result;
use crate::storage::{keys, KeyValueStore};

const SUFFIX_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Stable per-install identifier, `device_<epoch ms>_<base-36 suffix>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    id: String,
}

impl DeviceIdentity {
    /// Read the stored id, generating and persisting one on first use.
    pub fn load_or_create(store: &dyn KeyValueStore, now_ms: u64) -> Result<Self> {
        if let Some(bytes) = store.get(keys::DEVICE_ID)? {
            match String::from_utf8(bytes) {
                Ok(id) if !id.trim().is_empty() => return Ok(Self { id }),
                _ => log::warn!("Stored device id is unreadable, issuing a new one"),
            }
        }
        Self::reset(store, now_ms)
    }

    /// Issue and persist a fresh id.
    pub fn reset(store: &dyn KeyValueStore, now_ms: u64) -> Result<Self> {
        let id = generate(now_ms, &mut rand::thread_rng());
        store.set(keys::DEVICE_ID, id.as_bytes())?;
        log::info!("Issued device id {}", id);
        Ok(Self { id })
    }

    pub fn as_str(&self) -> &str {
        &self.id
    }
}

impl std::fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.id)
    }
}

fn generate(now_ms: u64, rng: &mut impl Rng) -> String {
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("device_{}_{}", now_ms, suffix)
}
