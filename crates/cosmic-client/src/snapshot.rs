//! Binary export/import of a progression state.
//!
//! Uses bincode for a compact, versioned snapshot. Unlike the JSON stores,
//! a snapshot with a different version is refused outright.

use std::io::{Read, Write};

use cosmic_logic::ledger::ProgressionState;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Increment when the snapshot layout changes.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    /// Epoch ms at export.
    pub saved_at: u64,
    pub device_id: String,
    pub progression: ProgressionState,
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Bincode(#[from] Box<bincode::ErrorKind>),
    #[error("Snapshot version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

pub fn save_snapshot<W: Write>(
    writer: W,
    saved_at: u64,
    device_id: &str,
    progression: &ProgressionState,
) -> Result<(), SnapshotError> {
    let snapshot = Snapshot {
        version: SNAPSHOT_VERSION,
        saved_at,
        device_id: device_id.to_string(),
        progression: progression.clone(),
    };
    bincode::serialize_into(writer, &snapshot)?;
    Ok(())
}

pub fn load_snapshot<R: Read>(reader: R) -> Result<Snapshot, SnapshotError> {
    let snapshot: Snapshot = bincode::deserialize_from(reader)?;
    if snapshot.version != SNAPSHOT_VERSION {
        return Err(SnapshotError::VersionMismatch {
            expected: SNAPSHOT_VERSION,
            found: snapshot.version,
        });
    }
    Ok(snapshot)
}
