//! Error types for the client engine

use thiserror::Error;

use crate::snapshot::SnapshotError;

/// Client error: remote calls, storage, snapshots.
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed (connect, timeout, body)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Server returned a non-2xx status
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    /// Genesis bonus was already claimed for this wallet (HTTP 409)
    #[error("Genesis bonus already claimed")]
    AlreadyClaimed { star_balance: Option<f64> },

    /// Request refused locally before reaching the network
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Transport-level failure reported by a non-HTTP `RemoteApi`
    #[error("Transport error: {0}")]
    Transport(String),

    /// Persistence layer I/O
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),
}

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;
