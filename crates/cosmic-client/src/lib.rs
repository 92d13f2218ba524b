//! Cosmic Voyage client engine.
//!
//! Wraps the pure [`cosmic_logic`] ledger with everything that touches the
//! outside world: durable stores, the device identifier, the remote balance
//! authority, referral mirroring, and batched event telemetry. The owned
//! [`session::Session`] ties them together and runs each command as a local
//! commit followed by best-effort remote reconciliation.
//!
//! # Example
//!
//! ```rust,no_run
//! use cosmic_client::config::ClientConfig;
//! use cosmic_client::session::Session;
//!
//! # async fn example() -> Result<(), cosmic_client::error::ClientError> {
//! let mut session = Session::from_config(&ClientConfig::from_args())?;
//! session.set_wallet_address(Some("EQabc".to_string())).await;
//!
//! if session.discover("Mercury").await.is_some() {
//!     session.claim_discovery_reward("Mercury");
//! }
//! session.update_passive_tokens().await;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod balance;
pub mod clock;
pub mod config;
pub mod device;
pub mod error;
pub mod http;
pub mod referral;
pub mod session;
pub mod snapshot;
pub mod storage;
pub mod telemetry;

pub mod prelude {
    pub use crate::api::RemoteApi;
    pub use crate::balance::SyncOutcome;
    pub use crate::clock::{Clock, ManualClock, SystemClock};
    pub use crate::config::ClientConfig;
    pub use crate::error::{ClientError, Result};
    pub use crate::session::Session;
    pub use crate::storage::{FileStore, KeyValueStore, MemoryStore};
}
