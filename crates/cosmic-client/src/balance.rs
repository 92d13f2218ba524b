//! Remote balance authority sync.
//!
//! The server holds the canonical STAR balance per wallet. The local
//! `star_balance` is a cache: every successful response overwrites it and
//! nothing is ever added to it locally. A failed request leaves it as it was.
//!
//! Every request draws a sequence number before it is sent. When a response
//! arrives after a newer one has already been applied, it is dropped as
//! [`SyncOutcome::Stale`]. Responses for a wallet that is no longer connected
//! are dropped the same way.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::api::{BalanceResponse, BurnRequest, RemoteApi};
use crate::error::{ClientError, Result};
use crate::storage::{self, keys, KeyValueStore};

pub const BALANCE_STORE_VERSION: u32 = 1;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BalanceState {
    pub star_balance: f64,
    pub wallet_address: Option<String>,
    /// Epoch ms of a successful genesis claim made from this device.
    pub genesis_claimed_at: Option<u64>,
    pub total_burned: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SyncOutcome {
    /// The response overwrote the cached balance.
    Applied(f64),
    /// A newer response had already been applied, or the wallet changed.
    Stale,
    /// The request failed; the cached balance is unchanged.
    Failed,
}

impl SyncOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, SyncOutcome::Applied(_))
    }
}

#[derive(Debug)]
struct BalanceInner {
    state: BalanceState,
    applied_seq: u64,
}

pub struct BalanceSync {
    store: Arc<dyn KeyValueStore>,
    api: Arc<dyn RemoteApi>,
    inner: Mutex<BalanceInner>,
    next_seq: AtomicU64,
}

impl BalanceSync {
    /// Rehydrate from the balance store.
    pub fn new(store: Arc<dyn KeyValueStore>, api: Arc<dyn RemoteApi>) -> Self {
        let mut state: BalanceState =
            storage::load_typed(store.as_ref(), keys::BALANCE, BALANCE_STORE_VERSION)
                .unwrap_or_default();
        state.star_balance = state.star_balance.max(0.0);
        Self {
            store,
            api,
            inner: Mutex::new(BalanceInner {
                state,
                applied_seq: 0,
            }),
            next_seq: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BalanceInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn state(&self) -> BalanceState {
        self.lock().state.clone()
    }

    pub fn star_balance(&self) -> f64 {
        self.lock().state.star_balance
    }

    pub fn wallet_address(&self) -> Option<String> {
        self.lock().state.wallet_address.clone()
    }

    pub fn genesis_claimed(&self) -> bool {
        self.lock().state.genesis_claimed_at.is_some()
    }

    fn begin(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn persist(&self, state: &BalanceState) {
        if let Err(e) = storage::save_state(self.store.as_ref(), keys::BALANCE, BALANCE_STORE_VERSION, state)
        {
            log::error!("Failed to save balance state: {}", e);
        }
    }

    /// Apply a server balance if `seq` is the newest response seen for the
    /// wallet that is still connected.
    fn apply(&self, seq: u64, wallet: &str, response: BalanceResponse) -> SyncOutcome {
        let mut inner = self.lock();
        if inner.state.wallet_address.as_deref() != Some(wallet) {
            log::debug!("Dropping balance for disconnected wallet {}", wallet);
            return SyncOutcome::Stale;
        }
        if seq < inner.applied_seq {
            log::warn!(
                "Dropping stale balance response #{} (already applied #{})",
                seq,
                inner.applied_seq
            );
            return SyncOutcome::Stale;
        }
        let balance = response.star_balance.max(0.0);
        inner.applied_seq = seq;
        inner.state.star_balance = balance;
        let snapshot = inner.state.clone();
        drop(inner);
        self.persist(&snapshot);
        SyncOutcome::Applied(balance)
    }

    /// Fetch and overwrite the cached balance.
    pub async fn load_balance(&self, wallet: &str) -> SyncOutcome {
        let seq = self.begin();
        match self.api.star_balance(wallet).await {
            Ok(response) => {
                let outcome = self.apply(seq, wallet, response);
                if let SyncOutcome::Applied(balance) = outcome {
                    log::info!("Balance synced: {} STAR", balance);
                }
                outcome
            }
            Err(e) => {
                log::error!("Failed to load balance: {}", e);
                SyncOutcome::Failed
            }
        }
    }

    /// Spend STAR on a utility. The cache only moves to the server's
    /// post-burn value; it is never decremented locally.
    pub async fn burn_star_for_utility(
        &self,
        wallet: &str,
        amount: f64,
        utility: &str,
    ) -> Result<SyncOutcome> {
        if amount.is_nan() || amount <= 0.0 {
            return Err(ClientError::InvalidRequest(format!(
                "burn amount must be positive, got {}",
                amount
            )));
        }

        let seq = self.begin();
        let request = BurnRequest {
            wallet_address: wallet.to_string(),
            amount,
            utility: utility.to_string(),
        };
        let response = match self.api.burn_star(&request).await {
            Ok(response) => response,
            Err(e) => {
                log::error!("Failed to burn {} STAR for {}: {}", amount, utility, e);
                return Err(e);
            }
        };

        {
            let mut inner = self.lock();
            inner.state.total_burned += amount;
        }
        let outcome = self.apply(seq, wallet, response);
        if outcome == SyncOutcome::Stale {
            // Still record the burn total.
            self.persist(&self.state());
        }
        log::info!("Burned {} STAR for {}", amount, utility);
        Ok(outcome)
    }

    /// One-time genesis grant. `AlreadyClaimed` leaves the balance as is.
    pub async fn claim_genesis(&self, wallet: &str, now_ms: u64) -> Result<SyncOutcome> {
        let seq = self.begin();
        match self.api.claim_genesis(wallet).await {
            Ok(response) => {
                {
                    let mut inner = self.lock();
                    inner.state.genesis_claimed_at = Some(now_ms);
                }
                let outcome = self.apply(seq, wallet, response);
                if outcome == SyncOutcome::Stale {
                    self.persist(&self.state());
                }
                log::info!("Genesis bonus claimed for {}", wallet);
                Ok(outcome)
            }
            Err(ClientError::AlreadyClaimed { star_balance }) => {
                log::warn!("Genesis bonus already claimed for {}", wallet);
                Err(ClientError::AlreadyClaimed { star_balance })
            }
            Err(e) => {
                log::error!("Failed to claim genesis bonus: {}", e);
                Err(e)
            }
        }
    }

    /// Connect or disconnect a wallet. Connecting always forces a fresh
    /// sync, discarding whatever was cached.
    pub async fn set_wallet_address(&self, address: Option<String>) -> Option<SyncOutcome> {
        let snapshot = {
            let mut inner = self.lock();
            inner.state.wallet_address = address.clone();
            inner.state.clone()
        };
        self.persist(&snapshot);

        match address {
            Some(wallet) => Some(self.load_balance(&wallet).await),
            None => None,
        }
    }
}
