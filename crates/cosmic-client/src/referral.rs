//! Referral code and stats, mirrored from the server.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::api::{ReferralClaimResponse, RemoteApi};
use crate::error::Result;
use crate::storage::{self, keys, KeyValueStore};

pub const REFERRAL_STORE_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferralStats {
    pub count: u32,
    pub bonus: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReferralState {
    pub referral_code: Option<String>,
    /// Wallet of whoever referred this player, when known.
    pub referrer_wallet: Option<String>,
    pub referral_stats: ReferralStats,
}

pub struct ReferralStore {
    store: Arc<dyn KeyValueStore>,
    api: Arc<dyn RemoteApi>,
    state: Mutex<ReferralState>,
}

impl ReferralStore {
    pub fn new(store: Arc<dyn KeyValueStore>, api: Arc<dyn RemoteApi>) -> Self {
        let state = storage::load_typed(store.as_ref(), keys::REFERRAL, REFERRAL_STORE_VERSION)
            .unwrap_or_default();
        Self {
            store,
            api,
            state: Mutex::new(state),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ReferralState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn state(&self) -> ReferralState {
        self.lock().clone()
    }

    pub fn referral_code(&self) -> Option<String> {
        self.lock().referral_code.clone()
    }

    pub fn set_referrer_wallet(&self, wallet: Option<String>) {
        self.update(|state| state.referrer_wallet = wallet);
    }

    fn update(&self, f: impl FnOnce(&mut ReferralState)) {
        let snapshot = {
            let mut state = self.lock();
            f(&mut state);
            state.clone()
        };
        if let Err(e) =
            storage::save_state(self.store.as_ref(), keys::REFERRAL, REFERRAL_STORE_VERSION, &snapshot)
        {
            log::error!("Failed to save referral state: {}", e);
        }
    }

    /// Overwrite code and stats from the server. Returns whether it succeeded;
    /// on failure the stored values stay.
    pub async fn load_referral_stats(&self, wallet: &str) -> bool {
        match self.api.referral_stats(wallet).await {
            Ok(stats) => {
                self.update(|state| {
                    state.referral_code = stats.referral_code;
                    state.referral_stats = ReferralStats {
                        count: stats.referral_count,
                        bonus: stats.bonus_earned,
                    };
                });
                true
            }
            Err(e) => {
                log::error!("Failed to load referral stats: {}", e);
                false
            }
        }
    }

    /// Claim the genesis grant, crediting `referral_code`'s owner if given.
    /// Stores this player's own referral code on success.
    pub async fn claim_genesis_with_referral(
        &self,
        wallet: &str,
        referral_code: Option<&str>,
    ) -> Result<ReferralClaimResponse> {
        match self.api.claim_genesis_with_referral(wallet, referral_code).await {
            Ok(response) => {
                if let Some(code) = response.referral_code.clone() {
                    self.update(|state| state.referral_code = Some(code));
                }
                log::info!(
                    "Genesis claimed with referral (applied: {})",
                    response.referral_applied
                );
                Ok(response)
            }
            Err(e) => {
                log::error!("Failed to claim genesis with referral: {}", e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::testing::NullApi;

    #[tokio::test]
    async fn test_failed_load_keeps_state() {
        let store = Arc::new(MemoryStore::new());
        let referral = ReferralStore::new(store.clone(), Arc::new(NullApi));
        referral.set_referrer_wallet(Some("EQfriend".into()));

        assert!(!referral.load_referral_stats("EQabc").await);
        assert_eq!(referral.state().referrer_wallet.as_deref(), Some("EQfriend"));

        let reopened = ReferralStore::new(store, Arc::new(NullApi));
        assert_eq!(reopened.state().referrer_wallet.as_deref(), Some("EQfriend"));
    }
}
