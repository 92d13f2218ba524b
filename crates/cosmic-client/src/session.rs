//! The owned game session.
//!
//! A [`Session`] owns the progression [`Ledger`] together with the stores and
//! remote seams around it. UI bindings hold it by reference; there is no
//! global store.
//!
//! # Two-phase commands
//!
//! Every command that talks to the server runs in two phases:
//!
//! 1. A synchronous local commit on the ledger, followed by an explicit save
//!    of the progression store and a telemetry enqueue.
//! 2. An awaited remote reconciliation call. Its failure is logged and never
//!    unwinds phase 1: local progression stays authoritative for gameplay.
//!
//! There is no rollback. The server may therefore miss a discovery that the
//! local ledger holds.

use std::io::{Read, Write};
use std::sync::Arc;

use cosmic_logic::accrual::Accrual;
use cosmic_logic::achievements::{self, Achievement, PlayerStats};
use cosmic_logic::catalog::Catalog;
use cosmic_logic::daily::DailyLoginReward;
use cosmic_logic::discovery::Discovery;
use cosmic_logic::immortality::ImmortalityTier;
use cosmic_logic::ledger::Ledger;
use cosmic_logic::utilities::Utility;
use serde_json::{json, Value};
use tokio::sync::watch;

use crate::api::{DiscoveryRecord, NftMintRecord, ReferralClaimResponse, RemoteApi};
use crate::balance::{BalanceSync, SyncOutcome};
use crate::clock::{Clock, SystemClock};
use crate::config::{ClientConfig, TelemetryConfig};
use crate::device::DeviceIdentity;
use crate::error::{ClientError, Result};
use crate::http::HttpApi;
use crate::referral::ReferralStore;
use crate::snapshot;
use crate::storage::{self, keys, FileStore, KeyValueStore, MemoryStore};
use crate::telemetry::{AnalyticsEvent, EventType, FlushOutcome, TelemetryQueue};

pub const PROGRESSION_STORE_VERSION: u32 = 1;

pub struct Session {
    ledger: Ledger,
    store: Arc<dyn KeyValueStore>,
    api: Arc<dyn RemoteApi>,
    clock: Arc<dyn Clock>,
    balance: Arc<BalanceSync>,
    referral: ReferralStore,
    telemetry: Arc<TelemetryQueue>,
    device: DeviceIdentity,
    tier: ImmortalityTier,
}

impl Session {
    /// Rehydrate every store and validate the persisted discoveries.
    pub fn open(
        catalog: Catalog,
        store: Arc<dyn KeyValueStore>,
        api: Arc<dyn RemoteApi>,
        clock: Arc<dyn Clock>,
        telemetry: TelemetryConfig,
    ) -> Result<Self> {
        let now = clock.now_ms();
        let device = DeviceIdentity::load_or_create(store.as_ref(), now)?;

        let ledger = match storage::load_state(store.as_ref(), keys::PROGRESSION) {
            Some(persisted) => Ledger::rehydrate(catalog, &persisted, now),
            None => Ledger::new(catalog, now),
        };
        log::info!(
            "Session opened for {} with {} discoveries",
            device,
            ledger.discovered_count()
        );

        let session = Self {
            tier: ledger.immortality_tier(),
            ledger,
            balance: Arc::new(BalanceSync::new(store.clone(), api.clone())),
            referral: ReferralStore::new(store.clone(), api.clone()),
            telemetry: Arc::new(TelemetryQueue::new(telemetry)),
            store,
            api,
            clock,
            device,
        };
        session.save();
        Ok(session)
    }

    /// Production wiring: file store (or memory), HTTP API, system clock.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let store: Arc<dyn KeyValueStore> = match &config.data_dir {
            Some(dir) => Arc::new(FileStore::open(dir)?),
            None => Arc::new(MemoryStore::new()),
        };
        let api: Arc<dyn RemoteApi> = Arc::new(HttpApi::new(config)?);
        Self::open(
            Catalog::solar_system(),
            store,
            api,
            Arc::new(SystemClock),
            config.telemetry.clone(),
        )
    }

    // ── Accessors ──────────────────────────────────────────────────────

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn balance(&self) -> &BalanceSync {
        &self.balance
    }

    pub fn referral(&self) -> &ReferralStore {
        &self.referral
    }

    pub fn telemetry(&self) -> &TelemetryQueue {
        &self.telemetry
    }

    pub fn device(&self) -> &DeviceIdentity {
        &self.device
    }

    pub fn star_balance(&self) -> f64 {
        self.balance.star_balance()
    }

    // ── Discovery ──────────────────────────────────────────────────────

    /// Discover the next body. Returns `None` (and changes nothing) when the
    /// body is unknown, already discovered, or out of order.
    pub async fn discover(&mut self, name: &str) -> Option<Discovery> {
        let now = self.clock.now_ms();
        let discovery = self.ledger.discover(name, now)?;
        let order = self
            .ledger
            .catalog()
            .get(name)
            .map(|b| b.discovery_order)
            .unwrap_or_default();
        self.save();
        self.track(
            EventType::PlanetDiscovered,
            json!({ "planet": name, "reward": discovery.tokens_earned }),
        )
        .await;
        self.check_tier().await;

        if let Some(wallet) = self.ledger.wallet_address().map(str::to_string) {
            let record = DiscoveryRecord {
                wallet_address: wallet,
                planet_name: name.to_string(),
                discovery_order: order,
                tokens_earned: discovery.tokens_earned,
            };
            if let Err(e) = self.api.record_discovery(&record).await {
                log::error!("Failed to record discovery of {} remotely: {}", name, e);
            }
        }
        Some(discovery)
    }

    pub fn claim_discovery_reward(&mut self, name: &str) -> bool {
        let claimed = self.ledger.claim_discovery_reward(name);
        if claimed {
            self.save();
        }
        claimed
    }

    pub fn complete_challenge(&mut self, id: &str) -> bool {
        let completed = self.ledger.complete_challenge(id);
        if completed {
            self.save();
        }
        completed
    }

    /// Record a completed on-chain mint against a discovered body.
    pub async fn mark_nft_minted(&mut self, name: &str, tx_hash: &str) -> bool {
        let bonus_before = self.ledger.set_bonuses().total();
        if !self.ledger.mark_nft_minted(name, tx_hash) {
            return false;
        }
        self.save();
        self.track(
            EventType::PlanetMinted,
            json!({ "planet": name, "nftId": tx_hash }),
        )
        .await;

        let set_bonus = self.ledger.set_bonuses();
        if set_bonus.total() > bonus_before {
            self.track(
                EventType::SetBonusAchieved,
                json!({
                    "innerPlanets": set_bonus.inner_planets,
                    "outerPlanets": set_bonus.outer_planets,
                    "allPlanets": set_bonus.all_planets,
                }),
            )
            .await;
        }

        if let Some(wallet) = self.ledger.wallet_address().map(str::to_string) {
            let order = self
                .ledger
                .catalog()
                .get(name)
                .map(|b| b.discovery_order)
                .unwrap_or_default();
            let record = NftMintRecord {
                wallet_address: wallet,
                planet_name: name.to_string(),
                discovery_order: order,
                transaction_hash: tx_hash.to_string(),
            };
            if let Err(e) = self.api.record_nft_mint(&record).await {
                log::error!("Failed to record {} mint remotely: {}", name, e);
            }
        }
        true
    }

    // ── Time-driven rewards ────────────────────────────────────────────

    /// Passive step; meant to be called from the host's tick or on focus.
    pub async fn update_passive_tokens(&mut self) -> Accrual {
        let accrual = self.ledger.update_passive_tokens(self.clock.now_ms());
        self.save();
        if accrual.tokens > 0.0 {
            self.track(
                EventType::PassiveIncomeClaimed,
                json!({
                    "amount": accrual.tokens,
                    "nftCount": self.ledger.state().minted_nft_count,
                }),
            )
            .await;
        }
        accrual
    }

    pub async fn claim_daily_login(&mut self) -> Option<DailyLoginReward> {
        let reward = self.ledger.claim_daily_login(self.clock.now_ms())?;
        self.save();
        self.track(
            EventType::DailyLogin,
            json!({ "streak": reward.streak, "reward": reward.total() }),
        )
        .await;
        self.check_tier().await;
        Some(reward)
    }

    // ── Wallet & balance ───────────────────────────────────────────────

    /// Connect or disconnect a wallet. Connecting re-validates progression,
    /// forces a balance sync, and refreshes referral stats.
    pub async fn set_wallet_address(&mut self, address: Option<String>) -> Option<SyncOutcome> {
        self.ledger.set_wallet_address(address.clone());
        self.ledger.validate_and_fix();
        self.save();

        let outcome = self.balance.set_wallet_address(address.clone()).await;
        if let Some(wallet) = address {
            self.referral.load_referral_stats(&wallet).await;
        }
        outcome
    }

    /// Refresh the cached balance. `None` when no wallet is connected.
    pub async fn load_balance(&self) -> Option<SyncOutcome> {
        let wallet = self.ledger.wallet_address()?;
        Some(self.balance.load_balance(wallet).await)
    }

    pub async fn burn_star_for_utility(&self, utility: Utility) -> Result<SyncOutcome> {
        let wallet = self.require_wallet()?;
        let outcome = self
            .balance
            .burn_star_for_utility(&wallet, utility.cost(), utility.wire_id())
            .await?;
        self.track(
            EventType::StarBurned,
            json!({
                "burnType": utility.wire_id(),
                "amount": utility.cost(),
                "context": "utility",
            }),
        )
        .await;
        Ok(outcome)
    }

    pub async fn claim_genesis(&self) -> Result<SyncOutcome> {
        let wallet = self.require_wallet()?;
        self.balance
            .claim_genesis(&wallet, self.clock.now_ms())
            .await
    }

    /// Genesis claim that also credits whoever owns `referral_code`.
    pub async fn claim_genesis_with_referral(
        &self,
        referral_code: Option<&str>,
    ) -> Result<ReferralClaimResponse> {
        let wallet = self.require_wallet()?;
        let response = self
            .referral
            .claim_genesis_with_referral(&wallet, referral_code)
            .await?;
        if response.referral_applied {
            self.track(
                EventType::ReferralBonusEarned,
                json!({ "referralCode": referral_code }),
            )
            .await;
        }
        self.balance.load_balance(&wallet).await;
        Ok(response)
    }

    fn require_wallet(&self) -> Result<String> {
        self.ledger
            .wallet_address()
            .map(str::to_string)
            .ok_or_else(|| ClientError::InvalidRequest("no wallet connected".to_string()))
    }

    // ── Stats & achievements ───────────────────────────────────────────

    pub fn player_stats(&self) -> PlayerStats {
        let state = self.ledger.state();
        PlayerStats {
            total_discovered: self.ledger.discovered_count(),
            total_nfts_minted: state.minted_nft_count,
            total_star_earned: self.ledger.total_claimable_tokens(),
            total_star_burned: self.balance.state().total_burned,
            max_login_streak: state.daily_login_streak,
            immortality_score: self.ledger.immortality_score(),
            referral_count: self.referral.state().referral_stats.count,
        }
    }

    pub fn unlocked_achievements(&self) -> Vec<&'static Achievement> {
        achievements::unlocked(&self.player_stats())
    }

    // ── Housekeeping ───────────────────────────────────────────────────

    pub fn reset_progress(&mut self) {
        self.ledger.reset_progress(self.clock.now_ms());
        self.tier = self.ledger.immortality_tier();
        self.save();
    }

    pub fn export_snapshot<W: Write>(&self, writer: W) -> Result<()> {
        snapshot::save_snapshot(
            writer,
            self.clock.now_ms(),
            self.device.as_str(),
            self.ledger.state(),
        )?;
        Ok(())
    }

    /// Replace progression with an exported snapshot. The discovery chain is
    /// re-validated; the connected wallet is kept.
    pub fn import_snapshot<R: Read>(&mut self, reader: R) -> Result<()> {
        let snap = snapshot::load_snapshot(reader)?;
        let wallet = self.ledger.wallet_address().map(str::to_string);
        let mut ledger = Ledger::from_state(self.ledger.catalog().clone(), snap.progression);
        ledger.set_wallet_address(wallet);
        self.ledger = ledger;
        self.tier = self.ledger.immortality_tier();
        self.save();
        log::info!("Imported snapshot from {}", snap.device_id);
        Ok(())
    }

    // ── Telemetry ──────────────────────────────────────────────────────

    pub async fn flush_telemetry(&self) -> FlushOutcome {
        self.telemetry.flush(self.api.as_ref()).await
    }

    /// Report connectivity; flushes right away when coming back online.
    pub async fn set_online(&self, online: bool) -> Option<FlushOutcome> {
        if self.telemetry.set_online(online) {
            Some(self.flush_telemetry().await)
        } else {
            None
        }
    }

    /// Interval flush loop for the host to spawn. Runs until `shutdown`
    /// becomes true.
    pub fn telemetry_task(
        &self,
        shutdown: watch::Receiver<bool>,
    ) -> impl std::future::Future<Output = ()> + Send + 'static {
        self.telemetry.clone().run(self.api.clone(), shutdown)
    }

    async fn track(&self, event_type: EventType, data: Value) {
        let event = AnalyticsEvent {
            event_type,
            device_id: self.device.as_str().to_string(),
            wallet_address: self.ledger.wallet_address().map(str::to_string),
            timestamp: self.clock.now_ms(),
            data,
        };
        if self.telemetry.track(event) {
            self.flush_telemetry().await;
        }
    }

    async fn check_tier(&mut self) {
        let tier = self.ledger.immortality_tier();
        if tier > self.tier {
            let from = self.tier;
            self.tier = tier;
            log::info!("Immortality tier up: {} -> {}", from.label(), tier.label());
            self.track(
                EventType::ImmortalityTierUp,
                json!({
                    "from": from,
                    "to": tier,
                    "score": self.ledger.immortality_score(),
                }),
            )
            .await;
        }
    }

    fn save(&self) {
        if let Err(e) = storage::save_state(
            self.store.as_ref(),
            keys::PROGRESSION,
            PROGRESSION_STORE_VERSION,
            self.ledger.state(),
        ) {
            log::error!("Failed to save progression: {}", e);
        }
    }
}
