//! The progression and reward ledger.
//!
//! [`Ledger`] owns a [`ProgressionState`] and is the single mutation entry
//! point for it: one method per command, each synchronous and atomic. There
//! is no ambient global store; callers own a `Ledger` and decide when to
//! persist it (see `cosmic-client`'s `Session`).
//!
//! # Two gates
//!
//! Discovering a body and claiming its reward are separate commands.
//! [`Ledger::discover`] appends to the ordered discovery chain and never
//! touches `total_tokens`; [`Ledger::claim_discovery_reward`] credits the
//! reward exactly once per body, tracked in `completed_challenges`.
//!
//! ```
//! use cosmic_logic::catalog::Catalog;
//! use cosmic_logic::ledger::Ledger;
//!
//! let mut ledger = Ledger::new(Catalog::solar_system(), 0);
//! assert!(ledger.discover("Venus", 1).is_none()); // Mercury comes first
//! assert!(ledger.discover("Mercury", 1).is_some());
//! assert!(ledger.claim_discovery_reward("Mercury"));
//! assert_eq!(ledger.state().total_tokens, 10.0);
//! ```
//!
//! Rejected commands return `None`/`false` and log a warning; the `try_*`
//! variants expose the reason.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::accrual::{self, Accrual};
use crate::catalog::{Catalog, CelestialBody};
use crate::challenges::{self, Challenge, CHALLENGES};
use crate::constants::passive;
use crate::daily::{self, DailyLoginReward};
use crate::discovery::{self, Discovery};
use crate::immortality::{self, ImmortalityTier};

/// Persisted progression snapshot. Field names match the stored JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressionState {
    /// Append-only, in discovery order.
    pub discovered_planets: Vec<Discovery>,
    pub total_tokens: f64,
    pub bonus_tokens: f64,
    /// Completed challenge ids and bodies whose discovery reward was claimed.
    pub completed_challenges: BTreeSet<String>,
    pub minted_nft_count: u32,
    pub owned_nfts: Vec<String>,
    pub passive_tokens_generated: f64,
    pub last_passive_token_update: u64,
    pub last_daily_login_time: u64,
    pub daily_login_streak: u32,
    pub total_daily_logins_earned: f64,
    pub immortality_score: u64,
    pub wallet_address: Option<String>,
}

impl ProgressionState {
    pub fn fresh(now: u64) -> Self {
        Self {
            discovered_planets: Vec::new(),
            total_tokens: 0.0,
            bonus_tokens: 0.0,
            completed_challenges: BTreeSet::new(),
            minted_nft_count: 0,
            owned_nfts: Vec::new(),
            passive_tokens_generated: 0.0,
            last_passive_token_update: now,
            last_daily_login_time: 0,
            daily_login_streak: 0,
            total_daily_logins_earned: 0.0,
            immortality_score: 0,
            wallet_address: None,
        }
    }
}

/// Field-by-field reader over persisted JSON. Each field is read on its own
/// so one mistyped value cannot take the rest of the state down with it.
struct PersistedFields<'a>(&'a Value);

impl PersistedFields<'_> {
    fn field(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    fn mistyped(key: &str, value: &Value) {
        log::warn!("Ignoring mistyped persisted field {}: {}", key, value);
    }

    fn f64_or(&self, key: &str, default: f64) -> f64 {
        match self.field(key) {
            None => default,
            Some(v) => match v.as_f64().filter(|n| n.is_finite()) {
                Some(n) => n,
                None => {
                    Self::mistyped(key, v);
                    default
                }
            },
        }
    }

    /// Non-negative integer; fractional values are truncated.
    fn u64_or(&self, key: &str, default: u64) -> u64 {
        match self.field(key) {
            None => default,
            Some(v) => match v
                .as_u64()
                .or_else(|| v.as_f64().filter(|n| n.is_finite() && *n >= 0.0).map(|n| n as u64))
            {
                Some(n) => n,
                None => {
                    Self::mistyped(key, v);
                    default
                }
            },
        }
    }

    fn u32_or(&self, key: &str, default: u32) -> u32 {
        let n = self.u64_or(key, u64::from(default));
        u32::try_from(n).unwrap_or(u32::MAX)
    }

    fn strings(&self, key: &str) -> Vec<String> {
        match self.field(key) {
            None => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect(),
            Some(v) => {
                Self::mistyped(key, v);
                Vec::new()
            }
        }
    }

    fn string(&self, key: &str) -> Option<String> {
        let v = self.field(key)?;
        match v.as_str() {
            Some(s) => Some(s.to_string()),
            None => {
                Self::mistyped(key, v);
                None
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DiscoveryError {
    #[error("unknown body: {0}")]
    UnknownBody(String),
    #[error("{0} is already discovered")]
    AlreadyDiscovered(String),
    #[error("cannot discover {name} yet: it is body #{order} but {discovered} bodies are discovered")]
    OutOfOrder {
        name: String,
        order: u32,
        discovered: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClaimError {
    #[error("unknown body: {0}")]
    UnknownBody(String),
    #[error("{0} has not been discovered")]
    NotDiscovered(String),
    #[error("reward for {0} already claimed")]
    AlreadyClaimed(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MintError {
    #[error("{0} has not been discovered")]
    NotDiscovered(String),
    #[error("{0} is already minted")]
    AlreadyMinted(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChallengeError {
    #[error("unknown challenge: {0}")]
    Unknown(String),
    #[error("challenge {0} already completed")]
    AlreadyCompleted(String),
    #[error("challenge {id} needs {required} discoveries, have {have}")]
    NotEligible {
        id: String,
        required: usize,
        have: usize,
    },
}

/// Owned ledger: catalog + mutable progression state.
#[derive(Debug, Clone)]
pub struct Ledger {
    catalog: Catalog,
    state: ProgressionState,
}

impl Ledger {
    pub fn new(catalog: Catalog, now: u64) -> Self {
        Self {
            catalog,
            state: ProgressionState::fresh(now),
        }
    }

    /// Wrap an existing state, re-validating its discovery chain.
    pub fn from_state(catalog: Catalog, state: ProgressionState) -> Self {
        let mut ledger = Self { catalog, state };
        ledger.validate_and_fix();
        ledger
    }

    /// Rebuild from a persisted JSON state object. Missing or mistyped
    /// fields fall back to fresh values; discoveries are validated.
    pub fn rehydrate(catalog: Catalog, persisted: &Value, now: u64) -> Self {
        if !persisted.is_object() {
            log::error!("Persisted progression is not an object; starting fresh");
        }
        let fields = PersistedFields(persisted);
        let raw_discoveries = fields.field("discoveredPlanets").unwrap_or(&Value::Null);
        let discovered = discovery::validate_discoveries(&catalog, raw_discoveries);

        let fresh = ProgressionState::fresh(now);
        let mut state = ProgressionState {
            discovered_planets: discovered,
            total_tokens: fields.f64_or("totalTokens", fresh.total_tokens),
            bonus_tokens: fields.f64_or("bonusTokens", fresh.bonus_tokens),
            completed_challenges: fields.strings("completedChallenges").into_iter().collect(),
            minted_nft_count: fields.u32_or("mintedNftCount", 0),
            owned_nfts: fields.strings("ownedNfts"),
            passive_tokens_generated: fields.f64_or("passiveTokensGenerated", 0.0),
            last_passive_token_update: fields
                .u64_or("lastPassiveTokenUpdate", fresh.last_passive_token_update),
            last_daily_login_time: fields.u64_or("lastDailyLoginTime", 0),
            daily_login_streak: fields.u32_or("dailyLoginStreak", 0),
            total_daily_logins_earned: fields.f64_or("totalDailyLoginsEarned", 0.0),
            immortality_score: 0,
            wallet_address: fields.string("walletAddress"),
        };
        state.immortality_score =
            immortality::score(state.discovered_planets.len(), state.daily_login_streak);

        Self { catalog, state }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn state(&self) -> &ProgressionState {
        &self.state
    }

    pub fn into_state(self) -> ProgressionState {
        self.state
    }

    // ── Discovery ──────────────────────────────────────────────────────

    pub fn discovered_count(&self) -> usize {
        self.state.discovered_planets.len()
    }

    pub fn is_discovered(&self, name: &str) -> bool {
        self.state
            .discovered_planets
            .iter()
            .any(|d| d.planet_name == name)
    }

    /// True iff `name` exists and is exactly the next body in the chain.
    pub fn can_discover(&self, name: &str) -> bool {
        self.catalog
            .get(name)
            .is_some_and(|body| body.discovery_order as usize == self.discovered_count() + 1)
    }

    pub fn next_body_to_discover(&self) -> Option<&CelestialBody> {
        self.catalog.next_undiscovered(self.discovered_count())
    }

    pub fn try_discover(&mut self, name: &str, now: u64) -> Result<Discovery, DiscoveryError> {
        let body = self
            .catalog
            .get(name)
            .ok_or_else(|| DiscoveryError::UnknownBody(name.to_string()))?;

        if self.is_discovered(name) {
            return Err(DiscoveryError::AlreadyDiscovered(name.to_string()));
        }
        if !self.can_discover(name) {
            return Err(DiscoveryError::OutOfOrder {
                name: name.to_string(),
                order: body.discovery_order,
                discovered: self.discovered_count(),
            });
        }

        let discovery = Discovery::new(name, now, body.token_reward);
        self.state.discovered_planets.push(discovery.clone());
        self.refresh_immortality_score();
        Ok(discovery)
    }

    /// Append the next discovery. No-op with a warning when rejected.
    pub fn discover(&mut self, name: &str, now: u64) -> Option<Discovery> {
        match self.try_discover(name, now) {
            Ok(discovery) => {
                log::info!(
                    "Discovered {}! Reward of {} STAR is ready to claim",
                    name,
                    discovery.tokens_earned
                );
                Some(discovery)
            }
            Err(e) => {
                log::warn!("Discovery rejected: {}", e);
                None
            }
        }
    }

    // ── Reward claims & challenges ─────────────────────────────────────

    pub fn try_claim_discovery_reward(&mut self, name: &str) -> Result<f64, ClaimError> {
        let reward = self
            .catalog
            .get(name)
            .map(|b| b.token_reward)
            .ok_or_else(|| ClaimError::UnknownBody(name.to_string()))?;

        if !self.is_discovered(name) {
            return Err(ClaimError::NotDiscovered(name.to_string()));
        }
        if self.state.completed_challenges.contains(name) {
            return Err(ClaimError::AlreadyClaimed(name.to_string()));
        }

        self.state.total_tokens += reward;
        self.state.completed_challenges.insert(name.to_string());
        Ok(reward)
    }

    /// Credit a discovered body's reward once. Returns whether it was credited.
    pub fn claim_discovery_reward(&mut self, name: &str) -> bool {
        match self.try_claim_discovery_reward(name) {
            Ok(reward) => {
                log::info!("Claimed {} STAR for discovering {}", reward, name);
                true
            }
            Err(e) => {
                log::warn!("Claim rejected: {}", e);
                false
            }
        }
    }

    pub fn is_challenge_completed(&self, id: &str) -> bool {
        self.state.completed_challenges.contains(id)
    }

    /// Challenges that are eligible and not yet completed.
    pub fn available_challenges(&self) -> Vec<&'static Challenge> {
        CHALLENGES
            .iter()
            .filter(|c| !self.is_challenge_completed(c.id))
            .filter(|c| c.is_eligible(self.discovered_count()))
            .collect()
    }

    pub fn try_complete_challenge(&mut self, id: &str) -> Result<f64, ChallengeError> {
        let challenge = challenges::find(id).ok_or_else(|| ChallengeError::Unknown(id.to_string()))?;
        if self.is_challenge_completed(id) {
            return Err(ChallengeError::AlreadyCompleted(id.to_string()));
        }
        if !challenge.is_eligible(self.discovered_count()) {
            return Err(ChallengeError::NotEligible {
                id: id.to_string(),
                required: challenge.required_discoveries,
                have: self.discovered_count(),
            });
        }

        self.state.completed_challenges.insert(id.to_string());
        self.state.bonus_tokens += challenge.reward;
        Ok(challenge.reward)
    }

    pub fn complete_challenge(&mut self, id: &str) -> bool {
        match self.try_complete_challenge(id) {
            Ok(reward) => {
                log::info!("Challenge {} completed: +{} bonus STAR", id, reward);
                true
            }
            Err(e) => {
                log::warn!("Challenge rejected: {}", e);
                false
            }
        }
    }

    // ── NFTs ───────────────────────────────────────────────────────────

    pub fn try_mark_nft_minted(&mut self, name: &str, tx_hash: &str) -> Result<(), MintError> {
        let discovery = self
            .state
            .discovered_planets
            .iter_mut()
            .find(|d| d.planet_name == name)
            .ok_or_else(|| MintError::NotDiscovered(name.to_string()))?;

        if discovery.nft_minted {
            return Err(MintError::AlreadyMinted(name.to_string()));
        }

        discovery.nft_minted = true;
        discovery.nft_transaction_hash = Some(tx_hash.to_string());
        self.state.owned_nfts.push(name.to_string());
        self.state.minted_nft_count += 1;
        Ok(())
    }

    pub fn mark_nft_minted(&mut self, name: &str, tx_hash: &str) -> bool {
        match self.try_mark_nft_minted(name, tx_hash) {
            Ok(()) => {
                log::info!("Minted {} NFT (tx {})", name, tx_hash);
                true
            }
            Err(e) => {
                log::warn!("Mint record rejected: {}", e);
                false
            }
        }
    }

    pub fn is_nft_owned(&self, name: &str) -> bool {
        self.state.owned_nfts.iter().any(|n| n == name)
    }

    // ── Passive income ─────────────────────────────────────────────────

    /// Hourly passive step at the flat rate.
    ///
    /// Credits `floor(elapsed / 1h) * rate` and then moves
    /// `last_passive_token_update` to `now` even when zero hours elapsed, so
    /// the sub-hour remainder is dropped on every call. Calling this often
    /// with short gaps accrues less than calling it rarely.
    pub fn update_passive_tokens(&mut self, now: u64) -> Accrual {
        let accrual = accrual::passive_accrual(
            self.state.last_passive_token_update,
            now,
            passive::TOKENS_PER_HOUR,
        );
        self.state.passive_tokens_generated += accrual.tokens;
        self.state.last_passive_token_update = now;
        if accrual.whole_hours > 0 {
            log::info!(
                "Accrued {} passive STAR over {}h",
                accrual.tokens,
                accrual.whole_hours
            );
        }
        accrual
    }

    /// NFT-weighted hourly rate. Informational; not used by the passive step.
    pub fn holdings_rate(&self) -> f64 {
        accrual::holdings_rate(&self.catalog, &self.state.owned_nfts)
    }

    pub fn set_bonuses(&self) -> accrual::SetBonuses {
        accrual::set_bonuses(&self.state.owned_nfts)
    }

    // ── Daily login ────────────────────────────────────────────────────

    pub fn claim_daily_login(&mut self, now: u64) -> Option<DailyLoginReward> {
        let Some(reward) = daily::evaluate_daily_login(
            self.state.last_daily_login_time,
            self.state.daily_login_streak,
            now,
        ) else {
            log::info!("Daily login already claimed today");
            return None;
        };

        self.state.total_tokens += reward.total();
        self.state.total_daily_logins_earned += reward.total();
        self.state.last_daily_login_time = now;
        self.state.daily_login_streak = reward.streak;
        self.refresh_immortality_score();

        log::info!(
            "Daily login claimed: +{} STAR (day {} streak)",
            reward.total(),
            reward.streak
        );
        Some(reward)
    }

    // ── Derived figures ────────────────────────────────────────────────

    pub fn immortality_score(&self) -> u64 {
        immortality::score(self.discovered_count(), self.state.daily_login_streak)
    }

    pub fn immortality_tier(&self) -> ImmortalityTier {
        ImmortalityTier::from_score(self.immortality_score())
    }

    pub fn total_claimable_tokens(&self) -> f64 {
        self.state.total_tokens + self.state.bonus_tokens + self.state.passive_tokens_generated
    }

    fn refresh_immortality_score(&mut self) {
        self.state.immortality_score = self.immortality_score();
    }

    // ── Housekeeping ───────────────────────────────────────────────────

    pub fn wallet_address(&self) -> Option<&str> {
        self.state.wallet_address.as_deref()
    }

    pub fn set_wallet_address(&mut self, address: Option<String>) {
        log::info!(
            "{}",
            if address.is_some() {
                "Wallet address connected"
            } else {
                "Wallet address disconnected"
            }
        );
        self.state.wallet_address = address;
    }

    /// Re-apply discovery validation. Returns true if anything was dropped.
    pub fn validate_and_fix(&mut self) -> bool {
        let before = self.state.discovered_planets.len();
        let current = std::mem::take(&mut self.state.discovered_planets);
        self.state.discovered_planets = discovery::ordered_prefix(&self.catalog, current);
        self.refresh_immortality_score();

        let changed = self.state.discovered_planets.len() != before;
        if changed {
            log::info!(
                "Validated and corrected progression: kept {} of {} discoveries",
                self.state.discovered_planets.len(),
                before
            );
        }
        changed
    }

    /// Back to a fresh state. The connected wallet is kept.
    pub fn reset_progress(&mut self, now: u64) {
        let wallet = self.state.wallet_address.take();
        self.state = ProgressionState::fresh(now);
        self.state.wallet_address = wallet;
        log::info!("Progress reset");
    }
}
