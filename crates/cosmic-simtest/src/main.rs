//! Cosmic Voyage Headless Harness
//!
//! Sweeps the progression ledger and drives a full client session against
//! an in-process balance authority. No network, no browser, no storage on
//! disk.
//!
//! Usage:
//!   cargo run -p cosmic-simtest
//!   cargo run -p cosmic-simtest -- --verbose

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use cosmic_client::api::*;
use cosmic_client::balance::SyncOutcome;
use cosmic_client::clock::{Clock, ManualClock};
use cosmic_client::config::ClientConfig;
use cosmic_client::error::{ClientError, Result};
use cosmic_client::session::Session;
use cosmic_client::storage::{KeyValueStore, MemoryStore};
use cosmic_client::telemetry::FlushOutcome;
use cosmic_logic::catalog::{BodyKind, Catalog, SOLAR_SYSTEM_SIZE};
use cosmic_logic::constants::timing::{MS_PER_DAY, MS_PER_HOUR};
use cosmic_logic::discovery::{self, Discovery};
use cosmic_logic::immortality::ImmortalityTier;
use cosmic_logic::ledger::Ledger;
use cosmic_logic::utilities::Utility;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn check(name: &str, passed: bool, detail: impl Into<String>) -> TestResult {
    TestResult {
        name: name.into(),
        passed,
        detail: detail.into(),
    }
}

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    println!("=== Cosmic Voyage Harness ===\n");

    let mut results = Vec::new();

    // 1. Catalog integrity
    results.extend(validate_catalog(verbose));

    // 2. Discovery chain
    results.extend(validate_discovery_chain(verbose));

    // 3. Rewards & challenges
    results.extend(validate_rewards(verbose));

    // 4. Passive accrual
    results.extend(validate_passive_accrual(verbose));

    // 5. Daily login streaks
    results.extend(validate_daily_streaks(verbose));

    // 6. Corrupted-state healing
    results.extend(validate_healing(verbose));

    // 7. Full session against a local authority
    match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => results.extend(rt.block_on(validate_session(verbose))),
        Err(e) => results.push(check("session_runtime", false, format!("tokio: {}", e))),
    }

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

fn names(catalog: &Catalog) -> Vec<String> {
    catalog.iter().map(|b| b.name.clone()).collect()
}

// ── 1. Catalog ──────────────────────────────────────────────────────────

fn validate_catalog(verbose: bool) -> Vec<TestResult> {
    println!("--- Catalog ---");
    let catalog = Catalog::solar_system();
    let mut results = Vec::new();

    results.push(check(
        "catalog_size",
        catalog.len() == SOLAR_SYSTEM_SIZE
            && catalog.count_of(BodyKind::Planet) == 8
            && catalog.count_of(BodyKind::DwarfPlanet) == 7
            && catalog.count_of(BodyKind::Asteroid) == SOLAR_SYSTEM_SIZE - 15,
        format!("{} bodies", catalog.len()),
    ));

    let contiguous = catalog
        .iter()
        .enumerate()
        .all(|(i, b)| b.discovery_order as usize == i + 1);
    results.push(check(
        "catalog_contiguous_order",
        contiguous,
        "discovery orders run 1..=N",
    ));

    let unique: HashSet<_> = catalog.iter().map(|b| b.name.as_str()).collect();
    results.push(check(
        "catalog_unique_names",
        unique.len() == catalog.len(),
        format!("{} unique names", unique.len()),
    ));

    let bad_reward = catalog.iter().filter(|b| b.token_reward < 0.0).count();
    results.push(check(
        "catalog_non_negative_rewards",
        bad_reward == 0,
        format!("{} negative rewards", bad_reward),
    ));

    let kinds = (
        catalog.count_of(BodyKind::Planet),
        catalog.count_of(BodyKind::DwarfPlanet),
        catalog.count_of(BodyKind::Asteroid),
    );
    results.push(check(
        "catalog_kinds",
        kinds == (8, 7, 13),
        format!("{} planets, {} dwarf planets, {} asteroids", kinds.0, kinds.1, kinds.2),
    ));

    if verbose {
        for body in catalog.iter().take(8) {
            println!(
                "  #{:<2} {:<8} {:>5} STAR",
                body.discovery_order, body.name, body.token_reward
            );
        }
    }
    results
}

// ── 2. Discovery chain ──────────────────────────────────────────────────

fn validate_discovery_chain(verbose: bool) -> Vec<TestResult> {
    println!("--- Discovery Chain ---");
    let catalog = Catalog::solar_system();
    let all = names(&catalog);
    let mut ledger = Ledger::new(catalog, 0);
    let mut results = Vec::new();

    // At every step exactly one body is discoverable.
    let mut violations = 0;
    for (step, name) in all.iter().enumerate() {
        let eligible: Vec<_> = all.iter().filter(|n| ledger.can_discover(n)).collect();
        if eligible != vec![name] {
            violations += 1;
            if verbose {
                println!("  step {}: eligible {:?}", step, eligible);
            }
        }
        ledger.discover(name, step as u64);
    }
    results.push(check(
        "chain_single_eligible",
        violations == 0,
        format!("{} steps with wrong eligibility", violations),
    ));

    results.push(check(
        "chain_complete",
        ledger.discovered_count() == all.len() && ledger.next_body_to_discover().is_none(),
        format!("{} of {} discovered", ledger.discovered_count(), all.len()),
    ));

    let replays = all.iter().filter(|n| ledger.discover(n, 999).is_some()).count();
    results.push(check(
        "chain_no_duplicates",
        replays == 0 && ledger.discovered_count() == all.len(),
        format!("{} replays accepted", replays),
    ));

    results.push(check(
        "chain_no_auto_credit",
        ledger.state().total_tokens == 0.0,
        format!("total_tokens {} after discovering everything", ledger.state().total_tokens),
    ));
    results
}

// ── 3. Rewards ──────────────────────────────────────────────────────────

fn validate_rewards(_verbose: bool) -> Vec<TestResult> {
    println!("--- Rewards & Challenges ---");
    let catalog = Catalog::solar_system();
    let all = names(&catalog);
    let expected: f64 = catalog.iter().map(|b| b.token_reward).sum();
    let mut ledger = Ledger::new(catalog, 0);
    let mut results = Vec::new();

    for name in &all {
        ledger.discover(name, 0);
    }
    for name in &all {
        ledger.claim_discovery_reward(name);
        ledger.claim_discovery_reward(name);
    }
    results.push(check(
        "rewards_claimed_once",
        (ledger.state().total_tokens - expected).abs() < 1e-9,
        format!("{} of {} STAR", ledger.state().total_tokens, expected),
    ));

    let ids: Vec<_> = ledger.available_challenges().iter().map(|c| c.id).collect();
    for id in &ids {
        ledger.complete_challenge(id);
    }
    results.push(check(
        "challenges_all_completed",
        ids.len() == 3 && ledger.available_challenges().is_empty(),
        format!("{} completed, bonus {}", ids.len(), ledger.state().bonus_tokens),
    ));

    results.push(check(
        "claimable_is_sum",
        (ledger.total_claimable_tokens() - (expected + 135.0)).abs() < 1e-9,
        format!("{} claimable", ledger.total_claimable_tokens()),
    ));
    results
}

// ── 4. Passive accrual ──────────────────────────────────────────────────

fn validate_passive_accrual(verbose: bool) -> Vec<TestResult> {
    println!("--- Passive Accrual ---");
    let mut results = Vec::new();
    let day = MS_PER_DAY;

    // One call after 24h.
    let mut rare = Ledger::new(Catalog::solar_system(), 0);
    rare.update_passive_tokens(day);

    // A call every 45 minutes over the same day.
    let mut frequent = Ledger::new(Catalog::solar_system(), 0);
    let step = MS_PER_HOUR * 3 / 4;
    let mut now = 0;
    while now + step <= day {
        now += step;
        frequent.update_passive_tokens(now);
    }
    frequent.update_passive_tokens(day);

    let rare_total = rare.state().passive_tokens_generated;
    let frequent_total = frequent.state().passive_tokens_generated;
    if verbose {
        println!("  rare: {}  frequent: {}", rare_total, frequent_total);
    }
    results.push(check(
        "passive_rare_full_day",
        (rare_total - 12.0).abs() < 1e-9,
        format!("{} STAR after one 24h step", rare_total),
    ));
    results.push(check(
        "passive_frequent_floors",
        frequent_total == 0.0 && frequent.state().last_passive_token_update == day,
        format!("{} STAR from 45-minute steps", frequent_total),
    ));
    results
}

// ── 5. Daily login ──────────────────────────────────────────────────────

fn validate_daily_streaks(_verbose: bool) -> Vec<TestResult> {
    println!("--- Daily Login ---");
    let mut ledger = Ledger::new(Catalog::solar_system(), 0);
    let mut results = Vec::new();

    let mut earned = 0.0;
    for day in 1..=30u64 {
        if let Some(r) = ledger.claim_daily_login(day * MS_PER_DAY) {
            earned += r.total();
        }
    }
    results.push(check(
        "daily_streak_30",
        ledger.state().daily_login_streak == 30,
        format!("streak {}", ledger.state().daily_login_streak),
    ));
    results.push(check(
        "daily_milestones_paid",
        (earned - (300.0 + 25.0 + 100.0)).abs() < 1e-9,
        format!("{} STAR over 30 days", earned),
    ));

    let late = ledger.claim_daily_login(32 * MS_PER_DAY);
    results.push(check(
        "daily_streak_resets",
        late.map(|r| r.streak) == Some(1),
        "a 2-day gap restarts at day 1",
    ));
    results.push(check(
        "immortality_tracks_streak",
        ledger.immortality_score() == 2 && ledger.immortality_tier() == ImmortalityTier::Unranked,
        format!("score {}", ledger.immortality_score()),
    ));
    results
}

// ── 6. Healing ──────────────────────────────────────────────────────────

fn validate_healing(verbose: bool) -> Vec<TestResult> {
    println!("--- Corrupted State Healing ---");
    let catalog = Catalog::solar_system();
    let all = names(&catalog);
    let mut rng = StdRng::seed_from_u64(0xC05_u64);
    let mut bad = 0;
    let rounds = 200;

    for round in 0..rounds {
        let mut shuffled: Vec<Discovery> = all
            .iter()
            .take(10)
            .enumerate()
            .map(|(i, n)| Discovery::new(n.as_str(), i as u64, 0.0))
            .collect();
        shuffled.shuffle(&mut rng);
        if round % 3 == 0 {
            let dup = shuffled[0].clone();
            shuffled.push(dup);
        }

        let raw = serde_json::to_value(&shuffled).unwrap_or_default();
        let healed = discovery::validate_discoveries(&catalog, &raw);
        let is_prefix = healed
            .iter()
            .enumerate()
            .all(|(i, d)| d.planet_name == all[i]);
        let expected_len = shuffled
            .iter()
            .zip(all.iter())
            .take_while(|(d, n)| &d.planet_name == *n)
            .count();
        if !is_prefix || healed.len() != expected_len {
            bad += 1;
            if verbose {
                println!("  round {}: kept {} expected {}", round, healed.len(), expected_len);
            }
        }
    }

    vec![
        check(
            "healing_ordered_prefix",
            bad == 0,
            format!("{} of {} shuffled lists healed incorrectly", bad, rounds),
        ),
        check(
            "healing_non_array",
            discovery::validate_discoveries(&catalog, &serde_json::json!({ "x": 1 })).is_empty(),
            "non-array input yields no discoveries",
        ),
    ]
}

// ── 7. Session ──────────────────────────────────────────────────────────

/// Minimal in-process balance authority.
#[derive(Default)]
struct LocalAuthority {
    balances: Mutex<HashMap<String, f64>>,
    genesis: Mutex<HashSet<String>>,
    discoveries: Mutex<usize>,
    events: Mutex<usize>,
}

impl LocalAuthority {
    fn balance(&self, wallet: &str) -> f64 {
        self.balances
            .lock()
            .map(|b| b.get(wallet).copied().unwrap_or(0.0))
            .unwrap_or(0.0)
    }

    fn set(&self, wallet: &str, value: f64) {
        if let Ok(mut b) = self.balances.lock() {
            b.insert(wallet.to_string(), value);
        }
    }
}

#[async_trait]
impl RemoteApi for LocalAuthority {
    async fn record_discovery(&self, _: &DiscoveryRecord) -> Result<()> {
        if let Ok(mut n) = self.discoveries.lock() {
            *n += 1;
        }
        Ok(())
    }

    async fn record_nft_mint(&self, _: &NftMintRecord) -> Result<()> {
        Ok(())
    }

    async fn star_balance(&self, wallet: &str) -> Result<BalanceResponse> {
        Ok(BalanceResponse {
            star_balance: self.balance(wallet),
        })
    }

    async fn burn_star(&self, request: &BurnRequest) -> Result<BalanceResponse> {
        let current = self.balance(&request.wallet_address);
        if current < request.amount {
            return Err(ClientError::Server {
                status: 400,
                message: "Insufficient STAR".into(),
            });
        }
        self.set(&request.wallet_address, current - request.amount);
        self.star_balance(&request.wallet_address).await
    }

    async fn claim_genesis(&self, wallet: &str) -> Result<BalanceResponse> {
        let fresh = self
            .genesis
            .lock()
            .map(|mut g| g.insert(wallet.to_string()))
            .unwrap_or(false);
        if !fresh {
            return Err(ClientError::AlreadyClaimed {
                star_balance: Some(self.balance(wallet)),
            });
        }
        self.set(wallet, self.balance(wallet) + 10.0);
        self.star_balance(wallet).await
    }

    async fn referral_stats(&self, _: &str) -> Result<ReferralStatsResponse> {
        Ok(ReferralStatsResponse::default())
    }

    async fn claim_genesis_with_referral(
        &self,
        wallet: &str,
        _: Option<&str>,
    ) -> Result<ReferralClaimResponse> {
        let granted = self.claim_genesis(wallet).await?;
        Ok(ReferralClaimResponse {
            star_balance: granted.star_balance,
            referral_code: None,
            referral_applied: false,
        })
    }

    async fn send_events(&self, batch: &EventBatch) -> Result<()> {
        if let Ok(mut n) = self.events.lock() {
            *n += batch.events.len();
        }
        Ok(())
    }
}

async fn validate_session(verbose: bool) -> Vec<TestResult> {
    println!("--- Session ---");
    let mut results = Vec::new();
    let wallet = "EQsimtest";

    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let authority = Arc::new(LocalAuthority::default());
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    let clock_dyn: Arc<dyn Clock> = clock.clone();
    let mut session = match Session::open(
        Catalog::solar_system(),
        store.clone(),
        authority.clone(),
        clock_dyn,
        ClientConfig::default().telemetry,
    ) {
        Ok(s) => s,
        Err(e) => {
            results.push(check("session_open", false, e.to_string()));
            return results;
        }
    };

    session.set_wallet_address(Some(wallet.to_string())).await;
    let genesis = session.claim_genesis().await;
    results.push(check(
        "session_genesis",
        matches!(genesis, Ok(SyncOutcome::Applied(b)) if b == 10.0),
        format!("{:?}", genesis.map_err(|e| e.to_string())),
    ));
    let repeat = session.claim_genesis().await;
    results.push(check(
        "session_genesis_once",
        matches!(repeat, Err(ClientError::AlreadyClaimed { .. })) && session.star_balance() == 10.0,
        format!("balance {}", session.star_balance()),
    ));

    for name in ["Mercury", "Venus", "Earth", "Mars"] {
        clock.advance(MS_PER_HOUR);
        session.discover(name).await;
        session.claim_discovery_reward(name);
    }
    let remote_records = authority.discoveries.lock().map(|n| *n).unwrap_or(0);
    results.push(check(
        "session_discoveries_recorded",
        session.ledger().discovered_count() == 4 && remote_records == 4,
        format!(
            "{} local, {} remote",
            session.ledger().discovered_count(),
            remote_records
        ),
    ));

    authority.set(wallet, 60.0);
    let burn = session.burn_star_for_utility(Utility::VoidJump).await;
    results.push(check(
        "session_burn_overwrites",
        matches!(burn, Ok(SyncOutcome::Applied(b)) if b == 10.0),
        format!("balance {} after VoidJump", session.star_balance()),
    ));

    let flushed = session.flush_telemetry().await;
    let delivered = authority.events.lock().map(|n| *n).unwrap_or(0);
    results.push(check(
        "session_telemetry_delivered",
        matches!(flushed, FlushOutcome::Sent(_)) && delivered > 0,
        format!("{:?}, {} events delivered", flushed, delivered),
    ));

    let reopened = Session::open(
        Catalog::solar_system(),
        store,
        authority,
        clock,
        ClientConfig::default().telemetry,
    );
    let restored = reopened
        .as_ref()
        .map(|s| s.ledger().state() == session.ledger().state())
        .unwrap_or(false);
    results.push(check(
        "session_persisted",
        restored,
        "reopened session matches saved state",
    ));

    if verbose {
        let stats = session.player_stats();
        println!(
            "  discovered {}, earned {}, burned {}, score {}",
            stats.total_discovered,
            stats.total_star_earned,
            stats.total_star_burned,
            stats.immortality_score
        );
    }
    results
}
