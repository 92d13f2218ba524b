//! Session-level tests against an in-process fake of the game API.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use cosmic_client::api::*;
use cosmic_client::balance::{BalanceState, BalanceSync, SyncOutcome};
use cosmic_client::clock::{Clock, ManualClock};
use cosmic_client::config::TelemetryConfig;
use cosmic_client::error::{ClientError, Result};
use cosmic_client::session::Session;
use cosmic_client::storage::{self, keys, FileStore, KeyValueStore, MemoryStore};
use cosmic_client::telemetry::{AnalyticsEvent, EventType, FlushOutcome, TelemetryQueue};
use cosmic_logic::catalog::Catalog;
use cosmic_logic::constants::timing::{MS_PER_DAY, MS_PER_HOUR};
use cosmic_logic::utilities::Utility;
use serde_json::json;
use tokio::sync::oneshot;

const WALLET: &str = "EQwallet";
const START: u64 = 1_700_000_000_000;

#[derive(Default)]
struct FakeApi {
    fail: AtomicBool,
    balances: Mutex<HashMap<String, f64>>,
    genesis: Mutex<HashSet<String>>,
    discoveries: Mutex<Vec<DiscoveryRecord>>,
    mints: Mutex<Vec<NftMintRecord>>,
    batches: Mutex<Vec<Vec<AnalyticsEvent>>>,
    held_balances: Mutex<VecDeque<oneshot::Receiver<f64>>>,
    balance_calls: AtomicUsize,
}

impl FakeApi {
    fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            Err(ClientError::Transport("connection refused".into()))
        } else {
            Ok(())
        }
    }

    fn set_balance(&self, wallet: &str, balance: f64) {
        self.balances.lock().unwrap().insert(wallet.into(), balance);
    }

    fn balance_of(&self, wallet: &str) -> f64 {
        self.balances.lock().unwrap().get(wallet).copied().unwrap_or(0.0)
    }

    /// The next `star_balance` call waits for the returned sender.
    fn hold_next_balance(&self) -> oneshot::Sender<f64> {
        let (tx, rx) = oneshot::channel();
        self.held_balances.lock().unwrap().push_back(rx);
        tx
    }
}

#[async_trait]
impl RemoteApi for FakeApi {
    async fn record_discovery(&self, record: &DiscoveryRecord) -> Result<()> {
        self.check()?;
        self.discoveries.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn record_nft_mint(&self, record: &NftMintRecord) -> Result<()> {
        self.check()?;
        self.mints.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn star_balance(&self, wallet: &str) -> Result<BalanceResponse> {
        self.check()?;
        self.balance_calls.fetch_add(1, Ordering::SeqCst);
        let held = self.held_balances.lock().unwrap().pop_front();
        let star_balance = match held {
            Some(rx) => rx
                .await
                .map_err(|_| ClientError::Transport("dropped".into()))?,
            None => self.balance_of(wallet),
        };
        Ok(BalanceResponse { star_balance })
    }

    async fn burn_star(&self, request: &BurnRequest) -> Result<BalanceResponse> {
        self.check()?;
        let current = self.balance_of(&request.wallet_address);
        if current < request.amount {
            return Err(ClientError::Server {
                status: 400,
                message: "Insufficient STAR".into(),
            });
        }
        let star_balance = current - request.amount;
        self.set_balance(&request.wallet_address, star_balance);
        Ok(BalanceResponse { star_balance })
    }

    async fn claim_genesis(&self, wallet: &str) -> Result<BalanceResponse> {
        self.check()?;
        if !self.genesis.lock().unwrap().insert(wallet.to_string()) {
            return Err(ClientError::AlreadyClaimed {
                star_balance: Some(self.balance_of(wallet)),
            });
        }
        self.set_balance(wallet, 10.0);
        Ok(BalanceResponse { star_balance: 10.0 })
    }

    async fn referral_stats(&self, _wallet: &str) -> Result<ReferralStatsResponse> {
        self.check()?;
        Ok(ReferralStatsResponse {
            referral_code: Some("CV-7Q2X".into()),
            referral_count: 2,
            bonus_earned: 10.0,
        })
    }

    async fn claim_genesis_with_referral(
        &self,
        wallet: &str,
        referral_code: Option<&str>,
    ) -> Result<ReferralClaimResponse> {
        let granted = self.claim_genesis(wallet).await?;
        Ok(ReferralClaimResponse {
            star_balance: granted.star_balance,
            referral_code: Some("CV-NEW1".into()),
            referral_applied: referral_code.is_some(),
        })
    }

    async fn send_events(&self, batch: &EventBatch) -> Result<()> {
        self.check()?;
        self.batches.lock().unwrap().push(batch.events.clone());
        Ok(())
    }
}

struct Harness {
    session: Session,
    api: Arc<FakeApi>,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<ManualClock>,
}

fn quiet_telemetry() -> TelemetryConfig {
    TelemetryConfig {
        batch_size: 100,
        ..TelemetryConfig::default()
    }
}

fn open_with(store: Arc<dyn KeyValueStore>, api: Arc<FakeApi>, clock: Arc<ManualClock>) -> Session {
    let clock_dyn: Arc<dyn Clock> = clock;
    Session::open(
        Catalog::solar_system(),
        store,
        api,
        clock_dyn,
        quiet_telemetry(),
    )
    .unwrap()
}

fn harness() -> Harness {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let api = Arc::new(FakeApi::default());
    let clock = Arc::new(ManualClock::new(START));
    let session = open_with(store.clone(), api.clone(), clock.clone());
    Harness {
        session,
        api,
        store,
        clock,
    }
}

fn planets(events: &[AnalyticsEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| e.data.get("planet").and_then(|p| p.as_str()).map(String::from))
        .collect()
}

// ============================================================================
// Progression
// ============================================================================

#[tokio::test]
async fn test_end_to_end_discover_then_claim() {
    let mut h = harness();
    assert!(h.session.discover("Mercury").await.is_some());
    assert!(h.session.claim_discovery_reward("Mercury"));

    let state = h.session.ledger().state();
    assert_eq!(state.total_tokens, 10.0);
    assert_eq!(state.discovered_planets.len(), 1);
    assert!(state.completed_challenges.contains("Mercury"));
}

#[tokio::test]
async fn test_out_of_order_discovery_changes_nothing() {
    let mut h = harness();
    assert!(h.session.discover("Venus").await.is_none());
    assert!(h.session.ledger().state().discovered_planets.is_empty());
    assert!(h.session.telemetry().is_empty());
}

#[tokio::test]
async fn test_remote_discovery_failure_keeps_local_commit() {
    let mut h = harness();
    h.api.set_failing(true);
    assert_eq!(
        h.session.set_wallet_address(Some(WALLET.into())).await,
        Some(SyncOutcome::Failed)
    );

    assert!(h.session.discover("Mercury").await.is_some());
    assert_eq!(h.session.ledger().discovered_count(), 1);
    assert!(h.api.discoveries.lock().unwrap().is_empty());

    // The commit was saved before the remote call.
    let reopened = open_with(h.store.clone(), h.api.clone(), h.clock.clone());
    assert_eq!(reopened.ledger().discovered_count(), 1);
    assert_eq!(reopened.ledger().wallet_address(), Some(WALLET));
}

#[tokio::test]
async fn test_discovery_is_recorded_remotely_with_wallet() {
    let mut h = harness();
    h.session.discover("Mercury").await;
    assert!(h.api.discoveries.lock().unwrap().is_empty());

    h.session.set_wallet_address(Some(WALLET.into())).await;
    h.session.discover("Venus").await;
    let records = h.api.discoveries.lock().unwrap().clone();
    assert_eq!(
        records,
        vec![DiscoveryRecord {
            wallet_address: WALLET.into(),
            planet_name: "Venus".into(),
            discovery_order: 2,
            tokens_earned: 15.0,
        }]
    );
}

#[tokio::test]
async fn test_mint_is_recorded_and_tracked() {
    let mut h = harness();
    h.session.set_wallet_address(Some(WALLET.into())).await;
    assert!(!h.session.mark_nft_minted("Mercury", "0xabc").await);

    h.session.discover("Mercury").await;
    assert!(h.session.mark_nft_minted("Mercury", "0xabc").await);
    assert!(!h.session.mark_nft_minted("Mercury", "0xabc").await);

    assert_eq!(h.api.mints.lock().unwrap().len(), 1);
    assert_eq!(h.session.ledger().state().minted_nft_count, 1);
    let minted: Vec<_> = h
        .session
        .telemetry()
        .pending()
        .into_iter()
        .filter(|e| e.event_type == EventType::PlanetMinted)
        .collect();
    assert_eq!(minted.len(), 1);
    assert_eq!(minted[0].wallet_address.as_deref(), Some(WALLET));
}

#[tokio::test]
async fn test_time_driven_rewards_follow_clock() {
    let mut h = harness();

    let reward = h.session.claim_daily_login().await.unwrap();
    assert_eq!(reward.streak, 1);
    assert!(h.session.claim_daily_login().await.is_none());

    h.clock.advance(MS_PER_DAY + MS_PER_HOUR);
    assert_eq!(h.session.claim_daily_login().await.unwrap().streak, 2);

    // 25 whole hours since open.
    assert_eq!(h.session.update_passive_tokens().await.whole_hours, 25);

    // Two half-hour gaps accrue nothing.
    let before = h.session.ledger().state().passive_tokens_generated;
    h.clock.advance(MS_PER_HOUR / 2);
    h.session.update_passive_tokens().await;
    h.clock.advance(MS_PER_HOUR / 2);
    h.session.update_passive_tokens().await;
    assert_eq!(h.session.ledger().state().passive_tokens_generated, before);
    assert_eq!(
        h.session.ledger().state().last_passive_token_update,
        h.clock.now_ms()
    );
}

// ============================================================================
// Balance authority
// ============================================================================

#[tokio::test]
async fn test_balance_overwrite_law() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    storage::save_state(
        store.as_ref(),
        keys::BALANCE,
        1,
        &BalanceState {
            star_balance: 100.0,
            wallet_address: Some(WALLET.into()),
            ..BalanceState::default()
        },
    )
    .unwrap();
    let api = Arc::new(FakeApi::default());
    api.set_balance(WALLET, 42.0);
    let mut session = open_with(store, api.clone(), Arc::new(ManualClock::new(START)));
    assert_eq!(session.star_balance(), 100.0);

    assert_eq!(
        session.set_wallet_address(Some(WALLET.into())).await,
        Some(SyncOutcome::Applied(42.0))
    );
    assert_eq!(session.star_balance(), 42.0);

    api.set_failing(true);
    assert_eq!(session.load_balance().await, Some(SyncOutcome::Failed));
    assert_eq!(session.star_balance(), 42.0);
}

#[tokio::test]
async fn test_stale_balance_response_is_dropped() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let api = Arc::new(FakeApi::default());
    let api_dyn: Arc<dyn RemoteApi> = api.clone();
    let sync = Arc::new(BalanceSync::new(store, api_dyn));
    sync.set_wallet_address(Some(WALLET.into())).await;

    let first = api.hold_next_balance();
    let second = api.hold_next_balance();
    let a = tokio::spawn({
        let sync = sync.clone();
        async move { sync.load_balance(WALLET).await }
    });
    let b = tokio::spawn({
        let sync = sync.clone();
        async move { sync.load_balance(WALLET).await }
    });
    while api.balance_calls.load(Ordering::SeqCst) < 3 {
        tokio::task::yield_now().await;
    }

    // The newer request answers first.
    second.send(2.0).unwrap();
    while sync.star_balance() != 2.0 {
        tokio::task::yield_now().await;
    }
    first.send(1.0).unwrap();

    let mut outcomes = vec![a.await.unwrap(), b.await.unwrap()];
    outcomes.sort_by_key(|o| matches!(o, SyncOutcome::Stale));
    assert_eq!(outcomes, vec![SyncOutcome::Applied(2.0), SyncOutcome::Stale]);
    assert_eq!(sync.star_balance(), 2.0);
}

#[tokio::test]
async fn test_genesis_and_burn() {
    let mut h = harness();
    assert!(matches!(
        h.session.claim_genesis().await,
        Err(ClientError::InvalidRequest(_))
    ));

    h.session.set_wallet_address(Some(WALLET.into())).await;
    assert_eq!(
        h.session.claim_genesis().await.unwrap(),
        SyncOutcome::Applied(10.0)
    );
    assert!(h.session.balance().genesis_claimed());
    assert!(matches!(
        h.session.claim_genesis().await,
        Err(ClientError::AlreadyClaimed { star_balance: Some(b) }) if b == 10.0
    ));
    assert_eq!(h.session.star_balance(), 10.0);

    // Server refuses; nothing is decremented locally.
    assert!(h
        .session
        .burn_star_for_utility(Utility::CosmicBoost)
        .await
        .is_err());
    assert_eq!(h.session.star_balance(), 10.0);

    h.api.set_balance(WALLET, 100.0);
    assert_eq!(
        h.session
            .burn_star_for_utility(Utility::CosmicBoost)
            .await
            .unwrap(),
        SyncOutcome::Applied(75.0)
    );
    assert_eq!(h.session.player_stats().total_star_burned, 25.0);
    assert!(h
        .session
        .telemetry()
        .pending()
        .iter()
        .any(|e| e.event_type == EventType::StarBurned && e.data["burnType"] == "cosmicBoost"));
}

#[tokio::test]
async fn test_non_positive_burn_is_refused_locally() {
    let h = harness();
    let api_dyn: Arc<dyn RemoteApi> = h.api.clone();
    let sync = BalanceSync::new(h.store.clone(), api_dyn);
    assert!(matches!(
        sync.burn_star_for_utility(WALLET, 0.0, "voidJump").await,
        Err(ClientError::InvalidRequest(_))
    ));
    assert!(matches!(
        sync.burn_star_for_utility(WALLET, f64::NAN, "voidJump").await,
        Err(ClientError::InvalidRequest(_))
    ));
}

#[tokio::test]
async fn test_wallet_connect_loads_referral_and_claims_with_code() {
    let mut h = harness();
    h.session.set_wallet_address(Some(WALLET.into())).await;
    let referral = h.session.referral().state();
    assert_eq!(referral.referral_code.as_deref(), Some("CV-7Q2X"));
    assert_eq!(referral.referral_stats.count, 2);
    assert_eq!(h.session.player_stats().referral_count, 2);

    let response = h
        .session
        .claim_genesis_with_referral(Some("CV-FRIEND"))
        .await
        .unwrap();
    assert!(response.referral_applied);
    assert_eq!(h.session.referral().referral_code().as_deref(), Some("CV-NEW1"));
    assert_eq!(h.session.star_balance(), 10.0);
}

// ============================================================================
// Telemetry
// ============================================================================

#[tokio::test]
async fn test_failed_flush_requeues_at_front() {
    let mut h = harness();
    h.api.set_failing(true);
    h.session.discover("Mercury").await;
    h.session.discover("Venus").await;
    assert_eq!(h.session.flush_telemetry().await, FlushOutcome::Requeued(2));

    h.session.discover("Earth").await;
    assert_eq!(
        planets(&h.session.telemetry().pending()),
        vec!["Mercury", "Venus", "Earth"]
    );

    h.api.set_failing(false);
    assert_eq!(h.session.flush_telemetry().await, FlushOutcome::Sent(3));
    assert!(h.session.telemetry().is_empty());
    assert_eq!(h.api.batches.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_queue_cap_under_persistent_failure() {
    let api = FakeApi::default();
    api.set_failing(true);
    let queue = TelemetryQueue::new(TelemetryConfig {
        batch_size: 100,
        flush_interval_secs: 30,
        max_queue: 3,
    });
    let event = |n: u64| AnalyticsEvent {
        event_type: EventType::DailyLogin,
        device_id: "device_test".into(),
        wallet_address: None,
        timestamp: n,
        data: json!({ "streak": n }),
    };

    queue.track(event(1));
    queue.track(event(2));
    assert_eq!(queue.flush(&api).await, FlushOutcome::Requeued(2));
    queue.track(event(3));
    queue.track(event(4));

    let kept: Vec<u64> = queue.pending().iter().map(|e| e.timestamp).collect();
    assert_eq!(kept, vec![2, 3, 4]);
    assert_eq!(queue.dropped(), 1);
}

#[tokio::test]
async fn test_batch_size_triggers_flush() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let api = Arc::new(FakeApi::default());
    let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(START));
    let mut session = Session::open(
        Catalog::solar_system(),
        store,
        api.clone(),
        clock,
        TelemetryConfig {
            batch_size: 2,
            ..TelemetryConfig::default()
        },
    )
    .unwrap();

    session.discover("Mercury").await;
    assert!(api.batches.lock().unwrap().is_empty());
    session.discover("Venus").await;
    let batches = api.batches.lock().unwrap().clone();
    assert_eq!(batches.len(), 1);
    assert_eq!(planets(&batches[0]), vec!["Mercury", "Venus"]);
}

#[tokio::test]
async fn test_offline_queue_flushes_on_reconnect() {
    let mut h = harness();
    assert_eq!(h.session.set_online(false).await, None);
    h.session.discover("Mercury").await;
    assert_eq!(h.session.flush_telemetry().await, FlushOutcome::Offline);
    assert_eq!(h.session.telemetry().len(), 1);

    assert_eq!(h.session.set_online(true).await, Some(FlushOutcome::Sent(1)));
    assert!(h.session.telemetry().is_empty());
}

#[tokio::test]
async fn test_telemetry_task_flushes_on_shutdown() {
    let mut h = harness();
    h.session.discover("Mercury").await;
    let (tx, rx) = tokio::sync::watch::channel(false);
    let task = tokio::spawn(h.session.telemetry_task(rx));
    tx.send(true).unwrap();
    task.await.unwrap();
    assert!(h.session.telemetry().is_empty());
    assert_eq!(h.api.batches.lock().unwrap().len(), 1);
}

// ============================================================================
// Persistence
// ============================================================================

#[tokio::test]
async fn test_file_store_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let api = Arc::new(FakeApi::default());
    let clock = Arc::new(ManualClock::new(START));

    let (device, state) = {
        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(dir.path()).unwrap());
        let mut session = open_with(store, api.clone(), clock.clone());
        session.discover("Mercury").await;
        session.discover("Venus").await;
        session.claim_discovery_reward("Venus");
        (session.device().clone(), session.ledger().state().clone())
    };

    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(dir.path()).unwrap());
    let session = open_with(store, api, clock);
    assert_eq!(session.device(), &device);
    assert_eq!(session.ledger().state(), &state);
}

#[tokio::test]
async fn test_tampered_store_is_healed_on_open() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    store
        .set(
            keys::PROGRESSION,
            json!({
                "state": {
                    "discoveredPlanets": [
                        { "planetName": "Mercury", "timestamp": 1, "tokensEarned": 10 },
                        { "planetName": "Earth", "timestamp": 2, "tokensEarned": 20 },
                        { "planetName": "Venus", "timestamp": 3, "tokensEarned": 15 }
                    ],
                    "totalTokens": 10
                },
                "version": 1
            })
            .to_string()
            .as_bytes(),
        )
        .unwrap();

    let session = open_with(
        store,
        Arc::new(FakeApi::default()),
        Arc::new(ManualClock::new(START)),
    );
    let names: Vec<_> = session
        .ledger()
        .state()
        .discovered_planets
        .iter()
        .map(|d| d.planet_name.as_str())
        .collect();
    assert_eq!(names, vec!["Mercury"]);
}

#[tokio::test]
async fn test_snapshot_export_import() {
    let mut h = harness();
    h.session.discover("Mercury").await;
    h.session.claim_discovery_reward("Mercury");

    let mut buf = Vec::new();
    h.session.export_snapshot(&mut buf).unwrap();
    h.session.reset_progress();
    assert_eq!(h.session.ledger().discovered_count(), 0);

    h.session.import_snapshot(buf.as_slice()).unwrap();
    assert_eq!(h.session.ledger().discovered_count(), 1);
    assert_eq!(h.session.ledger().state().total_tokens, 10.0);
    assert!(matches!(
        h.session.import_snapshot(&b"junk"[..]),
        Err(ClientError::Snapshot(_))
    ));
}
