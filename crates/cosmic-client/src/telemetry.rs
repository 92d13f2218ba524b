//! Gameplay event telemetry.
//!
//! Events are buffered in a [`TelemetryQueue`] and posted to the collector in
//! batches: as soon as `batch_size` events are queued, on every
//! `flush_interval`, and when connectivity comes back. A failed batch is put
//! back at the front of the queue, so the collector may receive duplicates.
//!
//! The queue holds at most `max_queue` events. On overflow the oldest events
//! are dropped and counted in [`TelemetryQueue::dropped`].

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::watch;

use crate::api::{EventBatch, RemoteApi};
use crate::config::TelemetryConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    PlanetDiscovered,
    PlanetMinted,
    PassiveIncomeClaimed,
    DailyLogin,
    ReferralBonusEarned,
    StarBurned,
    NftRefined,
    PrestigeAchieved,
    SmbPurchased,
    SetBonusAchieved,
    PhaseCompleted,
    ImmortalityTierUp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsEvent {
    pub event_type: EventType,
    pub device_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,
    pub timestamp: u64,
    pub data: Value,
}

/// What a call to [`TelemetryQueue::flush`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Nothing queued.
    Idle,
    /// Offline; the queue was left alone.
    Offline,
    Sent(usize),
    /// Delivery failed; this many events went back to the front.
    Requeued(usize),
}

#[derive(Debug)]
struct QueueInner {
    events: VecDeque<AnalyticsEvent>,
    online: bool,
    dropped: u64,
}

#[derive(Debug)]
pub struct TelemetryQueue {
    config: TelemetryConfig,
    inner: Mutex<QueueInner>,
}

impl TelemetryQueue {
    pub fn new(config: TelemetryConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(QueueInner {
                events: VecDeque::new(),
                online: true,
                dropped: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn config(&self) -> &TelemetryConfig {
        &self.config
    }

    /// Enqueue an event. Returns true when a batch is ready to flush.
    pub fn track(&self, event: AnalyticsEvent) -> bool {
        let mut inner = self.lock();
        log::debug!("Tracking {:?} event", event.event_type);
        inner.events.push_back(event);
        self.enforce_cap(&mut inner);
        inner.online && inner.events.len() >= self.config.batch_size
    }

    pub fn len(&self) -> usize {
        self.lock().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Events discarded because the queue was full.
    pub fn dropped(&self) -> u64 {
        self.lock().dropped
    }

    pub fn is_online(&self) -> bool {
        self.lock().online
    }

    /// Update connectivity. Returns true when coming back online with events
    /// waiting, i.e. the caller should flush now.
    pub fn set_online(&self, online: bool) -> bool {
        let mut inner = self.lock();
        let came_back = online && !inner.online;
        inner.online = online;
        came_back && !inner.events.is_empty()
    }

    /// Copy of the queued events, oldest first.
    pub fn pending(&self) -> Vec<AnalyticsEvent> {
        self.lock().events.iter().cloned().collect()
    }

    /// Send everything queued as one batch.
    pub async fn flush(&self, api: &dyn RemoteApi) -> FlushOutcome {
        let events: Vec<AnalyticsEvent> = {
            let mut inner = self.lock();
            if inner.events.is_empty() {
                return FlushOutcome::Idle;
            }
            if !inner.online {
                return FlushOutcome::Offline;
            }
            inner.events.drain(..).collect()
        };

        let count = events.len();
        let batch = EventBatch { events };
        match api.send_events(&batch).await {
            Ok(()) => {
                log::debug!("Flushed {} telemetry events", count);
                FlushOutcome::Sent(count)
            }
            Err(e) => {
                log::error!("Failed to send {} telemetry events: {}", count, e);
                let mut inner = self.lock();
                for event in batch.events.into_iter().rev() {
                    inner.events.push_front(event);
                }
                self.enforce_cap(&mut inner);
                FlushOutcome::Requeued(count)
            }
        }
    }

    /// Flush on every interval tick until `shutdown` flips to true, then
    /// make one last attempt.
    pub async fn run(
        self: Arc<Self>,
        api: Arc<dyn RemoteApi>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut ticker = tokio::time::interval(self.config.flush_interval());
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.flush(api.as_ref()).await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        self.flush(api.as_ref()).await;
        log::debug!("Telemetry loop stopped with {} events pending", self.len());
    }

    fn enforce_cap(&self, inner: &mut QueueInner) {
        let max = self.config.max_queue.max(1);
        let overflow = inner.events.len().saturating_sub(max);
        if overflow == 0 {
            return;
        }
        inner.events.drain(..overflow);
        inner.dropped += overflow as u64;
        log::warn!(
            "Telemetry queue full ({}), dropped {} oldest events ({} total)",
            max,
            overflow,
            inner.dropped
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(n: u64) -> AnalyticsEvent {
        AnalyticsEvent {
            event_type: EventType::PlanetDiscovered,
            device_id: "device_0_test".into(),
            wallet_address: None,
            timestamp: n,
            data: json!({ "n": n }),
        }
    }

    fn queue(batch_size: usize, max_queue: usize) -> TelemetryQueue {
        TelemetryQueue::new(TelemetryConfig {
            batch_size,
            flush_interval_secs: 30,
            max_queue,
        })
    }

    #[test]
    fn test_event_wire_format() {
        let v = serde_json::to_value(event(5)).unwrap();
        assert_eq!(v["eventType"], "planet_discovered");
        assert_eq!(v["deviceId"], "device_0_test");
        assert!(v.get("walletAddress").is_none());
        assert_eq!(
            serde_json::to_value(EventType::ImmortalityTierUp).unwrap(),
            "immortality_tier_up"
        );
    }

    #[test]
    fn test_batch_size_signals_flush() {
        let q = queue(3, 100);
        assert!(!q.track(event(1)));
        assert!(!q.track(event(2)));
        assert!(q.track(event(3)));
    }

    #[test]
    fn test_offline_never_signals() {
        let q = queue(1, 100);
        q.set_online(false);
        assert!(!q.track(event(1)));
        assert!(q.set_online(true));
        assert!(!q.set_online(true));
    }

    #[test]
    fn test_cap_drops_oldest() {
        let q = queue(100, 3);
        for n in 0..5 {
            q.track(event(n));
        }
        let kept: Vec<u64> = q.pending().iter().map(|e| e.timestamp).collect();
        assert_eq!(kept, vec![2, 3, 4]);
        assert_eq!(q.dropped(), 2);
    }
}
