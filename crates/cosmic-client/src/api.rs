//! Remote API seam: wire types and the [`RemoteApi`] trait.
//!
//! [`crate::http::HttpApi`] is the production implementation. Tests and the
//! simtest harness plug in in-process fakes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::telemetry::AnalyticsEvent;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryRecord {
    pub wallet_address: String,
    pub planet_name: String,
    pub discovery_order: u32,
    pub tokens_earned: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NftMintRecord {
    pub wallet_address: String,
    pub planet_name: String,
    pub discovery_order: u32,
    pub transaction_hash: String,
}

/// Body of every endpoint that reports a post-operation balance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    pub star_balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BurnRequest {
    pub wallet_address: String,
    pub amount: f64,
    pub utility: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralStatsResponse {
    #[serde(default)]
    pub referral_code: Option<String>,
    #[serde(default, alias = "count")]
    pub referral_count: u32,
    #[serde(default)]
    pub bonus_earned: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralClaimResponse {
    pub star_balance: f64,
    #[serde(default)]
    pub referral_code: Option<String>,
    #[serde(default)]
    pub referral_applied: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventBatch {
    pub events: Vec<AnalyticsEvent>,
}

/// Every remote call the client makes.
///
/// Responses that the client ignores beyond success/failure return `()`.
#[async_trait]
pub trait RemoteApi: Send + Sync {
    async fn record_discovery(&self, record: &DiscoveryRecord) -> Result<()>;

    async fn record_nft_mint(&self, record: &NftMintRecord) -> Result<()>;

    async fn star_balance(&self, wallet: &str) -> Result<BalanceResponse>;

    async fn burn_star(&self, request: &BurnRequest) -> Result<BalanceResponse>;

    /// One-time genesis grant. Fails with `ClientError::AlreadyClaimed` on
    /// a repeat claim.
    async fn claim_genesis(&self, wallet: &str) -> Result<BalanceResponse>;

    async fn referral_stats(&self, wallet: &str) -> Result<ReferralStatsResponse>;

    async fn claim_genesis_with_referral(
        &self,
        wallet: &str,
        referral_code: Option<&str>,
    ) -> Result<ReferralClaimResponse>;

    /// Delivery is at-least-once; the collector may see duplicates.
    async fn send_events(&self, batch: &EventBatch) -> Result<()>;
}
