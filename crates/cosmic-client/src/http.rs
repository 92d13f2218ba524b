//! HTTP implementation of [`RemoteApi`] over reqwest.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use crate::api::{
    BalanceResponse, BurnRequest, DiscoveryRecord, EventBatch, NftMintRecord, ReferralClaimResponse,
    ReferralStatsResponse, RemoteApi,
};
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

/// REST client for the game API.
///
/// ```rust,no_run
/// use cosmic_client::config::ClientConfig;
/// use cosmic_client::http::HttpApi;
/// use cosmic_client::api::RemoteApi;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let api = HttpApi::new(&ClientConfig::default())?;
/// let balance = api.star_balance("EQabc").await?;
/// println!("{} STAR", balance.star_balance);
/// # Ok(())
/// # }
/// ```
pub struct HttpApi {
    base_url: String,
    client: Client,
}

/// 409 body of the genesis endpoints.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConflictBody {
    star_balance: Option<f64>,
}

impl HttpApi {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            base_url: config.api_base.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: serde::Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.client.post(self.url(path)).json(body).send().await?;
        self.handle_response(response).await
    }

    /// Like `post_json` but only checks the status.
    async fn post_ack<B>(&self, path: &str, body: &B) -> Result<()>
    where
        B: serde::Serialize + ?Sized,
    {
        let response = self.client.post(self.url(path)).json(body).send().await?;
        self.check_status(response).await.map(|_| ())
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.client.get(self.url(path)).send().await?;
        self.handle_response(response).await
    }

    /// Map a 409 on the genesis endpoints to `AlreadyClaimed`.
    async fn genesis_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        if response.status() == StatusCode::CONFLICT {
            let star_balance = response
                .json::<ConflictBody>()
                .await
                .ok()
                .and_then(|b| b.star_balance);
            return Err(ClientError::AlreadyClaimed { star_balance });
        }
        self.handle_response(response).await
    }

    async fn check_status(&self, response: reqwest::Response) -> Result<reqwest::Response> {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Server {
                status,
                message: body,
            });
        }
        Ok(response)
    }

    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let response = self.check_status(response).await?;
        let body = response.json().await?;
        Ok(body)
    }
}

#[async_trait]
impl RemoteApi for HttpApi {
    async fn record_discovery(&self, record: &DiscoveryRecord) -> Result<()> {
        self.post_ack("/discovery/record", record).await
    }

    async fn record_nft_mint(&self, record: &NftMintRecord) -> Result<()> {
        self.post_ack("/nft/mint", record).await
    }

    async fn star_balance(&self, wallet: &str) -> Result<BalanceResponse> {
        self.get_json(&format!(
            "/player/star-balance/{}",
            urlencoding::encode(wallet)
        ))
        .await
    }

    async fn burn_star(&self, request: &BurnRequest) -> Result<BalanceResponse> {
        self.post_json("/player/burn-star", request).await
    }

    async fn claim_genesis(&self, wallet: &str) -> Result<BalanceResponse> {
        let response = self
            .client
            .post(self.url("/player/claim-genesis"))
            .json(&json!({ "walletAddress": wallet }))
            .send()
            .await?;
        self.genesis_response(response).await
    }

    async fn referral_stats(&self, wallet: &str) -> Result<ReferralStatsResponse> {
        self.get_json(&format!(
            "/player/referral-stats/{}",
            urlencoding::encode(wallet)
        ))
        .await
    }

    async fn claim_genesis_with_referral(
        &self,
        wallet: &str,
        referral_code: Option<&str>,
    ) -> Result<ReferralClaimResponse> {
        let response = self
            .client
            .post(self.url("/player/claim-genesis-with-referral"))
            .json(&json!({ "walletAddress": wallet, "referralCode": referral_code }))
            .send()
            .await?;
        self.genesis_response(response).await
    }

    async fn send_events(&self, batch: &EventBatch) -> Result<()> {
        self.post_ack("/analytics/events", batch).await
    }
}
