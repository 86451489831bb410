//! # Rates Client SDK
//!
//! A typed Rust client for the FX Rates API.
//!
//! Lookups that the server answers with `204 No Content` come back as `None`.

use reqwest::{Client, RequestBuilder, StatusCode};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;

use rates_types::{
    ConfirmedRate, CurrencyPair, DeleteResponse, HistoryPeriod, LatestRate, RateId,
    RateWithChange, StageResponse, TechState,
};

/// Error type for client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unexpected empty response from {0}")]
    Empty(String),
}

/// Rates API client.
pub struct RatesClient {
    base_url: String,
    http: Client,
}

impl RatesClient {
    /// Creates a new client.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    /// Checks if the API is healthy.
    pub async fn health(&self) -> Result<bool, ClientError> {
        let resp = self.http.get(self.url("/health")).send().await?;
        Ok(resp.status().is_success())
    }

    pub async fn tech_state(&self) -> Result<TechState, ClientError> {
        self.required("/tech/state", self.http.get(self.url("/tech/state")))
            .await
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Staging queue
    // ─────────────────────────────────────────────────────────────────────────────

    /// Asks the server to fetch and stage the current rate of a pair.
    pub async fn stage(&self, pair: &CurrencyPair) -> Result<RateId, ClientError> {
        let req = self
            .http
            .put(self.url("/api/v1"))
            .query(&[("rate", pair.to_string())]);
        let resp: StageResponse = self.required("/api/v1", req).await?;
        Ok(resp.rate_id)
    }

    /// Confirms one staged quote. `None` when the queue is empty.
    pub async fn confirm(&self) -> Result<Option<ConfirmedRate>, ClientError> {
        self.send(self.http.post(self.url("/api/v1/confirm"))).await
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Rates
    // ─────────────────────────────────────────────────────────────────────────────

    pub async fn get_by_id(&self, id: RateId) -> Result<Option<ConfirmedRate>, ClientError> {
        let path = format!("/api/v1/by-id/{}", id);
        self.send(self.http.get(self.url(&path))).await
    }

    pub async fn latest(&self, pair: &CurrencyPair) -> Result<Option<LatestRate>, ClientError> {
        let req = self
            .http
            .get(self.url("/api/v1/last"))
            .query(&[("rate", pair.to_string())]);
        self.send(req).await
    }

    pub async fn all_latest(&self) -> Result<Vec<RateWithChange>, ClientError> {
        self.required("/api/v1/all-last", self.http.get(self.url("/api/v1/all-last")))
            .await
    }

    /// Overrides the rate of a pair.
    pub async fn update_rate(
        &self,
        pair: &CurrencyPair,
        rate: Decimal,
    ) -> Result<ConfirmedRate, ClientError> {
        let req = self.http.patch(self.url("/api/v1/update")).query(&[
            ("currency", pair.currency.clone()),
            ("base", pair.base.clone()),
            ("rate", rate.to_string()),
        ]);
        self.required("/api/v1/update", req).await
    }

    /// Deletes the history of a pair. Returns the number of rows removed.
    pub async fn delete_pair(&self, pair: &CurrencyPair) -> Result<u64, ClientError> {
        let path = format!("/api/v1/delete/{}/{}", pair.currency, pair.base);
        let resp: DeleteResponse = self.required(&path, self.http.delete(self.url(&path))).await?;
        Ok(resp.deleted)
    }

    pub async fn history(
        &self,
        pair: &CurrencyPair,
        period: HistoryPeriod,
    ) -> Result<Vec<ConfirmedRate>, ClientError> {
        let req = self.http.get(self.url("/api/v1/history")).query(&[
            ("currency", pair.currency.clone()),
            ("base", pair.base.clone()),
            ("period", period.to_string()),
        ]);
        self.required("/api/v1/history", req).await
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Transport
    // ─────────────────────────────────────────────────────────────────────────────

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn required<T: DeserializeOwned>(
        &self,
        path: &str,
        req: RequestBuilder,
    ) -> Result<T, ClientError> {
        self.send(req)
            .await?
            .ok_or_else(|| ClientError::Empty(path.to_string()))
    }

    async fn send<T: DeserializeOwned>(
        &self,
        req: RequestBuilder,
    ) -> Result<Option<T>, ClientError> {
        let resp = req.send().await?;
        self.handle_response(resp).await
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<Option<T>, ClientError> {
        let status = resp.status();
        if status == StatusCode::NO_CONTENT {
            Ok(None)
        } else if status.is_success() {
            let body = resp.text().await?;
            Ok(Some(serde_json::from_str(&body)?))
        } else {
            let body = resp.text().await.unwrap_or_default();
            Err(ClientError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            })
        }
    }
}

/// The `error` field of a JSON error body, or the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
        .unwrap_or_else(|| body.to_string())
}
