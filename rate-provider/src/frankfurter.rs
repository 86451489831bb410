//! HTTP client for a Frankfurter-compatible rates API.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, instrument};

use rates_types::{CurrencyPair, ProviderError, RateProvider};

/// Upstream connection settings.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub base_url: String,
    /// Per-request timeout; calls are never retried.
    pub timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.frankfurter.app".to_string(),
            timeout: Duration::from_secs(5),
        }
    }
}

/// `GET /latest?from=BASE&to=CUR`
#[derive(Debug, Deserialize)]
struct RateResponse {
    base: String,
    #[serde(default)]
    rates: HashMap<String, Decimal>,
}

/// `GET /currencies`, either a plain list of codes or a code → name map.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SymbolsResponse {
    Codes(Vec<String>),
    Named(BTreeMap<String, String>),
}

impl SymbolsResponse {
    fn into_codes(self) -> Vec<String> {
        match self {
            SymbolsResponse::Codes(codes) => codes,
            SymbolsResponse::Named(named) => named.into_keys().collect(),
        }
    }
}

/// Checks the response is quoted in the requested base and carries the
/// requested currency.
fn extract_rate(resp: RateResponse, pair: &CurrencyPair) -> Result<Decimal, ProviderError> {
    if resp.base != pair.base {
        return Err(ProviderError::UnexpectedResponse(format!(
            "asked for base {}, got {}",
            pair.base, resp.base
        )));
    }
    resp.rates.get(&pair.currency).copied().ok_or_else(|| {
        ProviderError::UnexpectedResponse(format!("no rate for {} in response", pair.currency))
    })
}

fn transport_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout
    } else {
        ProviderError::Unavailable(err.to_string())
    }
}

/// Frankfurter API client.
pub struct FrankfurterProvider {
    base_url: String,
    http: Client,
}

impl FrankfurterProvider {
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    async fn get(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<reqwest::Response, ProviderError> {
        let resp = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .query(query)
            .send()
            .await
            .map_err(transport_error)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ProviderError::Unavailable(format!("HTTP {}", status)));
        }
        Ok(resp)
    }
}

#[async_trait]
impl RateProvider for FrankfurterProvider {
    #[instrument(skip(self), fields(pair = %pair))]
    async fn fetch_rate(&self, pair: &CurrencyPair) -> Result<Decimal, ProviderError> {
        let resp: RateResponse = self
            .get("/latest", &[("from", &pair.base), ("to", &pair.currency)])
            .await?
            .json()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout
                } else {
                    ProviderError::UnexpectedResponse(e.to_string())
                }
            })?;

        let rate = extract_rate(resp, pair)?;
        debug!(%rate, "Fetched rate from provider");
        Ok(rate)
    }

    #[instrument(skip(self))]
    async fn supported_codes(&self) -> Result<Vec<String>, ProviderError> {
        let symbols: SymbolsResponse = self
            .get("/currencies", &[])
            .await?
            .json()
            .await
            .map_err(|e| ProviderError::UnexpectedResponse(e.to_string()))?;
        Ok(symbols.into_codes())
    }
}
