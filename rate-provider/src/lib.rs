//! # Rate Provider
//!
//! Adapters implementing the `RateProvider` port.
//!
//! - [`FrankfurterProvider`] talks to a Frankfurter-compatible HTTP API
//!   (`/latest?from=BASE&to=CUR` and `/currencies`).
//! - [`FixedRateProvider`] serves rates from an in-memory table, for local
//!   development and tests.
//!
//! # Example
//! ```
//! use rate_provider::FixedRateProvider;
//! use rates_types::CurrencyPair;
//!
//! let provider = FixedRateProvider::development();
//! let pair = CurrencyPair::new("EUR", "USD");
//! assert!(provider.has_rate(&pair));
//! ```

mod fixed;
mod frankfurter;

use async_trait::async_trait;
use rust_decimal::Decimal;

use rates_types::{CurrencyPair, ProviderError, RateProvider};

pub use fixed::FixedRateProvider;
pub use frankfurter::{FrankfurterProvider, ProviderConfig};

/// URL scheme that selects the fixed development table instead of HTTP.
pub const FIXED_PROVIDER_URL: &str = "fixed://";

/// Provider selected at startup from configuration.
pub enum Provider {
    Http(FrankfurterProvider),
    Fixed(FixedRateProvider),
}

/// Build a provider from its configuration.
///
/// `fixed://` selects [`FixedRateProvider::development`]; anything else is
/// treated as the base URL of a Frankfurter-compatible API.
pub fn build_provider(config: ProviderConfig) -> Result<Provider, ProviderError> {
    if config.base_url.starts_with(FIXED_PROVIDER_URL) {
        tracing::warn!("Using fixed development rates, no upstream calls will be made");
        return Ok(Provider::Fixed(FixedRateProvider::development()));
    }
    Ok(Provider::Http(FrankfurterProvider::new(config)?))
}

#[async_trait]
impl RateProvider for Provider {
    async fn fetch_rate(&self, pair: &CurrencyPair) -> Result<Decimal, ProviderError> {
        match self {
            Provider::Http(p) => p.fetch_rate(pair).await,
            Provider::Fixed(p) => p.fetch_rate(pair).await,
        }
    }

    async fn supported_codes(&self) -> Result<Vec<String>, ProviderError> {
        match self {
            Provider::Http(p) => p.supported_codes().await,
            Provider::Fixed(p) => p.supported_codes().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_fixed_provider() {
        let provider = build_provider(ProviderConfig {
            base_url: "fixed://".into(),
            ..ProviderConfig::default()
        })
        .unwrap();
        assert!(matches!(provider, Provider::Fixed(_)));
    }

    #[test]
    fn test_build_http_provider() {
        let provider = build_provider(ProviderConfig::default()).unwrap();
        assert!(matches!(provider, Provider::Http(_)));
    }
}
