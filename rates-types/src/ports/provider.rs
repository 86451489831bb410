//! Rate provider port.
//!
//! This trait defines the interface for upstream exchange rate sources.
//! Implementations can be HTTP clients, fixed tables, mocks, etc.

use rust_decimal::Decimal;

use crate::domain::CurrencyPair;
use crate::error::ProviderError;

/// Port trait for upstream rate providers.
#[async_trait::async_trait]
pub trait RateProvider: Send + Sync + 'static {
    /// Fetches the current rate of `pair.currency` expressed in `pair.base`.
    ///
    /// Implementations must reject responses quoted in a different base or
    /// missing the requested currency with [`ProviderError::UnexpectedResponse`].
    async fn fetch_rate(&self, pair: &CurrencyPair) -> Result<Decimal, ProviderError>;

    /// Lists every ISO code the provider can quote.
    async fn supported_codes(&self) -> Result<Vec<String>, ProviderError>;
}
