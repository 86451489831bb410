//! In-memory provider with a fixed rate table.

use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;
use rust_decimal::Decimal;

use rates_types::{CurrencyPair, ProviderError, RateProvider};

/// Value of one unit of each currency in USD, used to derive cross rates
/// for [`FixedRateProvider::development`].
const DEVELOPMENT_USD_VALUES: &[(&str, Decimal)] = &[
    ("USD", Decimal::from_parts(1, 0, 0, false, 0)),
    ("EUR", Decimal::from_parts(1087, 0, 0, false, 3)),
    ("GBP", Decimal::from_parts(1266, 0, 0, false, 3)),
    ("INR", Decimal::from_parts(1203, 0, 0, false, 5)),
    ("JPY", Decimal::from_parts(67, 0, 0, false, 4)),
];

/// Provider answering from a table instead of the network.
///
/// Pairs missing from the table fail the same way a malformed upstream
/// response would, which makes it useful for exercising partial failures.
#[derive(Debug, Default)]
pub struct FixedRateProvider {
    rates: RwLock<HashMap<CurrencyPair, Decimal>>,
    extra_codes: BTreeSet<String>,
}

impl FixedRateProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cross rates between USD, EUR, GBP, INR and JPY.
    pub fn development() -> Self {
        let provider = Self::new();
        for (currency, currency_usd) in DEVELOPMENT_USD_VALUES {
            for (base, base_usd) in DEVELOPMENT_USD_VALUES {
                if currency == base {
                    continue;
                }
                // units of `currency` bought by one unit of `base`
                let rate = (*base_usd / *currency_usd).round_dp(6);
                provider.set_rate(CurrencyPair::new(*currency, *base), rate);
            }
        }
        provider
    }

    pub fn with_rate(self, pair: CurrencyPair, rate: Decimal) -> Self {
        self.set_rate(pair, rate);
        self
    }

    /// Advertises a code in `supported_codes` without quoting any pair for it.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.extra_codes.insert(code.into());
        self
    }

    pub fn set_rate(&self, pair: CurrencyPair, rate: Decimal) {
        self.write().insert(pair, rate);
    }

    pub fn remove_rate(&self, pair: &CurrencyPair) {
        self.write().remove(pair);
    }

    pub fn has_rate(&self, pair: &CurrencyPair) -> bool {
        self.read().contains_key(pair)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<CurrencyPair, Decimal>> {
        self.rates.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<CurrencyPair, Decimal>> {
        self.rates.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl RateProvider for FixedRateProvider {
    async fn fetch_rate(&self, pair: &CurrencyPair) -> Result<Decimal, ProviderError> {
        self.read()
            .get(pair)
            .copied()
            .ok_or_else(|| ProviderError::UnexpectedResponse(format!("no rate for {}", pair)))
    }

    async fn supported_codes(&self) -> Result<Vec<String>, ProviderError> {
        let mut codes = self.extra_codes.clone();
        for pair in self.read().keys() {
            codes.insert(pair.currency.clone());
            codes.insert(pair.base.clone());
        }
        Ok(codes.into_iter().collect())
    }
}
