//! Currency pair identity.

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

use crate::error::DomainError;

/// Ordered pair of ISO codes: the quoted `currency` priced in `base`.
///
/// Construction only checks the textual shape. Membership in the ISO
/// whitelist is checked separately by [`IsoWhitelist`](super::IsoWhitelist),
/// because the whitelist is only known at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
pub struct CurrencyPair {
    /// Quoted currency
    #[schema(example = "EUR")]
    pub currency: String,
    /// Base currency
    #[schema(example = "USD")]
    pub base: String,
}

impl CurrencyPair {
    pub fn new(currency: impl Into<String>, base: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
            base: base.into(),
        }
    }

    /// Parses the `CUR/BASE` form used by the query-string API.
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        let mut parts = s.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(currency), Some(base), None) if !currency.is_empty() && !base.is_empty() => {
                Ok(Self::new(currency, base))
            }
            _ => Err(DomainError::InvalidPairFormat(s.to_string())),
        }
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.currency, self.base)
    }
}

impl std::str::FromStr for CurrencyPair {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
