//! Staged quotes and the confirmed rate history.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::pair::CurrencyPair;

/// Unique identifier shared by a staged quote and the history row it becomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct RateId(Uuid);

impl RateId {
    /// Creates a new random RateId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a RateId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Returns the UUID value.
    pub fn into_uuid(self) -> Uuid {
        self.0
    }
}

impl Default for RateId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RateId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A freshly fetched quote waiting in the staging queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagedQuote {
    pub id: RateId,
    pub currency: String,
    pub base: String,
    pub rate: Decimal,
}

impl StagedQuote {
    pub fn new(pair: &CurrencyPair, rate: Decimal) -> Self {
        Self {
            id: RateId::new(),
            currency: pair.currency.clone(),
            base: pair.base.clone(),
            rate,
        }
    }

    pub fn pair(&self) -> CurrencyPair {
        CurrencyPair::new(&self.currency, &self.base)
    }
}

/// A row of the append-only rate history.
///
/// Rows are immutable once written; they only disappear when the whole
/// pair is deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ConfirmedRate {
    pub id: RateId,
    #[schema(example = "EUR")]
    pub currency: String,
    #[schema(example = "USD")]
    pub base: String,
    #[schema(value_type = f64, example = 1.08)]
    pub rate: Decimal,
    /// Server-assigned write time
    pub updated_at: DateTime<Utc>,
}

impl ConfirmedRate {
    /// Builds the history row a staged quote is promoted into.
    pub fn from_staged(quote: StagedQuote, updated_at: DateTime<Utc>) -> Self {
        Self {
            id: quote.id,
            currency: quote.currency,
            base: quote.base,
            rate: quote.rate,
            updated_at,
        }
    }

    /// Builds a row for the direct write path (override or auto-refresh).
    pub fn direct(pair: &CurrencyPair, rate: Decimal) -> Self {
        Self {
            id: RateId::new(),
            currency: pair.currency.clone(),
            base: pair.base.clone(),
            rate,
            updated_at: Utc::now(),
        }
    }

    pub fn pair(&self) -> CurrencyPair {
        CurrencyPair::new(&self.currency, &self.base)
    }
}

/// Most recent rate for a pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LatestRate {
    #[schema(example = "EUR")]
    pub currency: String,
    #[schema(example = "USD")]
    pub base: String,
    #[schema(value_type = f64, example = 1.08)]
    pub rate: Decimal,
    pub updated_at: DateTime<Utc>,
}

impl From<ConfirmedRate> for LatestRate {
    fn from(row: ConfirmedRate) -> Self {
        Self {
            currency: row.currency,
            base: row.base,
            rate: row.rate,
            updated_at: row.updated_at,
        }
    }
}

/// Latest rate plus its movement against the previous one, in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RateWithChange {
    #[serde(flatten)]
    pub latest: LatestRate,
    #[schema(example = 4.76)]
    pub change_pct: f64,
}
