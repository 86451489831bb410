//! Database row types and their conversion into domain types.
//!
//! SQLite stores ids, rates and timestamps as text; PostgreSQL uses native
//! UUID, NUMERIC and TIMESTAMPTZ columns. Each backend gets its own row types
//! so both can be compiled into the same binary.

use chrono::{DateTime, SubsecRound, Utc};

/// Current time at the precision both backends persist (microseconds).
///
/// Returned rows must compare equal to what a later read produces.
pub fn now_micros() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

// ─────────────────────────────────────────────────────────────────────────────
// SQLite rows
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(feature = "sqlite")]
pub use self::sqlite_rows::*;

#[cfg(feature = "sqlite")]
mod sqlite_rows {
    use std::str::FromStr;

    use chrono::{DateTime, SecondsFormat, Utc};
    use rust_decimal::Decimal;
    use sqlx::FromRow;
    use uuid::Uuid;

    use rates_types::{ConfirmedRate, RateId, RepoError, StagedQuote};

    /// History row.
    #[derive(FromRow)]
    pub struct SqliteRateRow {
        pub id: String,
        pub currency: String,
        pub base: String,
        pub rate: String,
        pub updated_at: String,
    }

    /// Staging queue row.
    #[derive(FromRow)]
    pub struct SqliteQueueRow {
        pub id: String,
        pub currency: String,
        pub base: String,
        pub rate: String,
    }

    /// Fixed-width form so that text comparison matches time order.
    pub fn format_timestamp(ts: DateTime<Utc>) -> String {
        ts.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, RepoError> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| RepoError::Database(e.to_string()))
    }

    pub fn parse_id(s: &str) -> Result<RateId, RepoError> {
        Uuid::parse_str(s)
            .map(RateId::from_uuid)
            .map_err(|e| RepoError::Database(e.to_string()))
    }

    pub fn parse_rate(s: &str) -> Result<Decimal, RepoError> {
        Decimal::from_str(s).map_err(|e| RepoError::Database(format!("bad rate {:?}: {}", s, e)))
    }

    impl SqliteRateRow {
        pub fn into_domain(self) -> Result<ConfirmedRate, RepoError> {
            Ok(ConfirmedRate {
                id: parse_id(&self.id)?,
                rate: parse_rate(&self.rate)?,
                updated_at: parse_timestamp(&self.updated_at)?,
                currency: self.currency,
                base: self.base,
            })
        }
    }

    impl SqliteQueueRow {
        pub fn into_domain(self) -> Result<StagedQuote, RepoError> {
            Ok(StagedQuote {
                id: parse_id(&self.id)?,
                rate: parse_rate(&self.rate)?,
                currency: self.currency,
                base: self.base,
            })
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// PostgreSQL rows
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(feature = "postgres")]
pub use self::pg_rows::*;

#[cfg(feature = "postgres")]
mod pg_rows {
    use chrono::{DateTime, Utc};
    use rust_decimal::Decimal;
    use sqlx::FromRow;
    use uuid::Uuid;

    use rates_types::{ConfirmedRate, RateId, StagedQuote};

    /// History row.
    #[derive(FromRow)]
    pub struct PgRateRow {
        pub id: Uuid,
        pub currency: String,
        pub base: String,
        pub rate: Decimal,
        pub updated_at: DateTime<Utc>,
    }

    /// Staging queue row.
    #[derive(FromRow)]
    pub struct PgQueueRow {
        pub id: Uuid,
        pub currency: String,
        pub base: String,
        pub rate: Decimal,
    }

    impl From<PgRateRow> for ConfirmedRate {
        fn from(row: PgRateRow) -> Self {
            ConfirmedRate {
                id: RateId::from_uuid(row.id),
                currency: row.currency,
                base: row.base,
                rate: row.rate,
                updated_at: row.updated_at,
            }
        }
    }

    impl From<PgQueueRow> for StagedQuote {
        fn from(row: PgQueueRow) -> Self {
            StagedQuote {
                id: RateId::from_uuid(row.id),
                currency: row.currency,
                base: row.base,
                rate: row.rate,
            }
        }
    }
}
