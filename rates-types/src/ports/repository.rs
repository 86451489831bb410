//! Repository port trait.
//!
//! This is the primary port in our hexagonal architecture.
//! Adapters (Postgres, SQLite, in-memory mocks) implement this trait.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::{ConfirmedRate, CurrencyPair, RateId, StagedQuote};
use crate::error::RepoError;

/// Storage for the staging queue and the append-only rate history.
///
/// Lookups return `Ok(None)` when nothing matches; the caller decides
/// whether that is an error.
#[async_trait::async_trait]
pub trait RateRepository: Send + Sync + 'static {
    // ─────────────────────────────────────────────────────────────────────────────
    // Staging queue
    // ─────────────────────────────────────────────────────────────────────────────

    /// Writes one pending entry to the staging queue.
    async fn stage(&self, quote: StagedQuote) -> Result<RateId, RepoError>;

    /// Promotes one pending entry into the history (MUST be atomic).
    ///
    /// The entry is not scoped to any pair. Fails with
    /// [`RepoError::EmptyQueue`] when nothing is pending. Either the history
    /// row is committed and the entry removed, or neither happens.
    async fn confirm(&self) -> Result<ConfirmedRate, RepoError>;

    /// Looks up a still-pending entry.
    async fn staged(&self, id: RateId) -> Result<Option<StagedQuote>, RepoError>;

    // ─────────────────────────────────────────────────────────────────────────────
    // History
    // ─────────────────────────────────────────────────────────────────────────────

    /// Appends a row directly, bypassing the queue.
    async fn append(&self, pair: &CurrencyPair, rate: Decimal) -> Result<ConfirmedRate, RepoError>;

    async fn get_by_id(&self, id: RateId) -> Result<Option<ConfirmedRate>, RepoError>;

    /// Row with the greatest timestamp for the pair.
    async fn latest(&self, pair: &CurrencyPair) -> Result<Option<ConfirmedRate>, RepoError>;

    /// Row with the second greatest timestamp for the pair.
    async fn previous(&self, pair: &CurrencyPair) -> Result<Option<ConfirmedRate>, RepoError>;

    /// Latest row of every pair that has history.
    async fn all_latest(&self) -> Result<Vec<ConfirmedRate>, RepoError>;

    /// Rows written at or after `since`, oldest first.
    async fn history(
        &self,
        pair: &CurrencyPair,
        since: DateTime<Utc>,
    ) -> Result<Vec<ConfirmedRate>, RepoError>;

    /// Removes every row of the pair. Returns how many rows were removed.
    async fn delete_pair(&self, pair: &CurrencyPair) -> Result<u64, RepoError>;
}
