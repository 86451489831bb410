//! Rate Application Service
//!
//! Orchestrates the provider and repository ports.
//! Contains NO infrastructure logic - pure business orchestration.

use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, instrument};

use rates_types::{
    AppError, ConfirmedRate, CurrencyPair, HistoryPeriod, IsoWhitelist, LatestRate, RateId,
    RateProvider, RateRepository, RateWithChange, RepoError, StagedQuote, change_percent,
};

/// Upper bound on a single storage call unless configured otherwise.
pub const DEFAULT_STORAGE_TIMEOUT: Duration = Duration::from_secs(10);

/// Application service for exchange rate operations.
///
/// Generic over `R: RateRepository` and `P: RateProvider` - the adapters are
/// injected at compile time. This enables:
/// - Swapping storage backends or upstream providers without code changes
/// - Testing with in-memory mocks
/// - Compile-time checks for port implementation
///
/// Every pair-based operation checks the pair against the ISO whitelist
/// before the provider or the store is touched.
pub struct RateService<R: RateRepository, P: RateProvider> {
    repo: R,
    provider: P,
    whitelist: IsoWhitelist,
    storage_timeout: Duration,
}

impl<R: RateRepository, P: RateProvider> RateService<R, P> {
    /// Creates a new rate service.
    pub fn new(repo: R, provider: P, whitelist: IsoWhitelist) -> Self {
        Self {
            repo,
            provider,
            whitelist,
            storage_timeout: DEFAULT_STORAGE_TIMEOUT,
        }
    }

    /// Overrides the bound applied to each storage call.
    pub fn with_storage_timeout(mut self, timeout: Duration) -> Self {
        self.storage_timeout = timeout;
        self
    }

    /// Returns a reference to the underlying repository.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn whitelist(&self) -> &IsoWhitelist {
        &self.whitelist
    }

    async fn storage<T>(
        &self,
        call: impl Future<Output = Result<T, RepoError>>,
    ) -> Result<T, RepoError> {
        tokio::time::timeout(self.storage_timeout, call)
            .await
            .map_err(|_| RepoError::Timeout)?
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Staging Queue
    // ─────────────────────────────────────────────────────────────────────────────

    /// Fetches the current rate for a pair and stages it for confirmation.
    #[instrument(skip(self, pair), fields(pair = %pair))]
    pub async fn stage_quote(&self, pair: &CurrencyPair) -> Result<RateId, AppError> {
        self.whitelist.validate_pair(pair)?;

        let rate = self.provider.fetch_rate(pair).await?;
        let id = self.storage(self.repo.stage(StagedQuote::new(pair, rate))).await?;

        debug!(rate_id = %id, %rate, "Staged quote");
        Ok(id)
    }

    /// Promotes one staged quote into the history.
    ///
    /// Returns [`AppError::EmptyQueue`] when nothing is waiting.
    pub async fn confirm(&self) -> Result<ConfirmedRate, AppError> {
        let row = self.storage(self.repo.confirm()).await?;
        Ok(row)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────────────────────────────────

    pub async fn get_by_id(&self, id: RateId) -> Result<ConfirmedRate, AppError> {
        self.storage(self.repo.get_by_id(id))
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Rate {}", id)))
    }

    /// Most recent rate for a pair.
    pub async fn latest(&self, pair: &CurrencyPair) -> Result<LatestRate, AppError> {
        self.whitelist.validate_pair(pair)?;

        self.storage(self.repo.latest(pair))
            .await?
            .map(LatestRate::from)
            .ok_or_else(|| AppError::NotFound(format!("Rate {}", pair)))
    }

    /// Latest rate of every known pair together with its change against the
    /// previous row of the same pair.
    pub async fn all_latest_with_change(&self) -> Result<Vec<RateWithChange>, AppError> {
        let rows = self.storage(self.repo.all_latest()).await?;

        let mut result = Vec::with_capacity(rows.len());
        for row in rows {
            let previous = self.storage(self.repo.previous(&row.pair())).await?;
            let change_pct = change_percent(row.rate, previous.map(|p| p.rate));
            result.push(RateWithChange {
                latest: row.into(),
                change_pct,
            });
        }
        Ok(result)
    }

    /// History rows of a pair inside the window, oldest first.
    pub async fn history(
        &self,
        pair: &CurrencyPair,
        period: HistoryPeriod,
    ) -> Result<Vec<ConfirmedRate>, AppError> {
        self.whitelist.validate_pair(pair)?;

        let since = period.since(Utc::now());
        let rows = self.storage(self.repo.history(pair, since)).await?;
        Ok(rows)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Direct writes
    // ─────────────────────────────────────────────────────────────────────────────

    /// Appends an operator-supplied rate, bypassing the staging queue.
    #[instrument(skip(self, pair), fields(pair = %pair))]
    pub async fn update_rate(
        &self,
        pair: &CurrencyPair,
        rate: Decimal,
    ) -> Result<ConfirmedRate, AppError> {
        self.whitelist.validate_pair(pair)?;
        if rate <= Decimal::ZERO {
            return Err(AppError::BadRequest("rate must be greater than zero".into()));
        }

        let row = self.storage(self.repo.append(pair, rate)).await?;
        Ok(row)
    }

    /// Fetches a fresh rate and appends it, bypassing the staging queue.
    pub async fn refresh_pair(&self, pair: &CurrencyPair) -> Result<ConfirmedRate, AppError> {
        let rate = self.provider.fetch_rate(pair).await?;
        let row = self.storage(self.repo.append(pair, rate)).await?;
        Ok(row)
    }

    /// Removes the whole history of a pair. Returns the number of rows removed.
    #[instrument(skip(self, pair), fields(pair = %pair))]
    pub async fn delete_pair(&self, pair: &CurrencyPair) -> Result<u64, AppError> {
        self.whitelist.validate_pair(pair)?;

        let deleted = self.storage(self.repo.delete_pair(pair)).await?;
        Ok(deleted)
    }

    /// Every pair with at least one history row.
    pub(crate) async fn known_pairs(&self) -> Result<Vec<CurrencyPair>, AppError> {
        let rows = self.storage(self.repo.all_latest()).await?;
        Ok(rows.iter().map(ConfirmedRate::pair).collect())
    }
}
