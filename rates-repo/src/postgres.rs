//! PostgreSQL repository adapter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::debug;

use rates_types::{ConfirmedRate, CurrencyPair, RateId, RateRepository, RepoError, StagedQuote};

use crate::types::{PgQueueRow, PgRateRow, now_micros};

fn db_error(e: sqlx::Error) -> RepoError {
    RepoError::Database(e.to_string())
}

// ─────────────────────────────────────────────────────────────────────────────
// PostgreSQL Repository
// ─────────────────────────────────────────────────────────────────────────────

/// PostgreSQL repository. Confirmation locks the dequeued row with
/// `FOR UPDATE SKIP LOCKED`, so concurrent confirmations pick distinct entries.
pub struct PostgresRepo {
    pool: PgPool,
}

/// Executes SQL statements from a migration file, splitting by semicolons.
async fn execute_migration(pool: &PgPool, sql: &str, name: &str) -> Result<(), anyhow::Error> {
    for statement in sql.split(';') {
        let stmt = statement.trim();
        if !stmt.is_empty() {
            sqlx::query(stmt)
                .execute(pool)
                .await
                .map_err(|e| anyhow::anyhow!("Migration {} failed: {}", name, e))?;
        }
    }
    Ok(())
}

/// Runs all database migrations.
async fn run_migrations(pool: &PgPool) -> Result<(), anyhow::Error> {
    execute_migration(
        pool,
        include_str!("../migrations/0001_create_rates_pg.sql"),
        "0001",
    )
    .await?;

    execute_migration(
        pool,
        include_str!("../migrations/0002_create_rate_queue_pg.sql"),
        "0002",
    )
    .await?;

    Ok(())
}

impl PostgresRepo {
    /// Creates a new PostgreSQL repository with automatic migration.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn nth_newest(
        &self,
        pair: &CurrencyPair,
        offset: i64,
    ) -> Result<Option<ConfirmedRate>, RepoError> {
        let row: Option<PgRateRow> = sqlx::query_as(
            r#"SELECT id, currency, base, rate, updated_at FROM rates
               WHERE currency = $1 AND base = $2
               ORDER BY updated_at DESC LIMIT 1 OFFSET $3"#,
        )
        .bind(&pair.currency)
        .bind(&pair.base)
        .bind(offset)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(row.map(Into::into))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Repository implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl RateRepository for PostgresRepo {
    async fn stage(&self, quote: StagedQuote) -> Result<RateId, RepoError> {
        sqlx::query(
            r#"INSERT INTO rate_queue (id, currency, base, rate, created_at)
               VALUES ($1, $2, $3, $4, $5)"#,
        )
        .bind(quote.id.into_uuid())
        .bind(&quote.currency)
        .bind(&quote.base)
        .bind(quote.rate)
        .bind(now_micros())
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(quote.id)
    }

    async fn confirm(&self) -> Result<ConfirmedRate, RepoError> {
        let mut db_tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))?;

        let row: Option<PgQueueRow> = sqlx::query_as(
            r#"DELETE FROM rate_queue
               WHERE id = (
                   SELECT id FROM rate_queue
                   ORDER BY created_at
                   LIMIT 1
                   FOR UPDATE SKIP LOCKED
               )
               RETURNING id, currency, base, rate"#,
        )
        .fetch_optional(&mut *db_tx)
        .await
        .map_err(db_error)?;

        let Some(row) = row else {
            return Err(RepoError::EmptyQueue);
        };
        let confirmed = ConfirmedRate::from_staged(row.into(), now_micros());

        sqlx::query(
            r#"INSERT INTO rates (id, currency, base, rate, updated_at)
               VALUES ($1, $2, $3, $4, $5)"#,
        )
        .bind(confirmed.id.into_uuid())
        .bind(&confirmed.currency)
        .bind(&confirmed.base)
        .bind(confirmed.rate)
        .bind(confirmed.updated_at)
        .execute(&mut *db_tx)
        .await
        .map_err(db_error)?;

        db_tx
            .commit()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))?;

        debug!(rate_id = %confirmed.id, "Promoted staged quote");
        Ok(confirmed)
    }

    async fn staged(&self, id: RateId) -> Result<Option<StagedQuote>, RepoError> {
        let row: Option<PgQueueRow> =
            sqlx::query_as(r#"SELECT id, currency, base, rate FROM rate_queue WHERE id = $1"#)
                .bind(id.into_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?;

        Ok(row.map(Into::into))
    }

    async fn append(&self, pair: &CurrencyPair, rate: Decimal) -> Result<ConfirmedRate, RepoError> {
        let row = ConfirmedRate {
            updated_at: now_micros(),
            ..ConfirmedRate::direct(pair, rate)
        };

        sqlx::query(
            r#"INSERT INTO rates (id, currency, base, rate, updated_at)
               VALUES ($1, $2, $3, $4, $5)"#,
        )
        .bind(row.id.into_uuid())
        .bind(&row.currency)
        .bind(&row.base)
        .bind(row.rate)
        .bind(row.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(row)
    }

    async fn get_by_id(&self, id: RateId) -> Result<Option<ConfirmedRate>, RepoError> {
        let row: Option<PgRateRow> = sqlx::query_as(
            r#"SELECT id, currency, base, rate, updated_at FROM rates WHERE id = $1"#,
        )
        .bind(id.into_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(row.map(Into::into))
    }

    async fn latest(&self, pair: &CurrencyPair) -> Result<Option<ConfirmedRate>, RepoError> {
        self.nth_newest(pair, 0).await
    }

    async fn previous(&self, pair: &CurrencyPair) -> Result<Option<ConfirmedRate>, RepoError> {
        self.nth_newest(pair, 1).await
    }

    async fn all_latest(&self) -> Result<Vec<ConfirmedRate>, RepoError> {
        let rows: Vec<PgRateRow> = sqlx::query_as(
            r#"SELECT DISTINCT ON (currency, base) id, currency, base, rate, updated_at
               FROM rates
               ORDER BY currency, base, updated_at DESC"#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn history(
        &self,
        pair: &CurrencyPair,
        since: DateTime<Utc>,
    ) -> Result<Vec<ConfirmedRate>, RepoError> {
        let rows: Vec<PgRateRow> = sqlx::query_as(
            r#"SELECT id, currency, base, rate, updated_at FROM rates
               WHERE currency = $1 AND base = $2 AND updated_at >= $3
               ORDER BY updated_at"#,
        )
        .bind(&pair.currency)
        .bind(&pair.base)
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn delete_pair(&self, pair: &CurrencyPair) -> Result<u64, RepoError> {
        let result = sqlx::query(r#"DELETE FROM rates WHERE currency = $1 AND base = $2"#)
            .bind(&pair.currency)
            .bind(&pair.base)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(result.rows_affected())
    }
}
