//! SQLite repository adapter.
#![allow(clippy::collapsible_if)]

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use tracing::debug;

use rates_types::{ConfirmedRate, CurrencyPair, RateId, RateRepository, RepoError, StagedQuote};

use crate::types::{SqliteQueueRow, SqliteRateRow, format_timestamp, now_micros};

const MIGRATIONS: &[(&str, &str)] = &[
    ("0001", include_str!("../migrations/0001_create_rates.sql")),
    ("0002", include_str!("../migrations/0002_create_rate_queue.sql")),
];

/// How long a connection waits on the database write lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const RATE_COLUMNS: &str = "id, currency, base, rate, updated_at";

fn db_error(e: sqlx::Error) -> RepoError {
    RepoError::Database(e.to_string())
}

// ─────────────────────────────────────────────────────────────────────────────
// SQLite Repository
// ─────────────────────────────────────────────────────────────────────────────

/// SQLite repository implementation.
///
/// Writers serialize on the database lock, so the dequeue in
/// [`RateRepository::confirm`] cannot hand the same entry to two callers.
pub struct SqliteRepo {
    pool: SqlitePool,
}

impl SqliteRepo {
    /// Creates a new SQLite repository with automatic migration.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure on-disk SQLite target directory exists (no-op for in-memory).
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            let path = path.split('?').next().unwrap_or(path);
            if path != ":memory:" {
                let p = std::path::Path::new(path);
                if let Some(parent) = p.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .busy_timeout(BUSY_TIMEOUT);

        // Every connection to an in-memory database sees its own empty
        // database, so keep exactly one alive for the pool's lifetime.
        let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");
        let (pool_options, options) = if in_memory {
            let pool_options = SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
            (pool_options, options)
        } else {
            // Writers queue on the busy timeout; readers never block them
            (
                SqlitePoolOptions::new(),
                options.journal_mode(SqliteJournalMode::Wal),
            )
        };
        let pool = pool_options.connect_with(options).await?;

        let repo = Self { pool };
        repo.create_schema().await?;
        Ok(repo)
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Creates the database schema. Safe to run repeatedly.
    pub async fn create_schema(&self) -> Result<(), RepoError> {
        for (name, sql) in MIGRATIONS {
            for statement in sql.split(';').map(str::trim).filter(|s| !s.is_empty()) {
                sqlx::query(statement)
                    .execute(&self.pool)
                    .await
                    .map_err(|e| RepoError::Database(format!("migration {}: {}", name, e)))?;
            }
        }
        Ok(())
    }

    async fn insert_rate(&self, row: &ConfirmedRate) -> Result<(), RepoError> {
        sqlx::query(
            r#"INSERT INTO rates (id, currency, base, rate, updated_at) VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(row.id.to_string())
        .bind(&row.currency)
        .bind(&row.base)
        .bind(row.rate.to_string())
        .bind(format_timestamp(row.updated_at))
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    /// Rows of a pair, newest first, skipping `offset`.
    async fn nth_newest(
        &self,
        pair: &CurrencyPair,
        offset: i64,
    ) -> Result<Option<ConfirmedRate>, RepoError> {
        // rowid breaks ties between rows written in the same microsecond
        let row: Option<SqliteRateRow> = sqlx::query_as(&format!(
            "SELECT {RATE_COLUMNS} FROM rates WHERE currency = ? AND base = ? \
             ORDER BY updated_at DESC, rowid DESC LIMIT 1 OFFSET ?"
        ))
        .bind(&pair.currency)
        .bind(&pair.base)
        .bind(offset)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.map(SqliteRateRow::into_domain).transpose()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Repository implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl RateRepository for SqliteRepo {
    async fn stage(&self, quote: StagedQuote) -> Result<RateId, RepoError> {
        sqlx::query(
            r#"INSERT INTO rate_queue (id, currency, base, rate, created_at) VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(quote.id.to_string())
        .bind(&quote.currency)
        .bind(&quote.base)
        .bind(quote.rate.to_string())
        .bind(format_timestamp(now_micros()))
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

        let row: Option<SqliteQueueRow> = sqlx::query_as(
            r#"DELETE FROM rate_queue
               WHERE id = (SELECT id FROM rate_queue ORDER BY created_at, rowid LIMIT 1)
               RETURNING id, currency, base, rate"#,
        )
        .fetch_optional(&mut *db_tx)
        .await
        .map_err(db_error)?;

        // Dropping the transaction rolls it back.
        let Some(row) = row else {
            return Err(RepoError::EmptyQueue);
        };
        let confirmed = ConfirmedRate::from_staged(row.into_domain()?, now_micros());

        sqlx::query(
            r#"INSERT INTO rates (id, currency, base, rate, updated_at) VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(confirmed.id.to_string())
        .bind(&confirmed.currency)
        .bind(&confirmed.base)
        .bind(confirmed.rate.to_string())
        .bind(format_timestamp(confirmed.updated_at))
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
        let row: Option<SqliteQueueRow> =
            sqlx::query_as(r#"SELECT id, currency, base, rate FROM rate_queue WHERE id = ?"#)
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?;

        row.map(SqliteQueueRow::into_domain).transpose()
    }

    async fn append(&self, pair: &CurrencyPair, rate: Decimal) -> Result<ConfirmedRate, RepoError> {
        let row = ConfirmedRate {
            updated_at: now_micros(),
            ..ConfirmedRate::direct(pair, rate)
        };
        self.insert_rate(&row).await?;
        Ok(row)
    }

    async fn get_by_id(&self, id: RateId) -> Result<Option<ConfirmedRate>, RepoError> {
        let row: Option<SqliteRateRow> =
            sqlx::query_as(&format!("SELECT {RATE_COLUMNS} FROM rates WHERE id = ?"))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?;

        row.map(SqliteRateRow::into_domain).transpose()
    }

    async fn latest(&self, pair: &CurrencyPair) -> Result<Option<ConfirmedRate>, RepoError> {
        self.nth_newest(pair, 0).await
    }

    async fn previous(&self, pair: &CurrencyPair) -> Result<Option<ConfirmedRate>, RepoError> {
        self.nth_newest(pair, 1).await
    }

    async fn all_latest(&self) -> Result<Vec<ConfirmedRate>, RepoError> {
        let rows: Vec<SqliteRateRow> = sqlx::query_as(&format!(
            "SELECT {RATE_COLUMNS} FROM ( \
                 SELECT {RATE_COLUMNS}, ROW_NUMBER() OVER ( \
                     PARTITION BY currency, base ORDER BY updated_at DESC, rowid DESC \
                 ) AS rn FROM rates \
             ) WHERE rn = 1 ORDER BY currency, base"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.into_iter().map(SqliteRateRow::into_domain).collect()
    }

    async fn history(
        &self,
        pair: &CurrencyPair,
        since: DateTime<Utc>,
    ) -> Result<Vec<ConfirmedRate>, RepoError> {
        let rows: Vec<SqliteRateRow> = sqlx::query_as(&format!(
            "SELECT {RATE_COLUMNS} FROM rates \
             WHERE currency = ? AND base = ? AND updated_at >= ? \
             ORDER BY updated_at, rowid"
        ))
        .bind(&pair.currency)
        .bind(&pair.base)
        .bind(format_timestamp(since))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.into_iter().map(SqliteRateRow::into_domain).collect()
    }

    async fn delete_pair(&self, pair: &CurrencyPair) -> Result<u64, RepoError> {
        let result = sqlx::query(r#"DELETE FROM rates WHERE currency = ? AND base = ?"#)
            .bind(&pair.currency)
            .bind(&pair.base)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(result.rows_affected())
    }
}
