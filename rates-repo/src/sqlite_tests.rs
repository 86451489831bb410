//! SQLite repository integration tests.

#[cfg(test)]
mod tests {
    use std::str::FromStr;
    use std::sync::Arc;

    use chrono::{Duration, Utc};
    use rust_decimal::Decimal;

    use rates_types::{
        CurrencyPair, RateId, RateRepository, RepoError, StagedQuote, change_percent,
    };

    use crate::{Repo, SqliteRepo, build_repo};

    async fn setup_repo() -> SqliteRepo {
        SqliteRepo::new("sqlite::memory:").await.unwrap()
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn eur_usd() -> CurrencyPair {
        CurrencyPair::new("EUR", "USD")
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Staging queue
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_stage_then_confirm() {
        let repo = setup_repo().await;
        let quote = StagedQuote::new(&eur_usd(), dec("1.08"));
        let id = repo.stage(quote).await.unwrap();
        assert!(repo.staged(id).await.unwrap().is_some());

        let confirmed = repo.confirm().await.unwrap();

        assert_eq!(confirmed.id, id);
        assert_eq!(confirmed.currency, "EUR");
        assert_eq!(confirmed.base, "USD");
        assert_eq!(confirmed.rate, dec("1.08"));
        assert!(repo.staged(id).await.unwrap().is_none());

        let fetched = repo.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(fetched, confirmed);
    }

    #[tokio::test]
    async fn test_confirm_empty_queue() {
        let repo = setup_repo().await;
        repo.append(&eur_usd(), dec("1.05")).await.unwrap();

        let result = repo.confirm().await;

        assert!(matches!(result, Err(RepoError::EmptyQueue)));
        let history = repo.history(&eur_usd(), Utc::now() - Duration::hours(1)).await.unwrap();
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn test_confirm_consumes_one_entry_oldest_first() {
        let repo = setup_repo().await;
        let first = repo
            .stage(StagedQuote::new(&eur_usd(), dec("1.01")))
            .await
            .unwrap();
        let second = repo
            .stage(StagedQuote::new(&CurrencyPair::new("GBP", "USD"), dec("0.79")))
            .await
            .unwrap();

        assert_eq!(repo.confirm().await.unwrap().id, first);
        assert!(repo.staged(second).await.unwrap().is_some());
        assert_eq!(repo.confirm().await.unwrap().id, second);
        assert!(matches!(repo.confirm().await, Err(RepoError::EmptyQueue)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_confirms_never_share_an_entry() {
        // A file database so the pool hands out several connections
        let tmp = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}/rates.db", tmp.path().display());
        let repo = Arc::new(SqliteRepo::new(&url).await.unwrap());
        assert!(repo.pool().options().get_max_connections() > 1);

        for i in 0..20 {
            let rate = Decimal::new(100 + i, 2);
            repo.stage(StagedQuote::new(&eur_usd(), rate)).await.unwrap();
        }

        let handles: Vec<_> = (0..24)
            .map(|_| {
                let repo = repo.clone();
                tokio::spawn(async move { repo.confirm().await })
            })
            .collect();

        let mut ids = Vec::new();
        let mut empty = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(row) => ids.push(row.id),
                Err(RepoError::EmptyQueue) => empty += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        ids.sort_by_key(|id| id.into_uuid());
        ids.dedup();
        assert_eq!(ids.len(), 20);
        assert_eq!(empty, 4);

        let history = repo
            .history(&eur_usd(), Utc::now() - Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(history.len(), 20);
    }

    #[tokio::test]
    async fn test_failed_promotion_keeps_staged_entry() {
        let repo = setup_repo().await;
        let existing = repo.append(&eur_usd(), dec("1.05")).await.unwrap();

        // Same id as a history row, so the insert half of the promotion fails
        let quote = StagedQuote {
            id: existing.id,
            ..StagedQuote::new(&eur_usd(), dec("1.08"))
        };
        let id = repo.stage(quote).await.unwrap();

        let result = repo.confirm().await;

        assert!(matches!(result, Err(RepoError::Database(_))));
        let staged = repo.staged(id).await.unwrap().unwrap();
        assert_eq!(staged.rate, dec("1.08"));
        let stored = repo.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(stored.rate, dec("1.05"));
        let history = repo
            .history(&eur_usd(), Utc::now() - Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn test_staged_unknown_id() {
        let repo = setup_repo().await;
        assert!(repo.staged(RateId::new()).await.unwrap().is_none());
    }

    // ─────────────────────────────────────────────────────────────────────────
    // History
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_latest_and_previous() {
        let repo = setup_repo().await;
        assert!(repo.latest(&eur_usd()).await.unwrap().is_none());

        repo.append(&eur_usd(), dec("1.05")).await.unwrap();
        assert!(repo.previous(&eur_usd()).await.unwrap().is_none());

        let newest = repo.append(&eur_usd(), dec("1.10")).await.unwrap();

        let latest = repo.latest(&eur_usd()).await.unwrap().unwrap();
        let previous = repo.previous(&eur_usd()).await.unwrap().unwrap();
        assert_eq!(latest, newest);
        assert_eq!(previous.rate, dec("1.05"));

        let change = change_percent(latest.rate, Some(previous.rate));
        assert!((change - 4.7619).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_all_latest_one_row_per_pair() {
        let repo = setup_repo().await;
        let gbp_usd = CurrencyPair::new("GBP", "USD");

        repo.append(&eur_usd(), dec("1.05")).await.unwrap();
        repo.append(&gbp_usd, dec("1.20")).await.unwrap();
        repo.append(&eur_usd(), dec("1.10")).await.unwrap();
        repo.append(&gbp_usd, dec("1.26")).await.unwrap();
        repo.append(&eur_usd(), dec("1.07")).await.unwrap();

        let rows = repo.all_latest().await.unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].pair(), eur_usd());
        assert_eq!(rows[0].rate, dec("1.07"));
        assert_eq!(rows[1].pair(), gbp_usd);
        assert_eq!(rows[1].rate, dec("1.26"));
    }

    #[tokio::test]
    async fn test_both_write_paths_share_history() {
        let repo = setup_repo().await;
        repo.append(&eur_usd(), dec("1.05")).await.unwrap();
        repo.stage(StagedQuote::new(&eur_usd(), dec("1.09")))
            .await
            .unwrap();
        repo.confirm().await.unwrap();

        let latest = repo.latest(&eur_usd()).await.unwrap().unwrap();
        assert_eq!(latest.rate, dec("1.09"));
    }

    #[tokio::test]
    async fn test_history_window_ascending() {
        let repo = setup_repo().await;
        let start = Utc::now() - Duration::seconds(1);
        for rate in ["1.01", "1.02", "1.03"] {
            repo.append(&eur_usd(), dec(rate)).await.unwrap();
        }
        repo.append(&CurrencyPair::new("GBP", "USD"), dec("0.8"))
            .await
            .unwrap();

        let rows = repo.history(&eur_usd(), start).await.unwrap();
        let rates: Vec<_> = rows.iter().map(|r| r.rate).collect();
        assert_eq!(rates, vec![dec("1.01"), dec("1.02"), dec("1.03")]);

        let future = repo
            .history(&eur_usd(), Utc::now() + Duration::minutes(5))
            .await
            .unwrap();
        assert!(future.is_empty());
    }

    #[tokio::test]
    async fn test_delete_pair() {
        let repo = setup_repo().await;
        let gbp_usd = CurrencyPair::new("GBP", "USD");
        repo.append(&eur_usd(), dec("1.05")).await.unwrap();
        repo.append(&eur_usd(), dec("1.10")).await.unwrap();
        repo.append(&gbp_usd, dec("1.26")).await.unwrap();

        assert_eq!(repo.delete_pair(&eur_usd()).await.unwrap(), 2);

        assert!(repo.latest(&eur_usd()).await.unwrap().is_none());
        assert!(repo.latest(&gbp_usd).await.unwrap().is_some());
        assert_eq!(repo.delete_pair(&eur_usd()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_decimal_precision_survives_storage() {
        let repo = setup_repo().await;
        let row = repo
            .append(&CurrencyPair::new("JPY", "BTC"), dec("0.000000123456789"))
            .await
            .unwrap();

        let fetched = repo.get_by_id(row.id).await.unwrap().unwrap();
        assert_eq!(fetched.rate, dec("0.000000123456789"));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Wiring
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_build_repo_creates_database_file() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("data");
        let url = format!("sqlite://{}/rates.db?mode=rwc", dir.display());

        let repo = build_repo(&url).await.unwrap();
        assert_eq!(repo.backend(), "sqlite");
        repo.append(&eur_usd(), dec("1.05")).await.unwrap();
        assert!(dir.join("rates.db").exists());

        // schema creation is idempotent
        let reopened = build_repo(&url).await.unwrap();
        assert!(reopened.latest(&eur_usd()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_build_repo_rejects_unknown_scheme() {
        let result = Repo::new("mysql://localhost/rates").await;
        assert!(result.is_err());
    }
}
