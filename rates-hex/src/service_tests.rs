//! RateService and worker unit tests.

#[cfg(test)]
pub(crate) mod tests {
    use std::str::FromStr;
    use std::sync::Arc;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use rust_decimal::Decimal;

    use rate_provider::FixedRateProvider;
    use rates_types::{
        AppError, ConfirmedRate, CurrencyPair, HistoryPeriod, IsoWhitelist, ProviderError,
        RateId, RateProvider, RateRepository, RepoError, StagedQuote,
    };

    use crate::RateService;
    use crate::worker::{AutoRefresher, QueueConfirmer, RefreshReport, shutdown_channel};

    /// Simple in-memory repository for testing the service layer.
    ///
    /// History rows are kept in write order, so the last matching row is the
    /// latest one.
    #[derive(Default)]
    pub struct MockRepo {
        queue: Mutex<Vec<StagedQuote>>,
        history: Mutex<Vec<ConfirmedRate>>,
        delay: Option<Duration>,
    }

    impl MockRepo {
        pub fn new() -> Self {
            Self::default()
        }

        /// Every read sleeps this long first.
        pub fn slow(delay: Duration) -> Self {
            Self {
                delay: Some(delay),
                ..Self::default()
            }
        }

        fn rows_for(&self, pair: &CurrencyPair) -> Vec<ConfirmedRate> {
            self.history
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.pair() == *pair)
                .cloned()
                .collect()
        }

        async fn maybe_wait(&self) {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
        }
    }

    #[async_trait]
    impl RateRepository for MockRepo {
        async fn stage(&self, quote: StagedQuote) -> Result<RateId, RepoError> {
            let id = quote.id;
            self.queue.lock().unwrap().push(quote);
            Ok(id)
        }

        async fn confirm(&self) -> Result<ConfirmedRate, RepoError> {
            let mut queue = self.queue.lock().unwrap();
            if queue.is_empty() {
                return Err(RepoError::EmptyQueue);
            }
            let row = ConfirmedRate::from_staged(queue.remove(0), Utc::now());
            self.history.lock().unwrap().push(row.clone());
            Ok(row)
        }

        async fn staged(&self, id: RateId) -> Result<Option<StagedQuote>, RepoError> {
            Ok(self
                .queue
                .lock()
                .unwrap()
                .iter()
                .find(|q| q.id == id)
                .cloned())
        }

        async fn append(
            &self,
            pair: &CurrencyPair,
            rate: Decimal,
        ) -> Result<ConfirmedRate, RepoError> {
            let row = ConfirmedRate::direct(pair, rate);
            self.history.lock().unwrap().push(row.clone());
            Ok(row)
        }

        async fn get_by_id(&self, id: RateId) -> Result<Option<ConfirmedRate>, RepoError> {
            self.maybe_wait().await;
            Ok(self
                .history
                .lock()
                .unwrap()
                .iter()
                .find(|r| r.id == id)
                .cloned())
        }

        async fn latest(&self, pair: &CurrencyPair) -> Result<Option<ConfirmedRate>, RepoError> {
            self.maybe_wait().await;
            Ok(self.rows_for(pair).pop())
        }

        async fn previous(
            &self,
            pair: &CurrencyPair,
        ) -> Result<Option<ConfirmedRate>, RepoError> {
            let mut rows = self.rows_for(pair);
            rows.pop();
            Ok(rows.pop())
        }

        async fn all_latest(&self) -> Result<Vec<ConfirmedRate>, RepoError> {
            self.maybe_wait().await;
            let mut pairs: Vec<CurrencyPair> = self
                .history
                .lock()
                .unwrap()
                .iter()
                .map(ConfirmedRate::pair)
                .collect();
            pairs.sort();
            pairs.dedup();
            Ok(pairs
                .iter()
                .filter_map(|pair| self.rows_for(pair).pop())
                .collect())
        }

        async fn history(
            &self,
            pair: &CurrencyPair,
            since: DateTime<Utc>,
        ) -> Result<Vec<ConfirmedRate>, RepoError> {
            Ok(self
                .rows_for(pair)
                .into_iter()
                .filter(|r| r.updated_at >= since)
                .collect())
        }

        async fn delete_pair(&self, pair: &CurrencyPair) -> Result<u64, RepoError> {
            let mut history = self.history.lock().unwrap();
            let before = history.len();
            history.retain(|r| r.pair() != *pair);
            Ok((before - history.len()) as u64)
        }
    }

    /// Fixed-table provider that counts calls and can be made slow.
    pub struct MockProvider {
        inner: FixedRateProvider,
        calls: AtomicUsize,
        delay: Option<Duration>,
    }

    impl MockProvider {
        pub fn new(inner: FixedRateProvider) -> Self {
            Self {
                inner,
                calls: AtomicUsize::new(0),
                delay: None,
            }
        }

        pub fn slow(inner: FixedRateProvider, delay: Duration) -> Self {
            Self {
                delay: Some(delay),
                ..Self::new(inner)
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RateProvider for MockProvider {
        async fn fetch_rate(&self, pair: &CurrencyPair) -> Result<Decimal, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.inner.fetch_rate(pair).await
        }

        async fn supported_codes(&self) -> Result<Vec<String>, ProviderError> {
            self.inner.supported_codes().await
        }
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn eur_usd() -> CurrencyPair {
        CurrencyPair::new("EUR", "USD")
    }

    fn gbp_usd() -> CurrencyPair {
        CurrencyPair::new("GBP", "USD")
    }

    fn whitelist() -> IsoWhitelist {
        IsoWhitelist::new(["EUR", "GBP", "USD"])
    }

    fn setup_service_with(
        repo: MockRepo,
        provider: FixedRateProvider,
    ) -> RateService<MockRepo, MockProvider> {
        RateService::new(repo, MockProvider::new(provider), whitelist())
    }

    fn setup_service() -> RateService<MockRepo, MockProvider> {
        let provider = FixedRateProvider::new()
            .with_rate(eur_usd(), dec("1.08"))
            .with_rate(gbp_usd(), dec("0.79"));
        setup_service_with(MockRepo::new(), provider)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Staging and confirmation
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_stage_confirm_get_by_id() {
        let service = setup_service();

        let id = service.stage_quote(&eur_usd()).await.unwrap();
        let confirmed = service.confirm().await.unwrap();
        assert_eq!(confirmed.id, id);
        assert!(service.repo().staged(id).await.unwrap().is_none());

        let row = service.get_by_id(id).await.unwrap();
        assert_eq!(row.currency, "EUR");
        assert_eq!(row.base, "USD");
        assert_eq!(row.rate, dec("1.08"));
        assert!(row.updated_at <= Utc::now());
    }

    #[tokio::test]
    async fn test_stage_rejects_unknown_code_before_provider_call() {
        let service = setup_service();

        let result = service
            .stage_quote(&CurrencyPair::new("XXX", "YYY"))
            .await;

        match result {
            Err(AppError::UnknownIsoCode { code, valid }) => {
                assert_eq!(code, "XXX");
                assert_eq!(valid, vec!["EUR", "GBP", "USD"]);
            }
            other => panic!("expected UnknownIsoCode, got {other:?}"),
        }
        assert_eq!(service.provider().calls(), 0);
    }

    #[tokio::test]
    async fn test_stage_provider_failure_stages_nothing() {
        let service = setup_service_with(MockRepo::new(), FixedRateProvider::new());

        let result = service.stage_quote(&eur_usd()).await;

        assert!(matches!(result, Err(AppError::Provider(_))));
        assert!(matches!(service.confirm().await, Err(AppError::EmptyQueue)));
    }

    #[tokio::test]
    async fn test_confirm_empty_queue_leaves_history() {
        let service = setup_service();
        service.update_rate(&eur_usd(), dec("1.05")).await.unwrap();

        assert!(matches!(service.confirm().await, Err(AppError::EmptyQueue)));
        assert_eq!(service.all_latest_with_change().await.unwrap().len(), 1);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_all_latest_with_change() {
        let service = setup_service();
        service.update_rate(&eur_usd(), dec("1.05")).await.unwrap();
        service.update_rate(&eur_usd(), dec("1.10")).await.unwrap();
        service.update_rate(&gbp_usd(), dec("0.79")).await.unwrap();

        let rates = service.all_latest_with_change().await.unwrap();

        assert_eq!(rates.len(), 2);
        let eur = &rates[0];
        assert_eq!(eur.latest.currency, "EUR");
        assert_eq!(eur.latest.rate, dec("1.10"));
        assert!((eur.change_pct - 4.76).abs() < 0.01);

        // a single row has nothing to compare against
        assert_eq!(rates[1].change_pct, 0.0);
    }

    #[tokio::test]
    async fn test_latest_missing_is_not_found() {
        let service = setup_service();
        assert!(matches!(
            service.latest(&eur_usd()).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_then_latest_not_found() {
        let service = setup_service();
        service.update_rate(&eur_usd(), dec("1.05")).await.unwrap();
        service.update_rate(&eur_usd(), dec("1.10")).await.unwrap();
        service.update_rate(&gbp_usd(), dec("0.79")).await.unwrap();

        assert_eq!(service.delete_pair(&eur_usd()).await.unwrap(), 2);

        assert!(matches!(
            service.latest(&eur_usd()).await,
            Err(AppError::NotFound(_))
        ));
        assert!(service.latest(&gbp_usd()).await.is_ok());
    }

    #[tokio::test]
    async fn test_history_validates_pair() {
        let service = setup_service();
        service.update_rate(&eur_usd(), dec("1.05")).await.unwrap();

        let rows = service
            .history(&eur_usd(), HistoryPeriod::Hour)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);

        let result = service
            .history(&CurrencyPair::new("EUR", "XXX"), HistoryPeriod::Hour)
            .await;
        assert!(matches!(result, Err(AppError::UnknownIsoCode { ref code, .. }) if code == "XXX"));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Direct writes
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_update_rate_requires_positive_rate() {
        let service = setup_service();

        for rate in ["0", "-1.5"] {
            let result = service.update_rate(&eur_usd(), dec(rate)).await;
            assert!(matches!(result, Err(AppError::BadRequest(_))));
        }

        let row = service.update_rate(&eur_usd(), dec("1.2")).await.unwrap();
        assert_eq!(service.latest(&eur_usd()).await.unwrap().rate, row.rate);
    }

    #[tokio::test]
    async fn test_update_and_delete_validate_codes() {
        let service = setup_service();
        let pair = CurrencyPair::new("usd", "EUR");

        assert!(matches!(
            service.update_rate(&pair, dec("1.0")).await,
            Err(AppError::UnknownIsoCode { .. })
        ));
        assert!(matches!(
            service.delete_pair(&pair).await,
            Err(AppError::UnknownIsoCode { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_storage_times_out() {
        let service = setup_service_with(
            MockRepo::slow(Duration::from_secs(30)),
            FixedRateProvider::new(),
        )
        .with_storage_timeout(Duration::from_secs(10));

        let result = service.latest(&eur_usd()).await;

        assert!(matches!(result, Err(AppError::Internal(_))));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Workers
    // ─────────────────────────────────────────────────────────────────────────

    fn refresher(
        service: RateService<MockRepo, MockProvider>,
        deadline: Duration,
    ) -> AutoRefresher<MockRepo, MockProvider> {
        AutoRefresher::new(Arc::new(service), Duration::from_secs(60), deadline)
    }

    #[tokio::test]
    async fn test_refresh_skips_failing_pair() {
        // provider knows EUR/USD only
        let provider = FixedRateProvider::new().with_rate(eur_usd(), dec("1.11"));
        let service = setup_service_with(MockRepo::new(), provider);
        service.update_rate(&eur_usd(), dec("1.05")).await.unwrap();
        service.update_rate(&gbp_usd(), dec("0.79")).await.unwrap();
        let service = Arc::new(service);

        let worker = AutoRefresher::new(
            service.clone(),
            Duration::from_secs(60),
            Duration::from_secs(10),
        );
        let report = worker.refresh_once().await.unwrap();

        assert_eq!(
            report,
            RefreshReport {
                refreshed: 1,
                failed: 1
            }
        );
        assert_eq!(service.latest(&eur_usd()).await.unwrap().rate, dec("1.11"));
        assert_eq!(service.latest(&gbp_usd()).await.unwrap().rate, dec("0.79"));
        let gbp_rows = service.history(&gbp_usd(), HistoryPeriod::Day).await.unwrap();
        assert_eq!(gbp_rows.len(), 1);
    }

    #[tokio::test]
    async fn test_refresh_with_empty_history() {
        let worker = refresher(setup_service(), Duration::from_secs(10));
        assert_eq!(worker.tick().await, Some(RefreshReport::default()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_tick_abandoned_at_deadline() {
        let provider = FixedRateProvider::new().with_rate(eur_usd(), dec("1.11"));
        let repo = MockRepo::new();
        repo.append(&eur_usd(), dec("1.05")).await.unwrap();
        let service = RateService::new(
            repo,
            MockProvider::slow(provider, Duration::from_secs(30)),
            whitelist(),
        );

        let worker = refresher(service, Duration::from_secs(10));

        assert_eq!(worker.tick().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_workers_stop_on_shutdown() {
        let service = Arc::new(setup_service());
        let (tx, rx) = shutdown_channel();

        let refresh = tokio::spawn(
            AutoRefresher::new(service.clone(), Duration::from_secs(60), Duration::from_secs(10))
                .run(rx.clone()),
        );
        let confirm =
            tokio::spawn(QueueConfirmer::new(service.clone(), Duration::from_secs(5)).run(rx));

        tokio::time::sleep(Duration::from_secs(120)).await;
        tx.send(true).unwrap();

        refresh.await.unwrap();
        confirm.await.unwrap();
    }

    #[tokio::test]
    async fn test_confirmer_promotes_one_per_call() {
        let service = Arc::new(setup_service());
        service.stage_quote(&eur_usd()).await.unwrap();
        service.stage_quote(&gbp_usd()).await.unwrap();

        let confirmer = QueueConfirmer::new(service.clone(), Duration::from_secs(5));

        let first = confirmer.confirm_once().await.unwrap();
        assert_eq!(first.pair(), eur_usd());
        let second = confirmer.confirm_once().await.unwrap();
        assert_eq!(second.pair(), gbp_usd());
        assert!(confirmer.confirm_once().await.is_none());
    }
}
