//! Periodic refresh of every known pair from the provider.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, instrument, warn};

use rates_types::{AppError, RateProvider, RateRepository};

use super::{ShutdownSignal, stopped};
use crate::RateService;

/// Outcome of one refresh pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RefreshReport {
    pub refreshed: usize,
    pub failed: usize,
}

/// Re-fetches the latest rate of every pair in the history on a fixed
/// interval and appends it directly.
///
/// Each tick runs as its own task bounded by `deadline`, so a slow tick never
/// delays the next one. Ticks may overlap.
pub struct AutoRefresher<R: RateRepository, P: RateProvider> {
    service: Arc<RateService<R, P>>,
    interval: Duration,
    deadline: Duration,
}

impl<R: RateRepository, P: RateProvider> Clone for AutoRefresher<R, P> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            interval: self.interval,
            deadline: self.deadline,
        }
    }
}

impl<R: RateRepository, P: RateProvider> AutoRefresher<R, P> {
    pub fn new(service: Arc<RateService<R, P>>, interval: Duration, deadline: Duration) -> Self {
        Self {
            service,
            interval,
            deadline,
        }
    }

    #[instrument(skip_all, name = "auto_refresh")]
    pub async fn run(self, mut shutdown: ShutdownSignal) {
        info!(
            interval_secs = self.interval.as_secs(),
            deadline_secs = self.deadline.as_secs(),
            "Starting auto-refresh loop"
        );

        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let worker = self.clone();
                    tokio::spawn(async move { worker.tick().await });
                }
                _ = stopped(&mut shutdown) => break,
            }
        }

        info!("Auto-refresh loop stopped");
    }

    /// One tick: a refresh pass abandoned once the deadline passes.
    pub async fn tick(&self) -> Option<RefreshReport> {
        match tokio::time::timeout(self.deadline, self.refresh_once()).await {
            Ok(Ok(report)) => {
                info!(
                    refreshed = report.refreshed,
                    failed = report.failed,
                    "Auto-refresh tick finished"
                );
                Some(report)
            }
            Ok(Err(e)) => {
                error!(error = %e, "Failed to list pairs for auto-refresh");
                None
            }
            Err(_) => {
                warn!(
                    deadline_secs = self.deadline.as_secs(),
                    "Auto-refresh tick hit its deadline, remaining pairs skipped"
                );
                None
            }
        }
    }

    /// Refreshes every known pair sequentially. A failure for one pair is
    /// logged and does not stop the others.
    pub async fn refresh_once(&self) -> Result<RefreshReport, AppError> {
        let pairs = self.service.known_pairs().await?;

        let mut report = RefreshReport::default();
        for pair in pairs {
            match self.service.refresh_pair(&pair).await {
                Ok(row) => {
                    debug!(pair = %pair, rate = %row.rate, "Refreshed rate");
                    report.refreshed += 1;
                }
                Err(e) => {
                    warn!(pair = %pair, error = %e, "Failed to refresh rate, skipping pair");
                    report.failed += 1;
                }
            }
        }
        Ok(report)
    }
}
