//! Periodic promotion of staged quotes.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, instrument};

use rates_types::{AppError, ConfirmedRate, RateProvider, RateRepository};

use super::{ShutdownSignal, stopped};
use crate::RateService;

/// Confirms one staged quote per interval.
pub struct QueueConfirmer<R: RateRepository, P: RateProvider> {
    service: Arc<RateService<R, P>>,
    interval: Duration,
}

impl<R: RateRepository, P: RateProvider> QueueConfirmer<R, P> {
    pub fn new(service: Arc<RateService<R, P>>, interval: Duration) -> Self {
        Self { service, interval }
    }

    #[instrument(skip_all, name = "queue_confirmer")]
    pub async fn run(self, mut shutdown: ShutdownSignal) {
        info!(
            interval_secs = self.interval.as_secs(),
            "Starting queue confirmer"
        );

        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.confirm_once().await;
                }
                _ = stopped(&mut shutdown) => break,
            }
        }

        info!("Queue confirmer stopped");
    }

    /// Promotes at most one staged quote. Returns the new history row, if any.
    pub async fn confirm_once(&self) -> Option<ConfirmedRate> {
        match self.service.confirm().await {
            Ok(row) => {
                info!(
                    rate_id = %row.id,
                    pair = %row.pair(),
                    rate = %row.rate,
                    "Confirmed staged quote"
                );
                Some(row)
            }
            Err(AppError::EmptyQueue) => {
                debug!("Queue is empty, nothing to confirm");
                None
            }
            Err(e) => {
                error!(error = %e, "Failed to confirm staged quote");
                None
            }
        }
    }
}
