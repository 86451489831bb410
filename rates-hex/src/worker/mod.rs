//! Background workers.
//!
//! Both workers stop when the shutdown channel flips to `true` or its sender
//! is dropped.

mod confirm;
mod refresh;

use tokio::sync::watch;

pub use confirm::QueueConfirmer;
pub use refresh::{AutoRefresher, RefreshReport};

/// Receiving end handed to each worker.
pub type ShutdownSignal = watch::Receiver<bool>;

/// Creates the channel used to stop every worker at once.
pub fn shutdown_channel() -> (watch::Sender<bool>, ShutdownSignal) {
    watch::channel(false)
}

/// Waits until shutdown is requested.
pub(crate) async fn stopped(signal: &mut ShutdownSignal) {
    while !*signal.borrow_and_update() {
        if signal.changed().await.is_err() {
            return;
        }
    }
}
