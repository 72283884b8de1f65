//! Push-based change watcher
//!
//! Drains the bounded channel fed by the store's change stream and runs
//! each changed result through the dispatcher. Additions and in-place
//! corrections are handled identically; the ledger decides whether
//! anything actually goes out. A delivery failure leaves the identifier
//! undelivered for a later observation.

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::dispatch::Dispatcher;
use crate::store::ResultChange;

/// Spawn the feed watcher task
pub fn spawn_feed_watcher(
    mut changes: mpsc::Receiver<ResultChange>,
    dispatcher: Dispatcher,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Feed watcher started");

        loop {
            let change = tokio::select! {
                c = changes.recv() => c,
                _ = shutdown.changed() => {
                    info!("Feed watcher stopping (shutdown signal)");
                    return;
                }
            };

            let Some(change) = change else {
                info!("Change feed closed, feed watcher stopping");
                return;
            };

            debug!(
                national_id = %change.national_id,
                kind = ?change.kind,
                "Change received"
            );

            match dispatcher
                .deliver_pending(&change.national_id, &change.result)
                .await
            {
                Ok(true) => {
                    info!(national_id = %change.national_id, "Result delivered from change feed");
                }
                Ok(false) => {}
                Err(e) => {
                    warn!(
                        national_id = %change.national_id,
                        "Delivery failed, identifier stays eligible: {}", e
                    );
                }
            }
        }
    })
}
