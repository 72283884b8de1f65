//! Polling change watcher
//!
//! Enumerates the result store on a fixed interval and dispatches every
//! entry with a registered, not-yet-notified subscriber. A failed
//! enumeration is logged and retried on the next tick; the loop only
//! exits on the shutdown signal.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::dispatch::Dispatcher;
use crate::store::ResultStore;

/// Spawn the polling watcher task
pub fn spawn_poll_watcher(
    store: Arc<dyn ResultStore>,
    dispatcher: Dispatcher,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Poll watcher started (interval: {:?})", interval);

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.changed() => {
                    info!("Poll watcher stopping (shutdown signal)");
                    return;
                }
            }

            let results = match store.all().await {
                Ok(r) => r,
                Err(e) => {
                    warn!("Result enumeration failed, retrying next cycle: {}", e);
                    continue;
                }
            };

            debug!(results = results.len(), "Poll cycle");

            for (national_id, result) in &results {
                match dispatcher.deliver_pending(national_id, result).await {
                    Ok(true) => {
                        info!(national_id = %national_id, "Result delivered from poll cycle");
                    }
                    Ok(false) => {}
                    Err(e) => {
                        warn!(
                            national_id = %national_id,
                            "Delivery failed, identifier stays eligible: {}", e
                        );
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schemas::{Metadata, ResultDoc};
    use crate::notifier::Notifier;
    use crate::roster::Roster;
    use crate::transport::{ChatId, Transport};
    use crate::types::{HeraldError, Result};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct FakeStore {
        results: StdMutex<HashMap<String, ResultDoc>>,
        unavailable: StdMutex<bool>,
    }

    #[async_trait]
    impl ResultStore for FakeStore {
        async fn get(&self, national_id: &str) -> Result<Option<ResultDoc>> {
            Ok(self.results.lock().unwrap().get(national_id).cloned())
        }

        async fn all(&self) -> Result<HashMap<String, ResultDoc>> {
            if *self.unavailable.lock().unwrap() {
                return Err(HeraldError::Store("store unreachable".into()));
            }
            Ok(self.results.lock().unwrap().clone())
        }
    }

    #[derive(Default)]
    struct FakeTransport {
        sent: StdMutex<Vec<(ChatId, String)>>,
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn send_text(&self, chat: ChatId, text: &str) -> Result<()> {
            self.sent.lock().unwrap().push((chat, text.to_string()));
            Ok(())
        }
    }

    fn result_for(id: &str) -> ResultDoc {
        ResultDoc {
            national_id: id.to_string(),
            name: "Aya".to_string(),
            total_score: 380.0,
            total_out_of: 400.0,
            percentage: 95.0,
            metadata: Metadata::default(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_poll_delivers_pending_result_once() {
        let store = Arc::new(FakeStore::default());
        let transport = Arc::new(FakeTransport::default());
        let roster = Arc::new(Roster::new());
        let dispatcher = Dispatcher::new(roster.clone(), Notifier::new(transport.clone()));

        roster.register("12345", 42).await;
        store
            .results
            .lock()
            .unwrap()
            .insert("12345".to_string(), result_for("12345"));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = spawn_poll_watcher(
            store.clone(),
            dispatcher,
            Duration::from_millis(10),
            shutdown_rx,
        );

        // Let several cycles run; only the first may send
        tokio::time::sleep(Duration::from_millis(80)).await;
        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();

        let sent = transport.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, 42);
        assert!(roster.is_delivered("12345").await);
    }

    #[tokio::test]
    async fn test_failing_store_cycle_does_not_kill_loop() {
        let store = Arc::new(FakeStore::default());
        let transport = Arc::new(FakeTransport::default());
        let roster = Arc::new(Roster::new());
        let dispatcher = Dispatcher::new(roster.clone(), Notifier::new(transport.clone()));

        roster.register("12345", 42).await;
        *store.unavailable.lock().unwrap() = true;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = spawn_poll_watcher(
            store.clone(),
            dispatcher,
            Duration::from_millis(10),
            shutdown_rx,
        );

        // A few cycles fail, then the store recovers with a result
        tokio::time::sleep(Duration::from_millis(40)).await;
        store
            .results
            .lock()
            .unwrap()
            .insert("12345".to_string(), result_for("12345"));
        *store.unavailable.lock().unwrap() = false;

        tokio::time::sleep(Duration::from_millis(60)).await;
        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();

        assert_eq!(transport.sent.lock().unwrap().len(), 1);
        assert!(roster.is_delivered("12345").await);
    }

    #[tokio::test]
    async fn test_delivery_goes_to_latest_registration() {
        let store = Arc::new(FakeStore::default());
        let transport = Arc::new(FakeTransport::default());
        let roster = Arc::new(Roster::new());
        let dispatcher = Dispatcher::new(roster.clone(), Notifier::new(transport.clone()));

        // Registered from one chat, then re-registered from another
        // before the result is published
        roster.register("12345", 42).await;
        roster.register("12345", 7).await;
        store
            .results
            .lock()
            .unwrap()
            .insert("12345".to_string(), result_for("12345"));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = spawn_poll_watcher(
            store.clone(),
            dispatcher,
            Duration::from_millis(10),
            shutdown_rx,
        );

        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();

        let sent = transport.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, 7);
    }

    #[tokio::test]
    async fn test_unregistered_results_are_ignored() {
        let store = Arc::new(FakeStore::default());
        let transport = Arc::new(FakeTransport::default());
        let roster = Arc::new(Roster::new());
        let dispatcher = Dispatcher::new(roster.clone(), Notifier::new(transport.clone()));

        store
            .results
            .lock()
            .unwrap()
            .insert("77777".to_string(), result_for("77777"));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = spawn_poll_watcher(
            store.clone(),
            dispatcher,
            Duration::from_millis(10),
            shutdown_rx,
        );

        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();

        assert!(transport.sent.lock().unwrap().is_empty());
    }
}
