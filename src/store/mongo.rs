//! MongoDB-backed result store and student directory
//!
//! Queries go through the typed collection wrapper; the push-based
//! change feed wraps a MongoDB change stream and forwards events over a
//! bounded channel so the stream reader never blocks on outbound I/O.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use bson::doc;
use futures_util::StreamExt;
use mongodb::change_stream::event::OperationType;
use mongodb::options::FullDocumentType;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{ChangeKind, ResultChange, ResultStore, StudentDirectory};
use crate::db::schemas::{ResultDoc, StudentDoc, RESULT_COLLECTION, STUDENT_COLLECTION};
use crate::db::{MongoClient, MongoCollection};
use crate::types::Result;

/// Delay before reopening a failed change stream
const STREAM_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Result store over the `results` collection
#[derive(Clone)]
pub struct MongoResultStore {
    collection: MongoCollection<ResultDoc>,
}

impl MongoResultStore {
    /// Create the store, applying collection indexes
    pub async fn new(mongo: &MongoClient) -> Result<Self> {
        let collection = mongo.collection::<ResultDoc>(RESULT_COLLECTION).await?;
        Ok(Self { collection })
    }
}

#[async_trait]
impl ResultStore for MongoResultStore {
    async fn get(&self, national_id: &str) -> Result<Option<ResultDoc>> {
        self.collection
            .find_one(doc! { "national_id": national_id })
            .await
    }

    async fn all(&self) -> Result<HashMap<String, ResultDoc>> {
        let results = self.collection.find_many(doc! {}).await?;
        Ok(results
            .into_iter()
            .map(|r| (r.national_id.clone(), r))
            .collect())
    }
}

/// Student directory over the `students` collection
#[derive(Clone)]
pub struct MongoStudentDirectory {
    collection: MongoCollection<StudentDoc>,
}

impl MongoStudentDirectory {
    /// Create the directory, applying collection indexes
    pub async fn new(mongo: &MongoClient) -> Result<Self> {
        let collection = mongo.collection::<StudentDoc>(STUDENT_COLLECTION).await?;
        Ok(Self { collection })
    }
}

#[async_trait]
impl StudentDirectory for MongoStudentDirectory {
    async fn get(&self, national_id: &str) -> Result<Option<StudentDoc>> {
        self.collection
            .find_one(doc! { "national_id": national_id })
            .await
    }
}

/// Spawn the change-stream reader for the `results` collection.
///
/// Insert, update, and replace events are forwarded as [`ResultChange`]
/// over the bounded `tx` channel; deletes are dropped. A failed or
/// closed stream is reopened after a short delay - the feed runs for
/// the lifetime of the process.
pub fn spawn_result_feed(
    store: MongoResultStore,
    tx: mpsc::Sender<ResultChange>,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Result change feed starting");

        loop {
            let open_stream = async {
                store
                    .collection
                    .inner()
                    .watch()
                    .full_document(FullDocumentType::UpdateLookup)
                    .await
            };
            let stream = tokio::select! {
                res = open_stream => res,
                _ = shutdown.changed() => {
                    info!("Result change feed stopping (shutdown signal)");
                    return;
                }
            };

            let mut stream = match stream {
                Ok(s) => {
                    info!("Result change stream opened");
                    s
                }
                Err(e) => {
                    warn!(
                        "Failed to open change stream, retrying in {:?}: {}",
                        STREAM_RETRY_DELAY, e
                    );
                    tokio::select! {
                        _ = tokio::time::sleep(STREAM_RETRY_DELAY) => continue,
                        _ = shutdown.changed() => {
                            info!("Result change feed stopping (shutdown signal)");
                            return;
                        }
                    }
                }
            };

            loop {
                let event = tokio::select! {
                    ev = stream.next() => ev,
                    _ = shutdown.changed() => {
                        info!("Result change feed stopping (shutdown signal)");
                        return;
                    }
                };

                let event = match event {
                    Some(Ok(ev)) => ev,
                    Some(Err(e)) => {
                        warn!("Change stream error, reopening: {}", e);
                        break;
                    }
                    None => {
                        warn!("Change stream closed, reopening");
                        break;
                    }
                };

                let kind = match event.operation_type {
                    OperationType::Insert => ChangeKind::Added,
                    OperationType::Update | OperationType::Replace => ChangeKind::Modified,
                    other => {
                        debug!(operation = ?other, "Ignoring change stream event");
                        continue;
                    }
                };

                let Some(result) = event.full_document else {
                    debug!("Change event without full document, skipping");
                    continue;
                };

                let change = ResultChange {
                    national_id: result.national_id.clone(),
                    result,
                    kind,
                };

                if tx.send(change).await.is_err() {
                    info!("Change feed channel closed, stopping reader");
                    return;
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(STREAM_RETRY_DELAY) => {}
                _ = shutdown.changed() => {
                    info!("Result change feed stopping (shutdown signal)");
                    return;
                }
            }
        }
    })
}
