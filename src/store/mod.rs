//! Result store and student directory adapters
//!
//! The pipeline consumes two external datasets through trait seams:
//! the student directory (identity reference data) and the result store
//! (examination outcomes, appended and corrected by the grading
//! process). Backends: MongoDB collections ([`mongo`]) and a flat JSON
//! snapshot file ([`snapshot`]).

pub mod mongo;
pub mod snapshot;

use std::collections::HashMap;

use async_trait::async_trait;

use crate::db::schemas::{ResultDoc, StudentDoc};
use crate::types::Result;

pub use mongo::{spawn_result_feed, MongoResultStore, MongoStudentDirectory};
pub use snapshot::{SnapshotDirectory, SnapshotStore};

/// What happened to a result in the change feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// Result published for the first time
    Added,
    /// Existing result corrected in place
    Modified,
}

/// A single entry from the result change feed (deletions are not surfaced)
#[derive(Debug, Clone)]
pub struct ResultChange {
    /// National ID the result belongs to
    pub national_id: String,
    /// The result as of this change
    pub result: ResultDoc,
    /// Added or Modified
    pub kind: ChangeKind,
}

/// Queryable, enumerable store of examination results
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Fetch the result for one identifier
    async fn get(&self, national_id: &str) -> Result<Option<ResultDoc>>;

    /// Enumerate the full current result set, keyed by national ID.
    ///
    /// A failed enumeration is transient (`HeraldError::Store`); callers
    /// in the watcher retry on the next cycle rather than terminate.
    async fn all(&self) -> Result<HashMap<String, ResultDoc>>;
}

/// Read-only student identity directory
#[async_trait]
pub trait StudentDirectory: Send + Sync {
    /// Fetch the directory record for one identifier
    async fn get(&self, national_id: &str) -> Result<Option<StudentDoc>>;
}
