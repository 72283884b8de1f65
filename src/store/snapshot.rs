//! Flat snapshot-file result store
//!
//! Reads the full result set from a JSON file mapping national ID to
//! result document. The file is re-read on every call, so the grading
//! process can swap in a new snapshot at any time. A missing or
//! unparsable file is a transient store error for that cycle, not a
//! fatal condition. Polling only - this backend has no change feed.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;

use super::{ResultStore, StudentDirectory};
use crate::db::schemas::{ResultDoc, StudentDoc};
use crate::types::{HeraldError, Result};

/// Result store backed by a flat JSON snapshot file
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    /// Create a store reading from `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn read_snapshot(&self) -> Result<HashMap<String, ResultDoc>> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            HeraldError::Store(format!(
                "Failed to read snapshot {}: {}",
                self.path.display(),
                e
            ))
        })?;

        serde_json::from_slice(&bytes).map_err(|e| {
            HeraldError::Store(format!(
                "Failed to parse snapshot {}: {}",
                self.path.display(),
                e
            ))
        })
    }
}

#[async_trait]
impl ResultStore for SnapshotStore {
    async fn get(&self, national_id: &str) -> Result<Option<ResultDoc>> {
        let mut snapshot = self.read_snapshot().await?;
        Ok(snapshot.remove(national_id))
    }

    async fn all(&self) -> Result<HashMap<String, ResultDoc>> {
        self.read_snapshot().await
    }
}

/// Student directory backed by a flat JSON snapshot file
///
/// Same format as [`SnapshotStore`] but mapping national ID to the
/// directory record. Used alongside the snapshot result store when no
/// MongoDB is available.
#[derive(Debug, Clone)]
pub struct SnapshotDirectory {
    path: PathBuf,
}

impl SnapshotDirectory {
    /// Create a directory reading from `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl StudentDirectory for SnapshotDirectory {
    async fn get(&self, national_id: &str) -> Result<Option<StudentDoc>> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            HeraldError::Store(format!(
                "Failed to read directory snapshot {}: {}",
                self.path.display(),
                e
            ))
        })?;

        let mut records: HashMap<String, StudentDoc> =
            serde_json::from_slice(&bytes).map_err(|e| {
                HeraldError::Store(format!(
                    "Failed to parse directory snapshot {}: {}",
                    self.path.display(),
                    e
                ))
            })?;

        Ok(records.remove(national_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_snapshot(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[tokio::test]
    async fn test_get_and_all() {
        let file = write_snapshot(
            r#"{
                "12345": {
                    "national_id": "12345",
                    "name": "Aya",
                    "stage": "secondary",
                    "grade_level": "3",
                    "education_dept": "East",
                    "school_name": "X",
                    "notes": "",
                    "main_subjects": [{"name": "Math", "score": 95.0, "out_of": 100.0}],
                    "additional_subjects": [],
                    "total_score": 380.0,
                    "total_out_of": 400.0,
                    "percentage": 95.0
                }
            }"#,
        );

        let store = SnapshotStore::new(file.path());

        let result = store.get("12345").await.unwrap().unwrap();
        assert_eq!(result.name, "Aya");
        assert_eq!(result.total_score, 380.0);
        assert_eq!(result.main_subjects.len(), 1);

        assert!(store.get("99999").await.unwrap().is_none());
        assert_eq!(store.all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_file_is_store_error() {
        let store = SnapshotStore::new("/nonexistent/results.json");
        let err = store.all().await.unwrap_err();
        assert!(matches!(err, HeraldError::Store(_)));
    }

    #[tokio::test]
    async fn test_invalid_json_is_store_error() {
        let file = write_snapshot("not json");
        let store = SnapshotStore::new(file.path());
        let err = store.all().await.unwrap_err();
        assert!(matches!(err, HeraldError::Store(_)));
    }
}
