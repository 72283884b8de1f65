//! Withdrawal envelope shared by directory and result documents
//!
//! The grading process corrects results in place and occasionally pulls
//! one back entirely (a disputed mark, a mis-keyed national ID). Herald
//! never writes these fields; it only honors `is_deleted` so withdrawn
//! documents stop matching reads, and carries `updated_at` so a
//! correction is visible in the stored document.

use bson::DateTime;
use serde::{Deserialize, Serialize};

/// Envelope written by the external grading/directory process
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Metadata {
    /// Whether the document has been withdrawn; withdrawn documents are
    /// excluded from every read
    #[serde(default)]
    pub is_deleted: bool,

    /// When the document was last corrected in place
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schemas::ResultDoc;

    #[test]
    fn test_absent_envelope_defaults_to_live() {
        // Documents written before the envelope existed carry no
        // metadata field at all
        let raw = r#"{
            "national_id": "12345",
            "name": "Aya",
            "stage": "secondary",
            "grade_level": "3",
            "education_dept": "East",
            "school_name": "X",
            "total_score": 380.0,
            "total_out_of": 400.0,
            "percentage": 95.0
        }"#;

        let result: ResultDoc = serde_json::from_str(raw).unwrap();
        assert!(!result.metadata.is_deleted);
        assert!(result.metadata.updated_at.is_none());
    }

    #[test]
    fn test_withdrawn_flag_round_trips() {
        let metadata = Metadata {
            is_deleted: true,
            updated_at: None,
        };

        let raw = serde_json::to_string(&metadata).unwrap();
        let back: Metadata = serde_json::from_str(&raw).unwrap();
        assert!(back.is_deleted);
    }
}
