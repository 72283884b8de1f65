//! Examination result document schema
//!
//! Produced by the external grading process. Results may appear at any
//! time and may be corrected in place after first publication.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::IntoIndexes;
use crate::db::schemas::Metadata;

/// Collection name for examination results
pub const RESULT_COLLECTION: &str = "results";

/// A single subject score line
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct SubjectScore {
    /// Subject name
    pub name: String,

    /// Score obtained
    pub score: f64,

    /// Maximum score for the subject
    pub out_of: f64,
}

/// Examination result document
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ResultDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Withdrawal envelope written by the external grading process
    #[serde(default)]
    pub metadata: Metadata,

    /// National ID or seat number (the join key)
    pub national_id: String,

    /// Student full name as recorded by the grading process
    pub name: String,

    /// Education stage (e.g. preparatory, secondary)
    pub stage: String,

    /// Grade level within the stage
    pub grade_level: String,

    /// Education department
    pub education_dept: String,

    /// School name
    pub school_name: String,

    /// Free-form notes from the grading process
    #[serde(default)]
    pub notes: String,

    /// Core curriculum subjects, in publication order
    #[serde(default)]
    pub main_subjects: Vec<SubjectScore>,

    /// Non-core subjects, in publication order
    #[serde(default)]
    pub additional_subjects: Vec<SubjectScore>,

    /// Total score obtained across main subjects
    pub total_score: f64,

    /// Maximum obtainable total
    pub total_out_of: f64,

    /// Percentage (0-100)
    pub percentage: f64,
}

impl IntoIndexes for ResultDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "national_id": 1 },
            Some(
                IndexOptions::builder()
                    .unique(true)
                    .name("national_id_unique".to_string())
                    .build(),
            ),
        )]
    }
}
