//! Student directory document schema
//!
//! Reference identity data owned by the external directory. Read-only
//! from Herald's perspective.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::IntoIndexes;
use crate::db::schemas::Metadata;

/// Collection name for the student directory
pub const STUDENT_COLLECTION: &str = "students";

/// Student directory document
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct StudentDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Withdrawal envelope written by the external directory process
    #[serde(default)]
    pub metadata: Metadata,

    /// National ID or seat number (the join key)
    pub national_id: String,

    /// Student full name
    pub name: String,

    /// School name
    pub school: String,

    /// Administrative education division
    pub admin_division: String,

    /// Governorate
    pub governorate: String,
}

impl StudentDoc {
    /// Create a new student document
    pub fn new(
        national_id: String,
        name: String,
        school: String,
        admin_division: String,
        governorate: String,
    ) -> Self {
        Self {
            _id: None,
            metadata: Metadata::default(),
            national_id,
            name,
            school,
            admin_division,
            governorate,
        }
    }
}

impl IntoIndexes for StudentDoc {
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
