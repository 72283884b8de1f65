//! Document schemas for Herald collections

pub mod metadata;
pub mod result;
pub mod student;

pub use metadata::Metadata;
pub use result::{ResultDoc, SubjectScore, RESULT_COLLECTION};
pub use student::{StudentDoc, STUDENT_COLLECTION};
