//! Shared error and result types for Herald

use thiserror::Error;

/// Herald error type
#[derive(Error, Debug)]
pub enum HeraldError {
    /// Identifier absent from the student directory (user-facing, recoverable)
    #[error("identifier not found in student directory")]
    NotFound,

    /// Result store or directory query failed (transient, retried next cycle)
    #[error("store error: {0}")]
    Store(String),

    /// Transport rejected an outbound send (id stays eligible for retry)
    #[error("delivery error: {0}")]
    Delivery(String),

    /// Missing or invalid bootstrap parameter (fatal at startup only)
    #[error("configuration error: {0}")]
    Config(String),

    /// Inbound update poll failed (logged by the poll loop and retried)
    #[error("transport error: {0}")]
    Transport(String),
}

/// Result type alias using HeraldError
pub type Result<T> = std::result::Result<T, HeraldError>;
