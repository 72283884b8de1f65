//! MongoDB client and document schemas

pub mod mongo;
pub mod schemas;

pub use mongo::{MongoClient, MongoCollection};
