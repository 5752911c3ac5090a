//! Output handler traits and error types
//!
//! This module defines the interface every sink of a finished collection
//! implements.

use crate::model::Collection;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to serialize collection: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// A destination for the collection produced by one run
pub trait OutputHandler {
    /// Short name used in log lines
    fn name(&self) -> &str;

    /// Persists the whole collection, replacing what a previous run wrote
    fn write_collection(&mut self, collection: &Collection) -> OutputResult<()>;
}
