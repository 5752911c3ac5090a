//! Output module for persisting crawl results
//!
//! This module handles:
//! - Writing the collection as a JSON document
//! - Mirroring the collection into SQLite
//! - Recording crawl statistics

mod json;
mod sqlite;
pub mod stats;
mod traits;

pub use json::{read_collection, to_json_string, JsonOutput};
pub use sqlite::SqliteOutput;
pub use stats::{print_statistics, CrawlStats};
pub use traits::{OutputError, OutputHandler, OutputResult};

use crate::config::OutputConfig;
use crate::model::Collection;
use std::path::Path;

/// Builds the handlers named by the output configuration
///
/// The JSON document is always written; the SQLite mirror only when a
/// database path is configured.
pub fn handlers_for(config: &OutputConfig) -> OutputResult<Vec<Box<dyn OutputHandler>>> {
    let mut handlers: Vec<Box<dyn OutputHandler>> = vec![Box::new(JsonOutput::new(&config.json_path))];
    if let Some(database_path) = &config.database_path {
        handlers.push(Box::new(SqliteOutput::open(Path::new(database_path))?));
    }
    Ok(handlers)
}

/// Writes `collection` through every configured handler
pub fn write_all(config: &OutputConfig, collection: &Collection) -> OutputResult<()> {
    for mut handler in handlers_for(config)? {
        tracing::debug!("Writing collection via {} output", handler.name());
        handler.write_collection(collection)?;
    }
    Ok(())
}
