//! JSON document output
//!
//! Writes the collection as one pretty-printed array of records, the form
//! the downstream reader loads wholesale and indexes by `id`.

use crate::model::Collection;
use crate::output::traits::{OutputHandler, OutputResult};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Writes collections to a JSON file
#[derive(Debug, Clone)]
pub struct JsonOutput {
    path: PathBuf,
}

impl JsonOutput {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl OutputHandler for JsonOutput {
    fn name(&self) -> &str {
        "json"
    }

    fn write_collection(&mut self, collection: &Collection) -> OutputResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        // Write to a sibling file first so readers never see a partial document
        let staging = self.path.with_extension("json.tmp");
        {
            let mut writer = BufWriter::new(File::create(&staging)?);
            writer.write_all(to_json_string(collection)?.as_bytes())?;
            writer.flush()?;
        }
        fs::rename(&staging, &self.path)?;

        tracing::info!(
            "Wrote {} records to {}",
            collection.len(),
            self.path.display()
        );
        Ok(())
    }
}

/// Serializes a collection to the JSON document format
pub fn to_json_string(collection: &Collection) -> OutputResult<String> {
    let mut json = serde_json::to_string_pretty(collection)?;
    json.push('\n');
    Ok(json)
}

/// Reads a collection back from a JSON document
pub fn read_collection(path: &Path) -> OutputResult<Collection> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
