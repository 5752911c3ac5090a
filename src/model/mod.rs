//! Herb record data model
//!
//! These are the types handed across the output boundary. Field order and
//! the sorted section map keep the serialized form stable between runs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One extracted entity per source page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HerbRecord {
    /// Lookup key derived from the final path segment of `source_url`
    pub id: String,

    /// Canonical absolute URL of the originating page
    pub source_url: String,

    /// Page title; empty when the page has no main heading
    pub name: String,

    /// First non-empty descriptive paragraph
    pub summary: Option<String>,

    /// Canonical heading key -> raw section text
    pub sections: BTreeMap<String, String>,

    /// Associated images, primary first
    pub images: Vec<ImageRef>,

    /// Attribution terms of the source
    pub license: String,
}

impl HerbRecord {
    /// Creates an empty record for `source_url`
    ///
    /// `id` and `license` are assigned by the orchestrator once the record
    /// is accepted into a collection.
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            source_url: source_url.into(),
            name: String::new(),
            summary: None,
            sections: BTreeMap::new(),
            images: Vec::new(),
            license: String::new(),
        }
    }

    /// The image consumers should display, if any
    pub fn primary_image(&self) -> Option<&ImageRef> {
        self.images.first()
    }

    pub fn primary_image_mut(&mut self) -> Option<&mut ImageRef> {
        self.images.first_mut()
    }
}

/// One image associated with a record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    /// Intermediate file-description page
    pub page_url: Option<String>,

    /// Directly embedded low-resolution preview
    pub thumb_url: Option<String>,

    /// Final binary asset, filled in by the image resolver
    pub file_url: Option<String>,

    /// Percent-decoded file name, without namespace prefix
    pub file_title: Option<String>,

    /// Pixel width reported by the wiki API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u64>,

    /// Pixel height reported by the wiki API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,

    /// License of the image file itself, when the wiki records one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
}

/// The ordered records produced by one crawl run
///
/// Appended to monotonically by a single producer; records are never
/// removed once pushed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Collection {
    records: Vec<HerbRecord>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a finished record
    pub fn push(&mut self, record: HerbRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[HerbRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HerbRecord> {
        self.records.iter()
    }

    /// Finds a record by its id
    pub fn get(&self, id: &str) -> Option<&HerbRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    /// Returns true if a record already uses `id`
    pub fn contains_id(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn into_records(self) -> Vec<HerbRecord> {
        self.records
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a HerbRecord;
    type IntoIter = std::slice::Iter<'a, HerbRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
