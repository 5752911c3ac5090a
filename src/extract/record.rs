//! Record extraction from article markup
//!
//! Pulls the title, summary, primary image reference and normalized sections
//! out of one article page. Source pages are inconsistently structured, so
//! every step is best-effort.

use crate::config::DuplicateHeadingPolicy;
use crate::extract::{content_root, element_text, select_first, selector, HeadingNormalizer};
use crate::model::{HerbRecord, ImageRef};
use crate::url::{file_title, resolve_url};
use scraper::{ElementRef, Html};
use std::collections::BTreeMap;
use url::Url;

/// Section boundary tags
const SECTION_TAGS: &[&str] = &["h2", "h3"];

/// Extracts herb records from article markup
#[derive(Debug, Clone)]
pub struct RecordExtractor {
    base_url: Url,
    normalizer: HeadingNormalizer,
    duplicates: DuplicateHeadingPolicy,
}

impl RecordExtractor {
    /// Creates an extractor resolving relative URLs against `base_url`
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            normalizer: HeadingNormalizer::new(),
            duplicates: DuplicateHeadingPolicy::default(),
        }
    }

    pub fn with_normalizer(mut self, normalizer: HeadingNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicateHeadingPolicy) -> Self {
        self.duplicates = policy;
        self
    }

    /// Parses one article page into a record
    ///
    /// # Extraction Rules
    ///
    /// - **name**: text of `#firstHeading` (or the first `h1`), empty if absent
    /// - **summary**: first non-empty paragraph of the content area
    /// - **images**: the first image link in the content area, with its
    ///   thumbnail and file-description page resolved to absolute URLs
    /// - **sections**: one entry per `h2`/`h3` with a non-empty label, keyed
    ///   by the normalized label and holding the text of every sibling up to
    ///   the next `h2`/`h3`
    ///
    /// `id` and `license` are left empty for the orchestrator to fill in.
    pub fn extract(&self, markup: &str, source_url: &str) -> HerbRecord {
        let document = Html::parse_document(markup);
        let root = content_root(&document);

        let mut record = HerbRecord::new(source_url);
        record.name = extract_title(&document);
        record.summary = extract_summary(root);
        record.images.extend(self.extract_image(root));
        record.sections = self.extract_sections(root);

        tracing::debug!(
            "Extracted '{}' from {}: {} sections, {} images",
            record.name,
            source_url,
            record.sections.len(),
            record.images.len()
        );

        record
    }

    fn extract_image(&self, root: ElementRef<'_>) -> Option<ImageRef> {
        let anchor = select_first(root, "a.image, a.mw-file-description")?;

        let thumb_url = select_first(anchor, "img")
            .and_then(|img| img.value().attr("src"))
            .and_then(|src| resolve_url(src, &self.base_url));
        let href = anchor.value().attr("href");
        let page_url = href.and_then(|href| resolve_url(href, &self.base_url));

        Some(ImageRef {
            page_url,
            thumb_url,
            file_title: href.and_then(file_title),
            ..Default::default()
        })
    }

    fn extract_sections(&self, root: ElementRef<'_>) -> BTreeMap<String, String> {
        let mut sections = BTreeMap::new();
        let Some(heading_selector) = selector("h2, h3") else {
            return sections;
        };

        for heading in root.select(&heading_selector) {
            if is_toc_heading(heading) {
                continue;
            }
            let label = heading_label(heading);
            if label.is_empty() {
                continue;
            }
            // Punctuation-only labels have no usable key
            let key = self.normalizer.normalize(&label);
            if key.is_empty() {
                continue;
            }
            let text = section_text(heading);
            self.insert_section(&mut sections, key, text);
        }

        sections
    }

    fn insert_section(&self, sections: &mut BTreeMap<String, String>, key: String, text: String) {
        match self.duplicates {
            DuplicateHeadingPolicy::LastWins => {
                if let Some(previous) = sections.insert(key.clone(), text) {
                    tracing::debug!("Section '{}' replaced ({} chars dropped)", key, previous.len());
                }
            }
            DuplicateHeadingPolicy::FirstWins => {
                sections.entry(key).or_insert(text);
            }
            DuplicateHeadingPolicy::Merge => {
                let merged = sections.entry(key).or_default();
                if merged.is_empty() {
                    *merged = text;
                } else if !text.is_empty() {
                    merged.push_str("\n\n");
                    merged.push_str(&text);
                }
            }
        }
    }
}

fn extract_title(document: &Html) -> String {
    let root = document.root_element();
    select_first(root, "#firstHeading")
        .or_else(|| select_first(root, "h1"))
        .map(element_text)
        .unwrap_or_default()
}

fn extract_summary(root: ElementRef<'_>) -> Option<String> {
    let direct = root
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "p")
        .filter(|el| !el.value().classes().any(|c| c == "mw-empty-elt"))
        .map(element_text)
        .find(|text| !text.is_empty());
    if direct.is_some() {
        return direct;
    }

    let paragraphs = selector("p")?;
    let nested = root
        .select(&paragraphs)
        .map(element_text)
        .find(|text| !text.is_empty());
    nested
}

/// Visible label of a heading, preferring the legacy `.mw-headline` span
fn heading_label(heading: ElementRef<'_>) -> String {
    match select_first(heading, ".mw-headline") {
        Some(headline) => element_text(headline),
        None => element_text(heading),
    }
}

/// Text between a heading and the next section boundary
fn section_text(heading: ElementRef<'_>) -> String {
    let anchor = heading_wrapper(heading).unwrap_or(heading);
    let mut parts = Vec::new();

    for sibling in anchor.next_siblings() {
        if let Some(element) = ElementRef::wrap(sibling) {
            if is_section_boundary(element) {
                break;
            }
            let text = element_text(element);
            if !text.is_empty() {
                parts.push(text);
            }
        } else if let Some(text) = sibling.value().as_text() {
            let text = text.trim();
            if !text.is_empty() {
                parts.push(text.to_string());
            }
        }
    }

    parts.join("\n")
}

/// The "Contents" title of a generated table of contents
fn is_toc_heading(heading: ElementRef<'_>) -> bool {
    if heading.value().id() == Some("mw-toc-heading") {
        return true;
    }
    heading.ancestors().filter_map(ElementRef::wrap).any(|ancestor| {
        let value = ancestor.value();
        value.id() == Some("toc") || value.classes().any(|c| c == "toc" || c == "toctitle")
    })
}

/// The `div.mw-heading` newer wikis wrap headings in, if any
fn heading_wrapper(heading: ElementRef<'_>) -> Option<ElementRef<'_>> {
    let parent = heading.parent().and_then(ElementRef::wrap)?;
    let is_wrapper =
        parent.value().name() == "div" && parent.value().classes().any(|c| c == "mw-heading");
    is_wrapper.then_some(parent)
}

fn is_section_boundary(element: ElementRef<'_>) -> bool {
    let value = element.value();
    if SECTION_TAGS.contains(&value.name()) {
        return true;
    }
    value.name() == "div"
        && value.classes().any(|c| c == "mw-heading")
        && element
            .children()
            .filter_map(ElementRef::wrap)
            .any(|child| SECTION_TAGS.contains(&child.value().name()))
}
