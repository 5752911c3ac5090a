//! Extraction of structured data from fetched wiki markup
//!
//! This module turns raw page markup into herb records:
//! - Heading normalization to canonical section keys
//! - Record extraction (title, summary, sections, primary image)
//! - Candidate link discovery on the category index
//!
//! Every function here is pure and best-effort: missing structure yields
//! empty or absent fields, never an error.

mod discover;
mod heading;
mod record;

pub use discover::{discover_links, LinkDiscoverer};
pub use heading::{clean_heading, normalize_heading, HeadingNormalizer};
pub use record::RecordExtractor;

use scraper::{ElementRef, Html, Selector};

/// Candidate containers for the article body, most specific first
const CONTENT_SELECTORS: &[&str] = &[
    "#mw-content-text .mw-parser-output",
    "#mw-content-text",
    "#bodyContent",
    "body",
];

/// Elements whose text never belongs to extracted content
const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript"];

/// Classes whose text never belongs to extracted content
const SKIPPED_CLASSES: &[&str] = &["mw-editsection"];

/// Parses a CSS selector, logging instead of failing on a bad pattern
pub(crate) fn selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(selector) => Some(selector),
        Err(e) => {
            tracing::error!("Invalid selector '{}': {:?}", css, e);
            None
        }
    }
}

/// Selects the main content area of a wiki page
pub(crate) fn content_root(document: &Html) -> ElementRef<'_> {
    for css in CONTENT_SELECTORS {
        let Some(selector) = selector(css) else {
            continue;
        };
        if let Some(found) = document.select(&selector).next() {
            return found;
        }
    }
    document.root_element()
}

/// Returns the first element under `scope` matching `css`
pub(crate) fn select_first<'a>(scope: ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
    let selector = selector(css)?;
    let found = scope.select(&selector).next();
    found
}

/// Collects the visible text of an element, trimmed
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    let mut buf = String::new();
    collect_text(element, &mut buf);
    buf.trim().to_string()
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    if is_skipped(element) {
        return;
    }
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child_element) = ElementRef::wrap(child) {
            collect_text(child_element, out);
        }
    }
}

fn is_skipped(element: ElementRef<'_>) -> bool {
    let value = element.value();
    SKIPPED_TAGS.contains(&value.name())
        || value
            .classes()
            .any(|class_name| SKIPPED_CLASSES.contains(&class_name))
}
