//! Candidate link discovery on the category index
//!
//! Collects article links from the category page's content area and returns
//! them deduplicated and sorted so every run walks candidates in the same
//! order.

use crate::extract::{content_root, selector};
use crate::url::resolve_url;
use scraper::{ElementRef, Html};
use std::collections::BTreeSet;
use url::Url;

/// Discovers article URLs listed on a category index
#[derive(Debug, Clone)]
pub struct LinkDiscoverer {
    base_url: Url,
    category_path: String,
}

impl LinkDiscoverer {
    /// Creates a discoverer for the category at `category_path` on `base_url`
    pub fn new(base_url: Url, category_path: impl Into<String>) -> Self {
        Self {
            base_url,
            category_path: category_path.into(),
        }
    }

    /// Absolute URL of the category index page
    pub fn category_url(&self) -> String {
        resolve_url(&self.category_path, &self.base_url).unwrap_or_default()
    }

    /// Extracts the sorted candidate article URLs from category markup
    pub fn discover(&self, markup: &str) -> Vec<String> {
        discover_links(markup, &self.base_url, &self.category_path)
    }
}

/// Containers of the member listing on a category page, most specific first
const MEMBER_LIST_SELECTORS: &[&str] = &["#mw-pages", ".mw-category"];

/// Extracts candidate article URLs from a category index page
///
/// # Link Selection Rules
///
/// **Include:**
/// - Root-relative `<a href="/...">` targets inside the member listing
///   (`#mw-pages`, else `.mw-category`, else the content area)
///
/// **Exclude:**
/// - Protocol-relative targets (`//host/...`) and the bare site root
/// - Any target containing `:` (files, categories, special and talk pages)
/// - The category's own link
/// - Targets resolving outside the site origin
///
/// Fragments are dropped before deduplication. The result is sorted
/// ascending and contains no duplicates.
///
/// # Example
///
/// ```
/// use herbar::extract::discover_links;
/// use url::Url;
///
/// let html = r#"<div id="mw-content-text"><div class="mw-parser-output">
///     <a href="/Mata">Máta</a><a href="/Bazalka">Bazalka</a>
///     <a href="/Soubor:Mata.jpg">obrázek</a><a href="/Mata">Máta</a>
/// </div></div>"#;
/// let base = Url::parse("https://www.wikifood.cz").unwrap();
/// let links = discover_links(html, &base, "/Kategorie:Bylinky");
/// assert_eq!(
///     links,
///     vec!["https://www.wikifood.cz/Bazalka", "https://www.wikifood.cz/Mata"]
/// );
/// ```
pub fn discover_links(markup: &str, base_url: &Url, category_path: &str) -> Vec<String> {
    let document = Html::parse_document(markup);
    let root = member_list(&document);
    let origin = format!("{}/", base_url.origin().ascii_serialization());
    let category_url = resolve_url(category_path, base_url);

    let mut links = BTreeSet::new();
    let Some(anchors) = selector("a[href]") else {
        return Vec::new();
    };

    for anchor in root.select(&anchors) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let href = href.trim();
        let href = href.split('#').next().unwrap_or_default();

        if !href.starts_with('/') || href.starts_with("//") || href == "/" {
            continue;
        }

        if href.contains(':') {
            tracing::trace!("Skipping namespaced link {}", href);
            continue;
        }

        let Some(absolute) = resolve_url(href, base_url) else {
            continue;
        };

        if Some(&absolute) == category_url.as_ref() || !absolute.starts_with(&origin) {
            continue;
        }

        links.insert(absolute);
    }

    tracing::debug!("Discovered {} candidate links", links.len());
    links.into_iter().collect()
}

/// The element holding the category's member links
///
/// MediaWiki renders the listing next to, not inside, the category
/// description, so the generic content root is only the last resort.
fn member_list(document: &Html) -> ElementRef<'_> {
    for css in MEMBER_LIST_SELECTORS {
        let Some(selector) = selector(css) else {
            continue;
        };
        if let Some(found) = document.select(&selector).next() {
            return found;
        }
    }
    content_root(document)
}
