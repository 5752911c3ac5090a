//! MediaWiki API lookups for images
//!
//! Complements the HTML heuristics in [`super::images`]:
//! - `imageinfo` adds size and license to a file the article links
//! - `pageimages` finds a lead image for articles without an inline one
//!
//! Every lookup is best-effort. A missing endpoint, a failed request or an
//! unexpected response yields `None`.

use crate::crawler::PageFetcher;
use crate::model::ImageRef;
use crate::url::decoded_segment;
use crate::FetchCause;
use serde_json::Value;
use url::Url;

/// Endpoint paths tried in order
pub const DEFAULT_API_PATHS: &[&str] = &["/w/api.php", "/api.php"];

/// Keys of `extmetadata` carrying the file's license, preferred first
const LICENSE_KEYS: &[&str] = &["LicenseShortName", "License", "Credit"];

/// File metadata reported by `prop=imageinfo`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageInfo {
    pub file_url: Option<String>,
    pub width: Option<u64>,
    pub height: Option<u64>,
    pub size_bytes: Option<u64>,
    pub license: Option<String>,
}

impl ImageInfo {
    /// Copies the metadata into `image`
    ///
    /// A file URL already found on the file-description page is kept.
    pub fn apply_to(&self, image: &mut ImageRef) {
        if image.file_url.is_none() {
            image.file_url = self.file_url.clone();
        }
        image.width = self.width.or(image.width);
        image.height = self.height.or(image.height);
        image.size_bytes = self.size_bytes.or(image.size_bytes);
        image.license = self.license.clone().or(image.license.take());
    }
}

/// Client for the query module of a MediaWiki API
#[derive(Debug, Clone)]
pub struct MediaWikiApi {
    base_url: Url,
    paths: Vec<String>,
}

impl MediaWikiApi {
    /// Creates a client trying each of `paths` on `base_url` in turn
    pub fn new<I, P>(base_url: Url, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self {
            base_url,
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    /// Looks up url, size and license of `file_title` (without namespace)
    pub async fn image_info(&self, fetcher: &PageFetcher, file_title: &str) -> Option<ImageInfo> {
        let title = format!("File:{}", file_title);
        let response = self
            .query(
                fetcher,
                &[
                    ("titles", title.as_str()),
                    ("prop", "imageinfo"),
                    ("iiprop", "url|size|mime|extmetadata"),
                ],
            )
            .await?;
        let info = parse_image_info(&response);
        if info.is_none() {
            tracing::debug!("No imageinfo for {}", title);
        }
        info
    }

    /// Looks up the lead image of the article at `source_url`
    pub async fn lead_image(&self, fetcher: &PageFetcher, source_url: &str) -> Option<ImageRef> {
        let title = decoded_segment(source_url);
        if title.is_empty() {
            return None;
        }
        let response = self
            .query(
                fetcher,
                &[
                    ("titles", title.as_str()),
                    ("prop", "pageimages"),
                    ("piprop", "original|name"),
                ],
            )
            .await?;
        parse_lead_image(&response)
    }

    /// Runs one `action=query` request, returning the first JSON answer
    async fn query(&self, fetcher: &PageFetcher, params: &[(&str, &str)]) -> Option<Value> {
        for path in &self.paths {
            let mut endpoint = match self.base_url.join(path) {
                Ok(endpoint) => endpoint,
                Err(e) => {
                    tracing::warn!("Invalid API path {}: {}", path, e);
                    continue;
                }
            };
            endpoint
                .query_pairs_mut()
                .append_pair("action", "query")
                .extend_pairs(params)
                .append_pair("format", "json")
                .append_pair("formatversion", "2");

            match fetcher.fetch(endpoint.as_str()).await {
                Ok(body) => match serde_json::from_str::<Value>(&body) {
                    Ok(value) => return Some(value),
                    Err(e) => tracing::debug!("Unreadable API response from {}: {}", endpoint, e),
                },
                Err(e) if e.cause == FetchCause::Status(404) => {
                    tracing::debug!("No API endpoint at {}", endpoint);
                }
                Err(e) => tracing::warn!("API request failed: {}", e),
            }
        }
        None
    }
}

/// Reads the first page's first `imageinfo` entry
pub fn parse_image_info(response: &Value) -> Option<ImageInfo> {
    let info = response.pointer("/query/pages/0/imageinfo/0")?;
    let license = info.get("extmetadata").and_then(|ext| {
        LICENSE_KEYS
            .iter()
            .filter_map(|key| ext.get(*key))
            .find_map(metadata_text)
    });

    Some(ImageInfo {
        file_url: info.get("url").and_then(Value::as_str).map(str::to_string),
        width: info.get("width").and_then(Value::as_u64),
        height: info.get("height").and_then(Value::as_u64),
        size_bytes: info.get("size").and_then(Value::as_u64),
        license,
    })
}

/// Reads the first page's `pageimages` original
pub fn parse_lead_image(response: &Value) -> Option<ImageRef> {
    let page = response.pointer("/query/pages/0")?;
    let original = page.get("original")?;
    let source = original.get("source").and_then(Value::as_str)?;

    Some(ImageRef {
        file_url: Some(source.to_string()),
        file_title: page
            .get("pageimage")
            .and_then(Value::as_str)
            .map(str::to_string),
        width: original.get("width").and_then(Value::as_u64),
        height: original.get("height").and_then(Value::as_u64),
        ..Default::default()
    })
}

/// `extmetadata` entries are `{ "value": ... }` objects; older wikis use
/// plain strings
fn metadata_text(field: &Value) -> Option<String> {
    let text = match field {
        Value::Object(map) => map.get("value").and_then(Value::as_str)?,
        Value::String(text) => text.as_str(),
        _ => return None,
    };
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}
