//! Image resolution
//!
//! Follows an image's file-description page to the final binary asset.
//! Locating the asset link is site-specific, so it sits behind the
//! [`ImageLinkStrategy`] trait. When a wiki API is configured it adds file
//! metadata and supplies lead images for articles without an inline one.

use crate::crawler::media_api::MediaWikiApi;
use crate::crawler::PageFetcher;
use crate::extract::selector;
use crate::model::ImageRef;
use crate::url::resolve_url;
use scraper::Html;
use url::Url;

/// Finds the final asset URL on a file-description page
pub trait ImageLinkStrategy: Send + Sync {
    /// Returns the absolute asset URL, or `None` if the page has none
    fn locate(&self, document: &Html, base_url: &Url) -> Option<String>;
}

/// MediaWiki file pages: the first link into the upload directory, else the
/// link inside the `.fullImageLink` container
#[derive(Debug, Clone)]
pub struct MediaWikiFileLinks {
    storage_segment: String,
}

impl MediaWikiFileLinks {
    /// Matches links whose target contains `storage_segment`, e.g. `/images/`
    pub fn new(storage_segment: impl Into<String>) -> Self {
        Self {
            storage_segment: storage_segment.into(),
        }
    }
}

impl Default for MediaWikiFileLinks {
    fn default() -> Self {
        Self::new("/images/")
    }
}

impl ImageLinkStrategy for MediaWikiFileLinks {
    fn locate(&self, document: &Html, base_url: &Url) -> Option<String> {
        let anchors = selector("a[href]")?;
        let stored = document
            .select(&anchors)
            .filter_map(|a| a.value().attr("href"))
            .find(|href| href.contains(self.storage_segment.as_str()));
        if let Some(href) = stored {
            return resolve_url(href, base_url);
        }

        let full_link = selector(".fullImageLink a[href]")?;
        let fallback = document
            .select(&full_link)
            .filter_map(|a| a.value().attr("href"))
            .next();
        fallback.and_then(|href| resolve_url(href, base_url))
    }
}

/// Resolves file-description pages to final asset URLs
pub struct ImageResolver {
    base_url: Url,
    strategy: Box<dyn ImageLinkStrategy>,
    api: Option<MediaWikiApi>,
}

impl ImageResolver {
    /// Creates a resolver using the MediaWiki strategy
    pub fn new(base_url: Url) -> Self {
        Self::with_strategy(base_url, MediaWikiFileLinks::default())
    }

    pub fn with_strategy(base_url: Url, strategy: impl ImageLinkStrategy + 'static) -> Self {
        Self {
            base_url,
            strategy: Box::new(strategy),
            api: None,
        }
    }

    /// Enables metadata and lead-image lookups through `api`
    pub fn with_api(mut self, api: MediaWikiApi) -> Self {
        self.api = Some(api);
        self
    }

    /// Swaps the asset-link strategy, keeping the API client
    pub fn set_strategy(&mut self, strategy: impl ImageLinkStrategy + 'static) {
        self.strategy = Box::new(strategy);
    }

    /// Fills in what can be learned about `image`
    ///
    /// The file-description page is tried first. The API, if any, then adds
    /// size and license and supplies the file URL when the page had none.
    pub async fn complete(&self, fetcher: &PageFetcher, image: &mut ImageRef) {
        if image.file_url.is_none() {
            if let Some(page_url) = image.page_url.as_deref() {
                image.file_url = self.resolve(fetcher, page_url).await;
            }
        }

        let (Some(api), Some(file_title)) = (&self.api, image.file_title.as_deref()) else {
            return;
        };
        let info = api.image_info(fetcher, file_title).await;
        if let Some(info) = info {
            info.apply_to(image);
        }
    }

    /// Asks the API for the lead image of an article without an inline one
    pub async fn lead_image(&self, fetcher: &PageFetcher, source_url: &str) -> Option<ImageRef> {
        let api = self.api.as_ref()?;
        let image = api.lead_image(fetcher, source_url).await;
        if image.is_some() {
            tracing::debug!("Using lead image for {}", source_url);
        }
        image
    }

    /// Fetches `file_page_url` and extracts the asset URL
    ///
    /// A failed fetch is logged and yields `None`; it never fails the record.
    pub async fn resolve(&self, fetcher: &PageFetcher, file_page_url: &str) -> Option<String> {
        let markup = match fetcher.fetch(file_page_url).await {
            Ok(markup) => markup,
            Err(e) => {
                tracing::warn!("Image page unavailable: {}", e);
                return None;
            }
        };

        let resolved = self.locate(&markup);
        if resolved.is_none() {
            tracing::debug!("No asset link found on {}", file_page_url);
        }
        resolved
    }

    /// Extracts the asset URL from already fetched file-page markup
    pub fn locate(&self, markup: &str) -> Option<String> {
        let document = Html::parse_document(markup);
        self.strategy.locate(&document, &self.base_url)
    }
}

impl std::fmt::Debug for ImageResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageResolver")
            .field("base_url", &self.base_url.as_str())
            .field("api", &self.api)
            .finish_non_exhaustive()
    }
}
