//! Crawler module for fetching and assembling herb records
//!
//! This module contains the network-facing part of the pipeline:
//! - HTTP fetching with the identifying user agent
//! - Image resolution through file-description pages and the wiki API
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod images;
mod media_api;

pub use coordinator::{AbortHandle, Coordinator};
pub use fetcher::{build_http_client, PageFetcher};
pub use images::{ImageLinkStrategy, ImageResolver, MediaWikiFileLinks};
pub use media_api::{parse_image_info, parse_lead_image, ImageInfo, MediaWikiApi, DEFAULT_API_PATHS};

use crate::config::Config;
use crate::model::Collection;
use crate::output::CrawlStats;
use crate::HerbarError;

/// Runs a complete crawl operation
///
/// This is the main entry point for a one-shot crawl. It will:
/// 1. Build the HTTP client
/// 2. Derive the crawl delay from robots.txt
/// 3. Discover candidates on the category index
/// 4. Fetch and extract every candidate in sorted order
/// 5. Return the collection together with run statistics
///
/// # Example
///
/// ```no_run
/// use herbar::config::load_config;
/// use herbar::crawler::crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("herbar.toml"))?;
/// let (collection, stats) = crawl(&config).await?;
/// println!("{} records, {} failed", collection.len(), stats.failed);
/// # Ok(())
/// # }
/// ```
pub async fn crawl(config: &Config) -> Result<(Collection, CrawlStats), HerbarError> {
    let mut coordinator = Coordinator::new(config)?;
    let collection = coordinator.run().await?;
    Ok((collection, coordinator.stats().clone()))
}
