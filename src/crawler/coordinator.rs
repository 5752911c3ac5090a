//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that ties every component together:
//! - Deriving the crawl delay from the site policy
//! - Discovering candidates on the category index
//! - Fetching, extracting and image-resolving each candidate in order
//! - Isolating per-page failures
//! - Honoring the abort signal and the overall time budget

use crate::config::Config;
use crate::crawler::images::{ImageLinkStrategy, ImageResolver};
use crate::crawler::{MediaWikiApi, PageFetcher};
use crate::extract::{HeadingNormalizer, LinkDiscoverer, RecordExtractor};
use crate::model::{Collection, HerbRecord};
use crate::output::CrawlStats;
use crate::robots::{CrawlPolicy, RateLimiter};
use crate::url::record_id;
use crate::{FetchError, HerbarError};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use url::Url;

/// Stops a running crawl from outside
///
/// After [`abort`](Self::abort) the coordinator issues no further fetches
/// and returns the records gathered so far.
#[derive(Debug, Clone)]
pub struct AbortHandle {
    sender: Arc<watch::Sender<bool>>,
}

impl AbortHandle {
    pub fn abort(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_aborted(&self) -> bool {
        *self.sender.borrow()
    }
}

/// Main crawler coordinator structure
pub struct Coordinator {
    site_url: Url,
    license: String,
    agent: String,
    respect_robots: bool,
    max_retries: u32,
    overall_timeout: Option<Duration>,
    fetcher: PageFetcher,
    rate_limiter: RateLimiter,
    discoverer: LinkDiscoverer,
    extractor: RecordExtractor,
    resolver: ImageResolver,
    abort_tx: Arc<watch::Sender<bool>>,
    abort_rx: watch::Receiver<bool>,
    stats: CrawlStats,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The validated configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(HerbarError)` - The base URL or HTTP client could not be set up
    pub fn new(config: &Config) -> Result<Self, HerbarError> {
        let site_url = Url::parse(&config.site.base_url)?;
        let crawler = &config.crawler;

        let fetcher = PageFetcher::new(&config.user_agent, crawler)?;

        let rate_limiter = RateLimiter::new(config.user_agent.crawler_name.clone())
            .with_default_delay(Duration::from_millis(crawler.default_delay_ms))
            .with_policy_timeout(Duration::from_secs(crawler.policy_timeout_secs));

        let normalizer = HeadingNormalizer::new().with_synonyms(
            config
                .headings
                .synonyms
                .iter()
                .map(|(heading, key)| (heading.as_str(), key.clone())),
        );
        let extractor = RecordExtractor::new(site_url.clone())
            .with_normalizer(normalizer)
            .with_duplicate_policy(crawler.duplicate_headings);

        let mut resolver = ImageResolver::new(site_url.clone());
        if !config.site.api_paths.is_empty() {
            resolver = resolver.with_api(MediaWikiApi::new(
                site_url.clone(),
                config.site.api_paths.iter().cloned(),
            ));
        }

        let (abort_tx, abort_rx) = watch::channel(false);

        Ok(Self {
            discoverer: LinkDiscoverer::new(site_url.clone(), config.site.category_path.clone()),
            resolver,
            site_url,
            license: config.site.license.clone(),
            agent: config.user_agent.crawler_name.clone(),
            respect_robots: crawler.respect_robots,
            max_retries: crawler.max_retries,
            overall_timeout: crawler.overall_timeout_secs.map(Duration::from_secs),
            fetcher,
            rate_limiter,
            extractor,
            abort_tx: Arc::new(abort_tx),
            abort_rx,
            stats: CrawlStats::default(),
        })
    }

    /// Replaces the strategy used to find asset links on file pages
    pub fn with_image_strategy(mut self, strategy: impl ImageLinkStrategy + 'static) -> Self {
        self.resolver.set_strategy(strategy);
        self
    }

    /// Returns a handle that stops the crawl from another task
    pub fn abort_handle(&self) -> AbortHandle {
        AbortHandle {
            sender: Arc::clone(&self.abort_tx),
        }
    }

    /// Statistics of the most recent run
    pub fn stats(&self) -> &CrawlStats {
        &self.stats
    }

    /// Runs one full crawl pass
    ///
    /// 1. Derive the crawl delay from the site policy
    /// 2. Fetch the category index and discover sorted candidates
    /// 3. For each candidate, after waiting the crawl delay:
    ///    fetch, extract, resolve the primary image, assign id and license
    /// 4. Return the collection
    ///
    /// Only a failure to fetch the category index is an error. Failed
    /// articles are logged and skipped; an abort or spent time budget ends
    /// the loop early with the records gathered so far.
    pub async fn run(&mut self) -> Result<Collection, HerbarError> {
        let started = Instant::now();
        let deadline = self.overall_timeout.map(|budget| started + budget);
        self.stats = CrawlStats::default();

        if self.abort_requested() {
            self.stats.aborted = true;
            return Ok(Collection::new());
        }

        let policy = self
            .rate_limiter
            .policy_for(&self.fetcher, &self.site_url)
            .await;

        if self.abort_requested() {
            self.stats.aborted = true;
            return Ok(Collection::new());
        }

        let category_url = self.discoverer.category_url();
        tracing::info!("Fetching category index {}", category_url);
        let category_markup = match self.fetcher.fetch(&category_url).await {
            Ok(markup) => markup,
            Err(e) => {
                tracing::error!("Category index unavailable: {}", e);
                return Err(e.into());
            }
        };

        let candidates = self.discoverer.discover(&category_markup);
        self.stats.candidates = candidates.len();
        tracing::info!("Found {} candidate pages", candidates.len());

        let mut collection = Collection::new();
        let total = candidates.len();

        for (index, url) in candidates.iter().enumerate() {
            if self.respect_robots && !policy.robots.is_allowed(url, &self.agent) {
                tracing::info!("Skipping {} (disallowed by robots.txt)", url);
                self.stats.disallowed += 1;
                continue;
            }

            if !self.pause(policy.delay, deadline).await {
                self.stats.aborted = true;
                break;
            }

            tracing::info!("Fetching ({}/{}): {}", index + 1, total, url);
            let markup = match self.fetch_article(url, &policy, deadline).await {
                Ok(markup) => markup,
                Err(e) => {
                    tracing::warn!("Error fetching {}: {}", url, e.cause);
                    self.stats.failed += 1;
                    continue;
                }
            };
            self.stats.fetched += 1;

            let record = self.build_record(&markup, url, &collection).await;
            collection.push(record);

            if collection.len() % 10 == 0 {
                tracing::info!(
                    "Progress: {} records, {} of {} candidates visited",
                    collection.len(),
                    index + 1,
                    total
                );
            }
        }

        self.stats.records = collection.len();
        self.stats.elapsed = started.elapsed();

        if self.stats.aborted {
            tracing::warn!(
                "Crawl stopped early with {} of {} candidates collected",
                collection.len(),
                total
            );
        } else {
            tracing::info!(
                "Crawl completed: {} records in {:?}",
                collection.len(),
                self.stats.elapsed
            );
        }

        Ok(collection)
    }

    /// Fetches an article, retrying transient failures up to `max_retries`
    ///
    /// Each retry waits the crawl delay first, like any other request.
    async fn fetch_article(
        &mut self,
        url: &str,
        policy: &CrawlPolicy,
        deadline: Option<Instant>,
    ) -> Result<String, FetchError> {
        let mut attempt = 0;
        loop {
            match self.fetcher.fetch(url).await {
                Ok(markup) => return Ok(markup),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    tracing::warn!(
                        "Transient failure for {} ({}); retry {}/{}",
                        url,
                        e.cause,
                        attempt,
                        self.max_retries
                    );
                    if !self.pause(policy.delay, deadline).await {
                        self.stats.aborted = true;
                        return Err(e);
                    }
                    self.stats.retries += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Extracts a record and completes it with image, id and license
    async fn build_record(&mut self, markup: &str, url: &str, collection: &Collection) -> HerbRecord {
        let mut record = self.extractor.extract(markup, url);

        if record.images.is_empty() {
            if let Some(lead) = self.resolver.lead_image(&self.fetcher, url).await {
                self.stats.lead_images += 1;
                record.images.push(lead);
            }
        } else if let Some(image) = record.primary_image_mut() {
            self.resolver.complete(&self.fetcher, image).await;
        }

        if let Some(image) = record.primary_image() {
            if image.file_url.is_some() {
                self.stats.images_resolved += 1;
            } else {
                self.stats.images_unresolved += 1;
            }
        }

        record.id = unique_id(&record_id(url), collection);
        record.license = self.license.clone();
        record
    }

    fn abort_requested(&self) -> bool {
        let aborted = *self.abort_rx.borrow();
        if aborted {
            tracing::info!("Abort requested; no further pages will be fetched");
        }
        aborted
    }

    /// Waits `delay` before the next request
    ///
    /// Returns false when the crawl must stop: the abort signal fired or the
    /// overall deadline passed.
    async fn pause(&self, delay: Duration, deadline: Option<Instant>) -> bool {
        if self.abort_requested() {
            return false;
        }

        let wait = match deadline {
            Some(deadline) => delay.min(deadline.saturating_duration_since(Instant::now())),
            None => delay,
        };

        let mut abort_rx = self.abort_rx.clone();
        let aborted = tokio::select! {
            _ = tokio::time::sleep(wait) => false,
            _ = abort_rx.wait_for(|aborted| *aborted) => true,
        };
        if aborted {
            tracing::info!("Abort requested; no further pages will be fetched");
            return false;
        }

        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            tracing::warn!("Overall time budget spent; no further pages will be fetched");
            return false;
        }

        true
    }
}

/// Makes `id` unique within `collection` by appending `-2`, `-3`, ...
fn unique_id(id: &str, collection: &Collection) -> String {
    let base = if id.is_empty() { "page" } else { id };
    if !collection.contains_id(base) {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{}-{}", base, n))
        .find(|candidate| !collection.contains_id(candidate))
        .unwrap_or_else(|| base.to_string())
}
