//! Robots.txt handling module
//!
//! This module fetches and parses the site's robots.txt once per run and
//! derives the minimum delay between consecutive requests from it.

mod parser;

pub use parser::ParsedRobots;

use crate::crawler::PageFetcher;
use crate::PolicyError;
use std::time::Duration;
use url::Url;

/// Delay used when the policy names none (milliseconds)
pub const DEFAULT_DELAY_MS: u64 = 2000;

/// Everything a run needs from the site's crawl policy
#[derive(Debug, Clone)]
pub struct CrawlPolicy {
    /// Minimum wait between consecutive requests
    pub delay: Duration,

    /// Allow/disallow rules
    pub robots: ParsedRobots,
}

/// Derives the inter-request delay from the site's crawl policy
///
/// Never aborts a crawl: any failure while fetching or reading the policy
/// falls back to the default delay with an allow-all rule set.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    default_delay: Duration,
    policy_timeout: Duration,
    agent: String,
}

impl RateLimiter {
    /// Creates a rate limiter matching policy groups against `agent`
    pub fn new(agent: impl Into<String>) -> Self {
        Self {
            default_delay: Duration::from_millis(DEFAULT_DELAY_MS),
            policy_timeout: Duration::from_secs(5),
            agent: agent.into(),
        }
    }

    pub fn with_default_delay(mut self, delay: Duration) -> Self {
        self.default_delay = delay;
        self
    }

    pub fn with_policy_timeout(mut self, timeout: Duration) -> Self {
        self.policy_timeout = timeout;
        self
    }

    pub fn default_delay(&self) -> Duration {
        self.default_delay
    }

    /// Returns the crawl delay for `base_url`
    pub async fn delay_for(&self, fetcher: &PageFetcher, base_url: &Url) -> Duration {
        self.policy_for(fetcher, base_url).await.delay
    }

    /// Fetches the policy for `base_url`, falling back to defaults on failure
    pub async fn policy_for(&self, fetcher: &PageFetcher, base_url: &Url) -> CrawlPolicy {
        let robots = match self.fetch_policy(fetcher, base_url).await {
            Ok(robots) => robots,
            Err(e) => {
                tracing::warn!(
                    "Crawl policy unavailable ({}); using default delay of {}ms",
                    e,
                    self.default_delay.as_millis()
                );
                ParsedRobots::allow_all()
            }
        };

        let delay = self.delay_from(&robots);
        tracing::info!("Crawl delay: {}ms", delay.as_millis());
        CrawlPolicy { delay, robots }
    }

    /// Fetches and parses robots.txt at the root of `base_url`
    pub async fn fetch_policy(
        &self,
        fetcher: &PageFetcher,
        base_url: &Url,
    ) -> Result<ParsedRobots, PolicyError> {
        let location = base_url.join("/robots.txt")?;
        tracing::debug!("Fetching crawl policy from {}", location);
        let content = fetcher
            .fetch_with_timeout(location.as_str(), self.policy_timeout)
            .await?;
        Ok(ParsedRobots::from_content(&content))
    }

    /// Converts the policy's crawl delay into a duration, or the default
    ///
    /// A delay too large to represent is treated like a missing one.
    pub fn delay_from(&self, robots: &ParsedRobots) -> Duration {
        let Some(seconds) = robots.crawl_delay(&self.agent) else {
            return self.default_delay;
        };
        match Duration::try_from_secs_f64(seconds) {
            Ok(delay) => delay,
            Err(e) => {
                tracing::warn!(
                    "Ignoring Crawl-delay of {}s ({}); using default delay of {}ms",
                    seconds,
                    e,
                    self.default_delay.as_millis()
                );
                self.default_delay
            }
        }
    }
}
