use serde::Deserialize;
use std::collections::BTreeMap;

/// Main configuration structure for Herbar
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub site: SiteConfig,
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub headings: HeadingsConfig,
    pub output: OutputConfig,
}

impl Config {
    /// Builds a configuration for `base_url` with every optional setting at
    /// its default and output going to `herbs.json`.
    pub fn for_site(base_url: &str) -> Self {
        Self {
            site: SiteConfig {
                base_url: base_url.to_string(),
                category_path: default_category_path(),
                license: default_license(),
                api_paths: default_api_paths(),
            },
            user_agent: UserAgentConfig::default(),
            crawler: CrawlerConfig::default(),
            headings: HeadingsConfig::default(),
            output: OutputConfig {
                json_path: "herbs.json".to_string(),
                database_path: None,
            },
        }
    }
}

/// The one site and category being harvested
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SiteConfig {
    /// Origin of the source site, e.g. `https://www.wikifood.cz`
    pub base_url: String,

    /// Root-relative path of the category index page
    #[serde(default = "default_category_path")]
    pub category_path: String,

    /// Attribution string stamped on every record
    #[serde(default = "default_license")]
    pub license: String,

    /// MediaWiki API endpoints tried for image metadata and lead images;
    /// empty disables the lookups
    #[serde(default = "default_api_paths")]
    pub api_paths: Vec<String>,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UserAgentConfig {
    /// Name of the crawler
    pub crawler_name: String,

    /// Version of the crawler
    pub crawler_version: String,

    /// URL with information about the crawler
    pub contact_url: String,
}

impl UserAgentConfig {
    /// Formats the client signature sent with every request
    pub fn signature(&self) -> String {
        format!(
            "{}/{} (+{})",
            self.crawler_name, self.crawler_version, self.contact_url
        )
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "herbar-scraper".to_string(),
            crawler_version: "0.1".to_string(),
            contact_url: "https://example.org".to_string(),
        }
    }
}

/// Crawl pacing and failure handling
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CrawlerConfig {
    /// Delay between requests when the policy file names none (milliseconds)
    pub default_delay_ms: u64,

    /// Per-request timeout for pages (seconds)
    pub request_timeout_secs: u64,

    /// Timeout for the policy file request (seconds)
    pub policy_timeout_secs: u64,

    /// Overall run budget; no new fetch is issued once it is spent (seconds)
    pub overall_timeout_secs: Option<u64>,

    /// Extra attempts for an article fetch that failed transiently
    pub max_retries: u32,

    /// Skip candidates the policy file disallows for our agent
    pub respect_robots: bool,

    /// What to do when two headings on one page normalize to the same key
    pub duplicate_headings: DuplicateHeadingPolicy,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            default_delay_ms: 2000,
            request_timeout_secs: 30,
            policy_timeout_secs: 5,
            overall_timeout_secs: None,
            max_retries: 0,
            respect_robots: true,
            duplicate_headings: DuplicateHeadingPolicy::LastWins,
        }
    }
}

/// Resolution of colliding section keys within one record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicateHeadingPolicy {
    /// The later section replaces the earlier one
    #[default]
    LastWins,
    /// The earlier section is kept, later ones are dropped
    FirstWins,
    /// Section texts are concatenated in document order
    Merge,
}

/// Additions to the built-in heading synonym table
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct HeadingsConfig {
    /// Source heading text -> canonical key
    pub synonyms: BTreeMap<String, String>,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Path of the JSON document the collection is written to
    pub json_path: String,

    /// Optional SQLite mirror of the collection
    #[serde(default)]
    pub database_path: Option<String>,
}

fn default_category_path() -> String {
    "/Kategorie:Bylinky".to_string()
}

fn default_license() -> String {
    "CC BY-NC-SA 4.0 (source site)".to_string()
}

fn default_api_paths() -> Vec<String> {
    crate::crawler::DEFAULT_API_PATHS
        .iter()
        .map(|path| path.to_string())
        .collect()
}
