use crate::storage::SiteType;
use serde::Deserialize;

/// Main configuration structure for Pressbox
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    #[serde(default, rename = "sites")]
    pub sites: Vec<SiteEntry>,
}

/// Crawl behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Number of concurrent site workers within a run
    #[serde(default = "default_workers")]
    pub workers: u32,

    /// Recency window in days used by scheduled runs
    #[serde(rename = "days-to-crawl", default = "default_days")]
    pub days_to_crawl: u32,

    /// Crawl interval applied to sites that do not set their own
    #[serde(
        rename = "default-crawl-interval-minutes",
        default = "default_interval"
    )]
    pub default_crawl_interval_minutes: u32,

    /// URL substrings that mark a page as not-an-article (tag pages,
    /// galleries, live tickers)
    #[serde(rename = "reject-patterns", default)]
    pub reject_patterns: Vec<String>,
}

/// Outbound fetch configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Lower bound of the per-host politeness delay (seconds)
    #[serde(rename = "delay-min-secs", default = "default_delay_min")]
    pub delay_min_secs: f64,

    /// Upper bound of the per-host politeness delay (seconds)
    #[serde(rename = "delay-max-secs", default = "default_delay_max")]
    pub delay_max_secs: f64,

    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            delay_min_secs: default_delay_min(),
            delay_max_secs: default_delay_max(),
            timeout_secs: default_timeout(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the outbound user agent string:
    /// `CrawlerName/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// A site seeded into the registry at startup
#[derive(Debug, Clone, Deserialize)]
pub struct SiteEntry {
    /// Display name of the site
    pub name: String,

    /// Domain the site's articles live on (e.g. "espn.com")
    pub domain: String,

    /// Root sitemap URL (plain urlset or sitemap index)
    #[serde(rename = "sitemap-url")]
    pub sitemap_url: String,

    /// Minutes between scheduled crawls; falls back to the crawler default
    #[serde(rename = "crawl-interval-minutes")]
    pub crawl_interval_minutes: Option<u32>,

    /// Whether the site covers one sport or many
    #[serde(rename = "site-type", default)]
    pub site_type: SiteType,

    /// The single sport a `specific` site covers
    #[serde(rename = "sport-focus")]
    pub sport_focus: Option<String>,
}

fn default_workers() -> u32 {
    1
}

fn default_days() -> u32 {
    2
}

fn default_interval() -> u32 {
    15
}

fn default_delay_min() -> f64 {
    2.0
}

fn default_delay_max() -> f64 {
    5.0
}

fn default_timeout() -> u64 {
    30
}
