//! Storage trait and error types

use crate::storage::{CrawlLogRecord, CrawlLogStatus, CrawlStage, NewArticle, SiteRecord};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Site not found: {0}")]
    SiteNotFound(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Parameters for registering (or refreshing) a site in the registry
#[derive(Debug, Clone)]
pub struct SiteUpsert {
    pub name: String,
    pub domain: String,
    pub sitemap_url: String,
    pub crawl_interval_minutes: u32,
    pub site_type: crate::storage::SiteType,
    pub sport_focus: Option<String>,
}

/// Trait for storage backend implementations
///
/// Covers the three persisted surfaces the engine touches: the site
/// registry (read-mostly), the content-addressed article store, and the
/// crawl audit log.
pub trait Storage {
    // ===== Site Registry =====

    /// Inserts a site or refreshes its settings, keyed by domain.
    ///
    /// An existing site keeps its `is_active` flag so operator toggles
    /// survive config reloads. Returns the site id.
    fn upsert_site(&mut self, site: &SiteUpsert) -> StorageResult<i64>;

    /// All sites flagged active, ordered by id
    fn get_active_sites(&self) -> StorageResult<Vec<SiteRecord>>;

    /// Gets a site by id
    fn get_site(&self, site_id: i64) -> StorageResult<SiteRecord>;

    /// Gets a site by domain
    fn get_site_by_domain(&self, domain: &str) -> StorageResult<Option<SiteRecord>>;

    // ===== Article Store =====

    /// Whether an article with this URL hash has already been ingested
    fn article_exists(&self, url_hash: &str) -> StorageResult<bool>;

    /// Inserts an article unless its `url_hash` is already present.
    ///
    /// Returns `true` when a row was written, `false` when the uniqueness
    /// constraint absorbed the insert (the expected check-then-insert race).
    fn insert_article_if_absent(&mut self, article: &NewArticle) -> StorageResult<bool>;

    /// Total number of ingested articles
    fn count_articles(&self) -> StorageResult<u64>;

    /// Article counts grouped by sport category, most numerous first
    fn count_articles_by_category(&self) -> StorageResult<Vec<(String, u64)>>;

    /// Article counts grouped by source site, most numerous first
    fn count_articles_by_site(&self) -> StorageResult<Vec<(String, u64)>>;

    // ===== Crawl Logs =====

    /// Appends a crawl audit row for a site
    #[allow(clippy::too_many_arguments)]
    fn log_crawl(
        &mut self,
        site_id: i64,
        stage: CrawlStage,
        status: CrawlLogStatus,
        urls_found: u32,
        articles_saved: u32,
        error_message: Option<&str>,
    ) -> StorageResult<()>;

    /// Most recent crawl log rows for a site, newest first
    fn get_recent_crawl_logs(&self, site_id: i64, limit: u32) -> StorageResult<Vec<CrawlLogRecord>>;

    /// Timestamp of the site's most recent completed crawl pass (successful
    /// or not), used by the interval scheduler to decide when a site is due
    fn last_crawl_time(&self, site_id: i64) -> StorageResult<Option<DateTime<Utc>>>;
}
