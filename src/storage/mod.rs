//! Storage module for the site registry and article store
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Site registry reads (and config-driven seeding)
//! - Content-addressed article persistence keyed by URL hash
//! - Per-site crawl audit logs

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{SiteUpsert, Storage, StorageError, StorageResult};

use serde::Deserialize;

/// Whether a site covers a single sport or general sports news
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteType {
    #[default]
    General,
    Specific,
}

impl SiteType {
    pub fn to_db_string(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Specific => "specific",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "general" => Some(Self::General),
            "specific" => Some(Self::Specific),
            _ => None,
        }
    }
}

/// A site registered for crawling
///
/// `sport_focus` is meaningful only when `site_type` is `Specific`.
#[derive(Debug, Clone)]
pub struct SiteRecord {
    pub id: i64,
    pub name: String,
    pub domain: String,
    pub sitemap_url: String,
    pub crawl_interval_minutes: u32,
    pub is_active: bool,
    pub site_type: SiteType,
    pub sport_focus: Option<String>,
    pub created_at: String,
}

/// An article row as persisted
#[derive(Debug, Clone)]
pub struct ArticleRecord {
    pub id: i64,
    pub url_hash: String,
    pub url: String,
    pub title: String,
    pub author: Option<String>,
    pub content: String,
    pub sport_category: Option<String>,
    pub published_at: Option<String>,
    pub last_modified: Option<String>,
    pub first_seen_at: String,
    pub source_site: String,
}

/// An article about to be persisted; `url_hash` uniqueness in the store is
/// the sole guarantee against duplicate ingestion
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub url_hash: String,
    pub url: String,
    pub title: String,
    pub author: Option<String>,
    pub content: String,
    pub sport_category: Option<String>,
    pub published_at: Option<String>,
    pub last_modified: Option<String>,
    pub source_site: String,
}

/// Which stage of a site's crawl pass a log row describes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlStage {
    Sitemap,
    Article,
}

impl CrawlStage {
    pub fn to_db_string(self) -> &'static str {
        match self {
            Self::Sitemap => "sitemap",
            Self::Article => "article",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "sitemap" => Some(Self::Sitemap),
            "article" => Some(Self::Article),
            _ => None,
        }
    }
}

/// Outcome recorded in a crawl log row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlLogStatus {
    Success,
    Failed,
}

impl CrawlLogStatus {
    pub fn to_db_string(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "success" => Some(Self::Success),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// A per-site crawl audit row
#[derive(Debug, Clone)]
pub struct CrawlLogRecord {
    pub id: i64,
    pub site_id: i64,
    pub stage: CrawlStage,
    pub status: CrawlLogStatus,
    pub urls_found: u32,
    pub articles_saved: u32,
    pub error_message: Option<String>,
    pub created_at: String,
}
