//! SQLite storage implementation

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{SiteUpsert, Storage, StorageError, StorageResult};
use crate::storage::{
    ArticleRecord, CrawlLogRecord, CrawlLogStatus, CrawlStage, NewArticle, SiteRecord, SiteType,
};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens (or creates) a database at the given path
    pub fn new(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Gets an article by its URL hash
    pub fn get_article_by_hash(&self, url_hash: &str) -> StorageResult<Option<ArticleRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, url_hash, url, title, author, content, sport_category,
             published_at, last_modified, first_seen_at, source_site
             FROM articles WHERE url_hash = ?1",
        )?;

        let article = stmt
            .query_row(params![url_hash], |row| {
                Ok(ArticleRecord {
                    id: row.get(0)?,
                    url_hash: row.get(1)?,
                    url: row.get(2)?,
                    title: row.get(3)?,
                    author: row.get(4)?,
                    content: row.get(5)?,
                    sport_category: row.get(6)?,
                    published_at: row.get(7)?,
                    last_modified: row.get(8)?,
                    first_seen_at: row.get(9)?,
                    source_site: row.get(10)?,
                })
            })
            .optional()?;

        Ok(article)
    }
}

fn site_from_row(row: &Row) -> rusqlite::Result<SiteRecord> {
    let is_active_int: i32 = row.get(5)?;
    Ok(SiteRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        domain: row.get(2)?,
        sitemap_url: row.get(3)?,
        crawl_interval_minutes: row.get(4)?,
        is_active: is_active_int != 0,
        site_type: SiteType::from_db_string(&row.get::<_, String>(6)?)
            .unwrap_or(SiteType::General),
        sport_focus: row.get(7)?,
        created_at: row.get(8)?,
    })
}

const SITE_COLUMNS: &str = "id, name, domain, sitemap_url, crawl_interval_minutes, is_active,
     site_type, sport_focus, created_at";

impl Storage for SqliteStorage {
    // ===== Site Registry =====

    fn upsert_site(&mut self, site: &SiteUpsert) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO sites (name, domain, sitemap_url, crawl_interval_minutes,
                 site_type, sport_focus, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(domain) DO UPDATE SET
                 name = excluded.name,
                 sitemap_url = excluded.sitemap_url,
                 crawl_interval_minutes = excluded.crawl_interval_minutes,
                 site_type = excluded.site_type,
                 sport_focus = excluded.sport_focus",
            params![
                site.name,
                site.domain,
                site.sitemap_url,
                site.crawl_interval_minutes,
                site.site_type.to_db_string(),
                site.sport_focus,
                now,
            ],
        )?;

        let id: i64 = self.conn.query_row(
            "SELECT id FROM sites WHERE domain = ?1",
            params![site.domain],
            |row| row.get(0),
        )?;

        Ok(id)
    }

    fn get_active_sites(&self) -> StorageResult<Vec<SiteRecord>> {
        let sql = format!(
            "SELECT {} FROM sites WHERE is_active = 1 ORDER BY id",
            SITE_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;

        let sites = stmt
            .query_map([], site_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(sites)
    }

    fn get_site(&self, site_id: i64) -> StorageResult<SiteRecord> {
        let sql = format!("SELECT {} FROM sites WHERE id = ?1", SITE_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;

        stmt.query_row(params![site_id], site_from_row)
            .map_err(|_| StorageError::SiteNotFound(format!("site id {}", site_id)))
    }

    fn get_site_by_domain(&self, domain: &str) -> StorageResult<Option<SiteRecord>> {
        let sql = format!("SELECT {} FROM sites WHERE domain = ?1", SITE_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;

        let site = stmt.query_row(params![domain], site_from_row).optional()?;
        Ok(site)
    }

    // ===== Article Store =====

    fn article_exists(&self, url_hash: &str) -> StorageResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM articles WHERE url_hash = ?1",
                params![url_hash],
                |row| row.get(0),
            )
            .optional()?;

        Ok(found.is_some())
    }

    fn insert_article_if_absent(&mut self, article: &NewArticle) -> StorageResult<bool> {
        let now = Utc::now().to_rfc3339();

        // INSERT OR IGNORE lets the UNIQUE(url_hash) constraint absorb the
        // check-then-insert race: zero changed rows means another worker won.
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO articles
                 (url_hash, url, title, author, content, sport_category,
                  published_at, last_modified, first_seen_at, source_site)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                article.url_hash,
                article.url,
                article.title,
                article.author,
                article.content,
                article.sport_category,
                article.published_at,
                article.last_modified,
                now,
                article.source_site,
            ],
        )?;

        Ok(changed > 0)
    }

    fn count_articles(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM articles", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_articles_by_category(&self) -> StorageResult<Vec<(String, u64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT COALESCE(sport_category, 'uncategorized'), COUNT(*) AS n
             FROM articles GROUP BY sport_category ORDER BY n DESC",
        )?;

        let counts = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get::<_, i64>(1)? as u64)))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(counts)
    }

    fn count_articles_by_site(&self) -> StorageResult<Vec<(String, u64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT source_site, COUNT(*) AS n
             FROM articles GROUP BY source_site ORDER BY n DESC",
        )?;

        let counts = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get::<_, i64>(1)? as u64)))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(counts)
    }

    // ===== Crawl Logs =====

    fn log_crawl(
        &mut self,
        site_id: i64,
        stage: CrawlStage,
        status: CrawlLogStatus,
        urls_found: u32,
        articles_saved: u32,
        error_message: Option<&str>,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO crawl_logs
                 (site_id, stage, status, urls_found, articles_saved, error_message, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                site_id,
                stage.to_db_string(),
                status.to_db_string(),
                urls_found,
                articles_saved,
                error_message,
                now,
            ],
        )?;
        Ok(())
    }

    fn get_recent_crawl_logs(
        &self,
        site_id: i64,
        limit: u32,
    ) -> StorageResult<Vec<CrawlLogRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, site_id, stage, status, urls_found, articles_saved,
                 error_message, created_at
             FROM crawl_logs WHERE site_id = ?1 ORDER BY id DESC LIMIT ?2",
        )?;

        let logs = stmt
            .query_map(params![site_id, limit], |row| {
                Ok(CrawlLogRecord {
                    id: row.get(0)?,
                    site_id: row.get(1)?,
                    stage: CrawlStage::from_db_string(&row.get::<_, String>(2)?)
                        .unwrap_or(CrawlStage::Sitemap),
                    status: CrawlLogStatus::from_db_string(&row.get::<_, String>(3)?)
                        .unwrap_or(CrawlLogStatus::Failed),
                    urls_found: row.get(4)?,
                    articles_saved: row.get(5)?,
                    error_message: row.get(6)?,
                    created_at: row.get(7)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(logs)
    }

    fn last_crawl_time(&self, site_id: i64) -> StorageResult<Option<DateTime<Utc>>> {
        let created_at: Option<String> = self
            .conn
            .query_row(
                "SELECT created_at FROM crawl_logs WHERE site_id = ?1 ORDER BY id DESC LIMIT 1",
                params![site_id],
                |row| row.get(0),
            )
            .optional()?;

        Ok(created_at
            .and_then(|s| s.parse::<DateTime<Utc>>().ok()))
    }
}
