//! Database schema definitions

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Site registry
CREATE TABLE IF NOT EXISTS sites (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    domain TEXT NOT NULL UNIQUE,
    sitemap_url TEXT NOT NULL,
    crawl_interval_minutes INTEGER NOT NULL DEFAULT 15,
    is_active INTEGER NOT NULL DEFAULT 1,
    site_type TEXT NOT NULL DEFAULT 'general',
    sport_focus TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_sites_active ON sites(is_active);

-- Content-addressed article store. The UNIQUE constraint on url_hash is the
-- authoritative arbiter for deduplication: concurrent check-then-insert races
-- resolve here, and a conflict is treated as already-ingested.
CREATE TABLE IF NOT EXISTS articles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url_hash TEXT NOT NULL UNIQUE,
    url TEXT NOT NULL,
    title TEXT NOT NULL,
    author TEXT,
    content TEXT NOT NULL,
    sport_category TEXT,
    published_at TEXT,
    last_modified TEXT,
    first_seen_at TEXT NOT NULL,
    source_site TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_articles_category ON articles(sport_category);
CREATE INDEX IF NOT EXISTS idx_articles_source ON articles(source_site);

-- Per-site crawl audit trail; also feeds the interval scheduler's
-- "last completed crawl" lookup
CREATE TABLE IF NOT EXISTS crawl_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    site_id INTEGER NOT NULL REFERENCES sites(id),
    stage TEXT NOT NULL,
    status TEXT NOT NULL,
    urls_found INTEGER NOT NULL DEFAULT 0,
    articles_saved INTEGER NOT NULL DEFAULT 0,
    error_message TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_crawl_logs_site ON crawl_logs(site_id, created_at);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
