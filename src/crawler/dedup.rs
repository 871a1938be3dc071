//! URL deduplication against the article store
//!
//! The check is advisory: between `is_new` and `record` another worker may
//! ingest the same URL. The store's UNIQUE constraint on `url_hash` is the
//! authoritative arbiter, and `record` reports a conflict as "already
//! ingested" rather than an error.

use crate::storage::{NewArticle, SqliteStorage, Storage, StorageResult};
use crate::url::CanonicalUrl;
use std::sync::{Arc, Mutex};

/// Decides whether a discovered URL is new work
#[derive(Clone)]
pub struct Deduplicator {
    storage: Arc<Mutex<SqliteStorage>>,
}

impl Deduplicator {
    pub fn new(storage: Arc<Mutex<SqliteStorage>>) -> Self {
        Self { storage }
    }

    /// Whether no article with this canonical URL's hash exists yet
    pub fn is_new(&self, url: &CanonicalUrl) -> StorageResult<bool> {
        let storage = self.storage.lock().unwrap();
        Ok(!storage.article_exists(url.hash())?)
    }

    /// Persists an article; `false` means the hash was already present
    /// (a concurrent insert won the race, which is fine)
    pub fn record(&self, article: &NewArticle) -> StorageResult<bool> {
        let mut storage = self.storage.lock().unwrap();
        storage.insert_article_if_absent(article)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_article(url: &CanonicalUrl) -> NewArticle {
        NewArticle {
            url_hash: url.hash().to_string(),
            url: url.as_str().to_string(),
            title: "Title".to_string(),
            author: None,
            content: "Body".to_string(),
            sport_category: None,
            published_at: None,
            last_modified: None,
            source_site: "Test Site".to_string(),
        }
    }

    fn dedup() -> Deduplicator {
        Deduplicator::new(Arc::new(Mutex::new(SqliteStorage::new_in_memory().unwrap())))
    }

    #[test]
    fn test_unseen_url_is_new() {
        let dedup = dedup();
        let url = CanonicalUrl::parse("https://example.com/story").unwrap();
        assert!(dedup.is_new(&url).unwrap());
    }

    #[test]
    fn test_recorded_url_is_not_new() {
        let dedup = dedup();
        let url = CanonicalUrl::parse("https://example.com/story").unwrap();

        assert!(dedup.record(&new_article(&url)).unwrap());
        assert!(!dedup.is_new(&url).unwrap());
    }

    #[test]
    fn test_double_record_is_benign() {
        let dedup = dedup();
        let url = CanonicalUrl::parse("https://example.com/story").unwrap();

        assert!(dedup.record(&new_article(&url)).unwrap());
        assert!(!dedup.record(&new_article(&url)).unwrap());
    }

    #[test]
    fn test_equivalent_urls_collide() {
        let dedup = dedup();
        let first = CanonicalUrl::parse("https://www.example.com/story/?utm_source=x").unwrap();
        let second = CanonicalUrl::parse("https://example.com/story").unwrap();

        assert!(dedup.record(&new_article(&first)).unwrap());
        assert!(!dedup.is_new(&second).unwrap());
    }
}
