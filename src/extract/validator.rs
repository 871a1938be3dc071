//! Article validation
//!
//! Sitemaps list more than articles: tag pages, photo galleries, live
//! tickers, video hubs. The validator rejects those before they reach the
//! store, first by URL pattern, then by checking the page actually looks
//! like an article.

use scraper::{Html, Selector};

const HEADLINE_SELECTORS: &[&str] = &[
    "h1",
    "article h1",
    ".headline",
    ".article-title",
    "[itemprop='headline']",
    ".post-title",
];

const CONTENT_SELECTORS: &[&str] = &[
    "article",
    "[itemprop='articleBody']",
    ".article-body",
    ".article-content",
    ".post-content",
    ".entry-content",
    ".story-body",
];

const MIN_CONTENT_CHARS: usize = 200;

/// Validates that a page is a genuine news article
#[derive(Debug, Clone, Default)]
pub struct ArticleValidator {
    reject_patterns: Vec<String>,
}

impl ArticleValidator {
    /// Creates a validator with the configured URL reject patterns
    pub fn new(reject_patterns: &[String]) -> Self {
        Self {
            reject_patterns: reject_patterns
                .iter()
                .map(|p| p.to_lowercase())
                .collect(),
        }
    }

    /// URL-only check, usable before fetching the page
    pub fn is_valid_url(&self, url: &str) -> bool {
        let url_lower = url.to_lowercase();
        !self
            .reject_patterns
            .iter()
            .any(|pattern| url_lower.contains(pattern))
    }

    /// Validates fetched page content; returns the rejection reason on
    /// failure
    pub fn validate(&self, url: &str, html: &str) -> Result<(), String> {
        if !self.is_valid_url(url) {
            return Err("URL matches rejection pattern".to_string());
        }

        let document = Html::parse_document(html);

        if !has_headline(&document) {
            return Err("no headline found".to_string());
        }

        if !has_content(&document) {
            return Err("insufficient content".to_string());
        }

        Ok(())
    }
}

fn has_headline(document: &Html) -> bool {
    for raw in HEADLINE_SELECTORS {
        if let Ok(selector) = Selector::parse(raw) {
            if let Some(element) = document.select(&selector).next() {
                if !element.text().collect::<String>().trim().is_empty() {
                    return true;
                }
            }
        }
    }
    false
}

fn has_content(document: &Html) -> bool {
    for raw in CONTENT_SELECTORS {
        if let Ok(selector) = Selector::parse(raw) {
            if let Some(element) = document.select(&selector).next() {
                let text: String = element.text().collect();
                if text.trim().len() >= MIN_CONTENT_CHARS {
                    return true;
                }
            }
        }
    }

    // fallback: total paragraph text
    if let Ok(selector) = Selector::parse("p") {
        let total: usize = document
            .select(&selector)
            .map(|p| p.text().collect::<String>().trim().len())
            .sum();
        return total >= MIN_CONTENT_CHARS;
    }

    false
}
