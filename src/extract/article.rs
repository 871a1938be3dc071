//! Article content extraction
//!
//! Pulls title, author, publish date, and body text out of an article page
//! using prioritized CSS selector lists. Extraction is best-effort: a page
//! with a title but no byline still yields a usable article.

use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Selector};

const TITLE_SELECTORS: &[&str] = &[
    "article h1",
    "h1",
    ".headline",
    ".article-title",
    "[itemprop='headline']",
    "meta[property='og:title']",
];

const AUTHOR_SELECTORS: &[&str] = &[
    "[itemprop='author']",
    ".author-name",
    ".byline",
    ".article-author",
    "meta[name='author']",
    "[rel='author']",
];

const DATE_SELECTORS: &[&str] = &[
    "time[datetime]",
    "[itemprop='datePublished']",
    ".publish-date",
    ".article-date",
    "meta[property='article:published_time']",
];

const BODY_SELECTORS: &[&str] = &[
    "[itemprop='articleBody']",
    ".article-body",
    ".article-content",
    ".post-content",
    ".entry-content",
    ".story-body",
    "article",
];

// Fragments shorter than this are bylines, captions, share buttons
const MIN_PARAGRAPH_CHARS: usize = 20;

/// Best-effort extraction result; every field may be a fallback
#[derive(Debug, Clone)]
pub struct ExtractedArticle {
    pub title: String,
    pub author: Option<String>,
    pub published_at: Option<String>,
    pub content: String,
}

/// Extracts article data from an HTML page
pub fn extract_article(html: &str) -> ExtractedArticle {
    let document = Html::parse_document(html);

    ExtractedArticle {
        title: extract_title(&document),
        author: extract_author(&document),
        published_at: extract_date(&document),
        content: extract_body(&document),
    }
}

fn select_first<'a>(document: &'a Html, selectors: &[&str]) -> Option<(ElementRef<'a>, bool)> {
    for raw in selectors {
        let selector = match Selector::parse(raw) {
            Ok(s) => s,
            Err(_) => continue,
        };
        if let Some(element) = document.select(&selector).next() {
            return Some((element, raw.starts_with("meta")));
        }
    }
    None
}

fn element_text(element: ElementRef, is_meta: bool) -> Option<String> {
    let text = if is_meta {
        element.value().attr("content")?.to_string()
    } else {
        element.text().collect::<String>()
    };
    let cleaned = clean_text(&text);
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

fn extract_title(document: &Html) -> String {
    if let Some((element, is_meta)) = select_first(document, TITLE_SELECTORS) {
        if let Some(text) = element_text(element, is_meta) {
            return text;
        }
    }

    // fall back to the page title
    if let Ok(selector) = Selector::parse("title") {
        if let Some(element) = document.select(&selector).next() {
            let text = clean_text(&element.text().collect::<String>());
            if !text.is_empty() {
                return text;
            }
        }
    }

    "Untitled".to_string()
}

fn extract_author(document: &Html) -> Option<String> {
    let (element, is_meta) = select_first(document, AUTHOR_SELECTORS)?;
    let text = element_text(element, is_meta)?;
    // long "author" strings are bio blurbs, not names
    if text.len() < 100 {
        Some(text)
    } else {
        None
    }
}

fn extract_date(document: &Html) -> Option<String> {
    for raw in DATE_SELECTORS {
        let selector = match Selector::parse(raw) {
            Ok(s) => s,
            Err(_) => continue,
        };

        for element in document.select(&selector) {
            let candidate = element
                .value()
                .attr("datetime")
                .or_else(|| element.value().attr("content"))
                .map(str::to_string)
                .unwrap_or_else(|| element.text().collect::<String>());

            let candidate = candidate.trim();
            if candidate.is_empty() {
                continue;
            }

            if let Ok(parsed) = DateTime::parse_from_rfc3339(candidate) {
                return Some(parsed.with_timezone(&Utc).to_rfc3339());
            }
        }
    }

    None
}

fn extract_body(document: &Html) -> String {
    let container = select_first(document, BODY_SELECTORS).map(|(element, _)| element);

    let paragraph_selector = match Selector::parse("p, h2, h3, blockquote") {
        Ok(s) => s,
        Err(_) => return String::new(),
    };

    let paragraphs: Vec<String> = match container {
        Some(container) => collect_paragraphs(container.select(&paragraph_selector)),
        None => collect_paragraphs(document.select(&paragraph_selector)),
    };

    paragraphs.join("\n\n")
}

fn collect_paragraphs<'a>(elements: impl Iterator<Item = ElementRef<'a>>) -> Vec<String> {
    elements
        .map(|p| clean_text(&p.text().collect::<String>()))
        .filter(|text| text.len() > MIN_PARAGRAPH_CHARS)
        .collect()
}

fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
