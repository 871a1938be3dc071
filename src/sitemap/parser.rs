//! Sitemap XML parsing
//!
//! Event-driven parsing of the sitemap protocol: `<urlset>` documents yield
//! URL entries in document order, `<sitemapindex>` documents yield the
//! locations of child sitemaps. Namespace prefixes are tolerated by matching
//! on local name suffixes.

use chrono::{DateTime, NaiveDate, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;

/// A single `<url>` entry from a sitemap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapEntry {
    /// The article URL, exactly as found in `<loc>`
    pub url: String,

    /// Parsed `<lastmod>` timestamp, if present and parseable
    pub last_modified: Option<DateTime<Utc>>,
}

/// Result of parsing one sitemap document
#[derive(Debug, Default)]
pub struct ParsedSitemap {
    /// URL entries, in document order (empty for an index document)
    pub entries: Vec<SitemapEntry>,

    /// Child sitemap locations (empty for a plain urlset)
    pub children: Vec<String>,
}

/// Parses a sitemap document into entries and child sitemap references
///
/// Returns an error when the XML is unreadable or the document is neither a
/// `<urlset>` nor a `<sitemapindex>`.
pub fn parse_sitemap(xml: &[u8]) -> Result<ParsedSitemap, String> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut result = ParsedSitemap::default();

    let mut saw_urlset = false;
    let mut saw_index = false;

    // element context
    let mut in_url = false;
    let mut in_child = false;
    let mut in_loc = false;
    let mut in_lastmod = false;

    let mut loc = String::new();
    let mut lastmod = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = e.name();
                let name = name.as_ref();
                if name.ends_with(b"urlset") {
                    saw_urlset = true;
                } else if name.ends_with(b"sitemapindex") {
                    saw_index = true;
                } else if name.ends_with(b"url") {
                    in_url = true;
                    loc.clear();
                    lastmod.clear();
                } else if name.ends_with(b"sitemap") && !name.ends_with(b"sitemapindex") {
                    in_child = true;
                    loc.clear();
                    lastmod.clear();
                } else if name.ends_with(b"loc") {
                    in_loc = true;
                } else if name.ends_with(b"lastmod") {
                    in_lastmod = true;
                }
            }
            Ok(Event::Text(t)) => {
                let text = t.unescape().map_err(|e| e.to_string())?;
                if in_loc {
                    loc.push_str(text.trim());
                } else if in_lastmod {
                    lastmod.push_str(text.trim());
                }
            }
            Ok(Event::End(e)) => {
                let name = e.name();
                let name = name.as_ref();
                if name.ends_with(b"loc") {
                    in_loc = false;
                } else if name.ends_with(b"lastmod") {
                    in_lastmod = false;
                } else if name.ends_with(b"url") && in_url {
                    in_url = false;
                    if !loc.is_empty() {
                        result.entries.push(SitemapEntry {
                            url: loc.clone(),
                            last_modified: parse_lastmod(&lastmod),
                        });
                    }
                } else if name.ends_with(b"sitemap") && in_child {
                    in_child = false;
                    if !loc.is_empty() {
                        result.children.push(loc.clone());
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(format!("XML error at byte {}: {}", reader.buffer_position(), e)),
            _ => {}
        }
        buf.clear();
    }

    if !saw_urlset && !saw_index {
        return Err("document is neither a urlset nor a sitemap index".to_string());
    }

    Ok(result)
}

/// Parses a `<lastmod>` value; sitemaps carry either full W3C datetimes or
/// bare dates
fn parse_lastmod(raw: &str) -> Option<DateTime<Utc>> {
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }

    None
}
