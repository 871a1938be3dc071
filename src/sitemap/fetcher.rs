//! Sitemap retrieval
//!
//! Fetches a site's root sitemap and resolves one level of sitemap-index
//! nesting, concatenating entries in document order. Network failures map to
//! `UnreachableSite` and unparseable documents to `MalformedSitemap`; both
//! are site-level conditions that never abort a whole run.

use crate::sitemap::parser::{parse_sitemap, SitemapEntry};
use crate::PressboxError;
use flate2::read::MultiGzDecoder;
use reqwest::Client;
use std::collections::HashSet;
use std::io::Read;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Fetches every URL entry reachable from a site's root sitemap
///
/// A root that turns out to be a sitemap index has each child fetched and
/// parsed in turn; a failing child degrades to the entries collected so far.
/// Children that are themselves indexes are skipped (one level of nesting is
/// resolved).
pub async fn fetch_site_entries(
    client: &Client,
    sitemap_url: &str,
) -> Result<Vec<SitemapEntry>, PressboxError> {
    let body = fetch_document(client, sitemap_url).await?;

    let root = parse_sitemap(&body).map_err(|message| PressboxError::MalformedSitemap {
        url: sitemap_url.to_string(),
        message,
    })?;

    let mut entries = root.entries;

    let mut visited: HashSet<String> = HashSet::new();
    visited.insert(sitemap_url.to_string());

    for child_url in root.children {
        if !visited.insert(child_url.clone()) {
            continue;
        }

        let child_body = match fetch_document(client, &child_url).await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(sitemap = %child_url, "child sitemap fetch failed: {}", e);
                continue;
            }
        };

        match parse_sitemap(&child_body) {
            Ok(child) => {
                if !child.children.is_empty() {
                    tracing::warn!(
                        sitemap = %child_url,
                        "nested sitemap index skipped ({} children)",
                        child.children.len()
                    );
                }
                entries.extend(child.entries);
            }
            Err(message) => {
                tracing::warn!(sitemap = %child_url, "child sitemap unparseable: {}", message);
            }
        }
    }

    tracing::debug!(
        sitemap = %sitemap_url,
        "collected {} sitemap entries",
        entries.len()
    );

    Ok(entries)
}

/// Fetches one sitemap document as bytes, transparently gunzipping payloads
/// served as raw gzip (`.gz` sitemap files)
async fn fetch_document(client: &Client, url: &str) -> Result<Vec<u8>, PressboxError> {
    let response =
        client
            .get(url)
            .send()
            .await
            .map_err(|e| PressboxError::UnreachableSite {
                url: url.to_string(),
                message: describe_reqwest_error(&e),
            })?;

    let status = response.status();
    if !status.is_success() {
        return Err(PressboxError::UnreachableSite {
            url: url.to_string(),
            message: format!("HTTP {}", status.as_u16()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| PressboxError::UnreachableSite {
            url: url.to_string(),
            message: describe_reqwest_error(&e),
        })?;

    if bytes.len() >= 2 && bytes[..2] == GZIP_MAGIC {
        let mut decoder = MultiGzDecoder::new(&bytes[..]);
        let mut decompressed = Vec::new();
        if decoder.read_to_end(&mut decompressed).is_ok() {
            return Ok(decompressed);
        }
        // magic bytes without a valid stream: fall through with the raw body
    }

    Ok(bytes.to_vec())
}

fn describe_reqwest_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "request timeout".to_string()
    } else if e.is_connect() {
        "connection failed".to_string()
    } else {
        e.to_string()
    }
}
