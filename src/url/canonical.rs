use crate::url::normalize_url;
use crate::UrlError;
use sha2::{Digest, Sha256};
use url::Url;

/// A normalized URL together with its deduplication key
///
/// The hash is a SHA-256 over the normalized string, so any two raw URLs
/// that normalize identically collide on the same key. The hash is the sole
/// correctness guarantee against duplicate ingestion; the article table
/// enforces it with a UNIQUE constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalUrl {
    url: Url,
    hash: String,
}

impl CanonicalUrl {
    /// Normalizes a raw URL string and derives its hash
    pub fn parse(raw: &str) -> Result<Self, UrlError> {
        let url = normalize_url(raw)?;
        let hash = hash_url(url.as_str());
        Ok(Self { url, hash })
    }

    /// The normalized URL
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The normalized URL as a string slice
    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    /// Hex-encoded SHA-256 of the normalized URL
    pub fn hash(&self) -> &str {
        &self.hash
    }
}

impl std::fmt::Display for CanonicalUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.url)
    }
}

fn hash_url(normalized: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    hex::encode(hasher.finalize())
}
