//! URL handling: canonicalization, dedup hashing, host extraction

mod canonical;
mod host;
mod normalize;

pub use canonical::CanonicalUrl;
pub use host::extract_host;
pub use normalize::normalize_url;
