use crate::UrlError;
use url::Url;

/// Tracking query parameters removed during normalization
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "mc_eid",
    "ref",
    "source",
];

/// Normalizes a URL so equivalent article links collapse to one form
///
/// Steps:
/// 1. Parse; reject non-HTTP(S) schemes
/// 2. Lowercase the host and strip a leading `www.`
/// 3. Collapse the path (dot segments, duplicate slashes, trailing slash)
/// 4. Drop the fragment
/// 5. Drop tracking query parameters, sort the rest
///
/// # Examples
///
/// ```
/// use pressbox::url::normalize_url;
///
/// let url = normalize_url("https://WWW.EXAMPLE.COM/news/match-report/?utm_source=x").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/news/match-report");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    match url.host_str() {
        Some(host) => {
            let lowered = host.to_lowercase();
            let stripped = lowered.strip_prefix("www.").unwrap_or(&lowered).to_string();
            url.set_host(Some(&stripped))
                .map_err(|e| UrlError::Parse(e.to_string()))?;
        }
        None => return Err(UrlError::MissingHost),
    }

    let normalized_path = normalize_path(url.path());
    url.set_path(&normalized_path);

    url.set_fragment(None);

    if url.query().is_some() {
        let mut params: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| !is_tracking_param(key))
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        params.sort_by(|a, b| a.0.cmp(&b.0));

        if params.is_empty() {
            url.set_query(None);
        } else {
            let query = params
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join("&");
            url.set_query(Some(&query));
        }
    }

    Ok(url)
}

/// Collapses dot segments and duplicate slashes, strips the trailing slash
/// (except for the root path)
fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    if segments.is_empty() {
        return "/".to_string();
    }

    format!("/{}", segments.join("/"))
}

fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}
