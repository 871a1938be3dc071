use url::Url;

/// Extracts the host a URL points at, including a non-default port
///
/// The host is the unit of politeness: the rate limiter serializes fetches
/// per host, never across hosts. Including the port keeps local test servers
/// on the same machine independent of each other.
pub fn extract_host(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    match url.port() {
        Some(port) => Some(format!("{}:{}", host, port)),
        None => Some(host),
    }
}
