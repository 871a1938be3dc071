//! HTTP client construction and article page fetching

use crate::config::{FetchConfig, UserAgentConfig};
use crate::PressboxError;
use reqwest::Client;
use std::time::Duration;

/// Builds the shared HTTP client
///
/// The per-request timeout bounds the worst-case duration of a unit of work,
/// which in turn bounds how long cancellation can take to be observed.
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    fetch: &FetchConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(Duration::from_secs(fetch.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches an article page, mapping every failure to `ExtractionFailed`
pub async fn fetch_html(client: &Client, url: &str) -> Result<String, PressboxError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| extraction_failed(url, &e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(PressboxError::ExtractionFailed {
            url: url.to_string(),
            message: format!("HTTP {}", status.as_u16()),
        });
    }

    response.text().await.map_err(|e| extraction_failed(url, &e))
}

fn extraction_failed(url: &str, e: &reqwest::Error) -> PressboxError {
    let message = if e.is_timeout() {
        "request timeout".to_string()
    } else if e.is_connect() {
        "connection failed".to_string()
    } else {
        e.to_string()
    };

    PressboxError::ExtractionFailed {
        url: url.to_string(),
        message,
    }
}
