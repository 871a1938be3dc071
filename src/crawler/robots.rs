//! Per-host robots.txt compliance
//!
//! Article fetches are checked against each host's robots.txt, cached for
//! 24 hours. A host whose robots.txt cannot be fetched is treated as
//! allow-all, and that outcome is cached too so failing hosts are not
//! re-queried for every article.

use crate::url::extract_host;
use chrono::{DateTime, Utc};
use reqwest::Client;
use robotstxt::DefaultMatcher;
use std::collections::HashMap;
use tokio::sync::Mutex;
use url::Url;

const CACHE_TTL_HOURS: i64 = 24;

#[derive(Debug, Clone)]
struct CachedRobots {
    /// None when robots.txt was missing or unreachable (allow all)
    content: Option<String>,
    fetched_at: DateTime<Utc>,
}

/// Cache of per-host robots.txt verdicts
pub struct RobotsCache {
    client: Client,
    user_agent: String,
    hosts: Mutex<HashMap<String, CachedRobots>>,
}

impl RobotsCache {
    /// Creates a cache that matches rules against the given agent name
    pub fn new(client: Client, user_agent: String) -> Self {
        Self {
            client,
            user_agent,
            hosts: Mutex::new(HashMap::new()),
        }
    }

    /// Whether our agent may fetch this URL
    pub async fn is_allowed(&self, url: &Url) -> bool {
        let host = match extract_host(url) {
            Some(h) => h,
            None => return true,
        };

        let robots = self.get_or_fetch(&host, url).await;

        match robots.content {
            Some(content) => {
                let mut matcher = DefaultMatcher::default();
                matcher.one_agent_allowed_by_robots(&content, &self.user_agent, url.as_str())
            }
            None => true,
        }
    }

    async fn get_or_fetch(&self, host: &str, url: &Url) -> CachedRobots {
        {
            let hosts = self.hosts.lock().await;
            if let Some(cached) = hosts.get(host) {
                let age = Utc::now() - cached.fetched_at;
                if age < chrono::Duration::hours(CACHE_TTL_HOURS) {
                    return cached.clone();
                }
            }
        }

        let content = self.fetch_robots(url).await;
        let cached = CachedRobots {
            content,
            fetched_at: Utc::now(),
        };

        let mut hosts = self.hosts.lock().await;
        hosts.insert(host.to_string(), cached.clone());
        cached
    }

    async fn fetch_robots(&self, url: &Url) -> Option<String> {
        let robots_url = url.join("/robots.txt").ok()?;
        tracing::debug!(url = %robots_url, "fetching robots.txt");

        match self.client.get(robots_url.as_str()).send().await {
            Ok(response) if response.status().is_success() => response.text().await.ok(),
            Ok(response) => {
                tracing::debug!(
                    host = url.host_str().unwrap_or(""),
                    "robots.txt returned HTTP {}, allowing all",
                    response.status().as_u16()
                );
                None
            }
            Err(e) => {
                tracing::debug!(
                    host = url.host_str().unwrap_or(""),
                    "robots.txt fetch failed ({}), allowing all",
                    e
                );
                None
            }
        }
    }
}
