//! Interval-based crawl scheduling
//!
//! A background loop that checks, once a minute, which active sites are due
//! for a crawl based on their `crawl_interval_minutes` and the time of their
//! last completed crawl pass, then starts a run restricted to the due sites.
//! A tick that lands while a run is active is skipped, preserving the
//! one-run-at-a-time invariant.

use crate::config::Config;
use crate::crawler::Orchestrator;
use crate::storage::{SiteRecord, SqliteStorage, Storage};
use crate::PressboxError;
use chrono::Utc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const TICK_SECS: u64 = 60;

/// Runs the interval scheduler until the task is dropped
pub async fn run_interval_scheduler(
    orchestrator: Orchestrator,
    storage: Arc<Mutex<SqliteStorage>>,
    config: Arc<Config>,
) {
    let mut tick = tokio::time::interval(Duration::from_secs(TICK_SECS));
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    tracing::info!("interval scheduler started");

    loop {
        tick.tick().await;

        if orchestrator.is_running() {
            tracing::debug!("run in progress, skipping scheduler tick");
            continue;
        }

        let due = match due_sites(&storage) {
            Ok(due) => due,
            Err(e) => {
                tracing::warn!("scheduler could not read registry: {}", e);
                continue;
            }
        };

        if due.is_empty() {
            continue;
        }

        let ids: Vec<i64> = due.iter().map(|s| s.id).collect();
        tracing::info!("{} site(s) due for a scheduled crawl", ids.len());

        match orchestrator.start(config.crawler.days_to_crawl, Some(&ids)) {
            Ok(()) => {}
            // another start won the race between the check and here
            Err(PressboxError::AlreadyRunning) => {
                tracing::debug!("run started concurrently, skipping tick");
            }
            Err(e) => {
                tracing::warn!("scheduled crawl rejected: {}", e);
            }
        }
    }
}

/// Active sites whose interval has elapsed since their last crawl pass
fn due_sites(storage: &Arc<Mutex<SqliteStorage>>) -> Result<Vec<SiteRecord>, PressboxError> {
    let storage = storage.lock().unwrap();
    let now = Utc::now();

    let mut due = Vec::new();
    for site in storage.get_active_sites()? {
        let is_due = match storage.last_crawl_time(site.id)? {
            Some(last) => {
                let elapsed = now.signed_duration_since(last);
                elapsed >= chrono::Duration::minutes(site.crawl_interval_minutes as i64)
            }
            // never crawled
            None => true,
        };

        if is_due {
            due.push(site);
        }
    }

    Ok(due)
}
