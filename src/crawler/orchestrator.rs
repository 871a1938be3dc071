//! Crawl orchestration
//!
//! Owns the engine state machine (`Idle -> Running -> {Completed, Cancelled,
//! Failed} -> Idle`) and drives the per-site pipeline: sitemap discovery,
//! recency filtering, deduplication, robots check, rate-limited fetch,
//! validation, extraction, categorization, persistence. At most one run is
//! active at a time; within a run, sites are dispatched to a bounded worker
//! pool.

use crate::config::Config;
use crate::crawler::fetch::{build_http_client, fetch_html};
use crate::crawler::{Deduplicator, RateLimiter, RobotsCache, RunState, StatusReporter,
    StatusSnapshot};
use crate::extract::{detect_category, extract_article, ArticleValidator};
use crate::sitemap::{fetch_site_entries, SitemapEntry};
use crate::storage::{
    CrawlLogStatus, CrawlStage, NewArticle, SiteRecord, SiteType, SqliteStorage, Storage,
};
use crate::url::{extract_host, CanonicalUrl};
use crate::{ConfigError, PressboxError};
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EngineState {
    Idle,
    Running,
}

/// Result of one site's crawl pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SiteOutcome {
    Done,
    Cancelled,
    Fatal,
}

struct Inner {
    config: Arc<Config>,
    storage: Arc<Mutex<SqliteStorage>>,
    client: reqwest::Client,
    limiter: RateLimiter,
    robots: RobotsCache,
    dedup: Deduplicator,
    validator: ArticleValidator,
    status: StatusReporter,
    cancel: AtomicBool,
    state: Mutex<EngineState>,
}

/// The crawl engine's control surface
///
/// Cheap to clone; all clones share one engine. `start` returns immediately
/// and the run proceeds on a spawned task, observable through `status`.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

impl Orchestrator {
    pub fn new(
        config: Arc<Config>,
        storage: Arc<Mutex<SqliteStorage>>,
    ) -> Result<Self, PressboxError> {
        let client = build_http_client(&config.user_agent, &config.fetch)?;
        let limiter = RateLimiter::new(config.fetch.delay_min_secs, config.fetch.delay_max_secs);
        let robots = RobotsCache::new(client.clone(), config.user_agent.crawler_name.clone());
        let dedup = Deduplicator::new(storage.clone());
        let validator = ArticleValidator::new(&config.crawler.reject_patterns);

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                storage,
                client,
                limiter,
                robots,
                dedup,
                validator,
                status: StatusReporter::new(),
                cancel: AtomicBool::new(false),
                state: Mutex::new(EngineState::Idle),
            }),
        })
    }

    /// Accepts a crawl over the sites eligible under the optional id filter
    ///
    /// Fails with `AlreadyRunning` while a run is active and with
    /// `NoEligibleSites` when the active-site filter leaves nothing to do.
    /// Must be called from within a tokio runtime.
    pub fn start(&self, days: u32, site_ids: Option<&[i64]>) -> Result<(), PressboxError> {
        if days == 0 {
            return Err(ConfigError::Validation(
                "days must be a positive integer".to_string(),
            )
            .into());
        }

        let mut state = self.inner.state.lock().unwrap();
        if *state == EngineState::Running {
            return Err(PressboxError::AlreadyRunning);
        }

        let sites: Vec<SiteRecord> = {
            let storage = self.inner.storage.lock().unwrap();
            let active = storage.get_active_sites()?;
            match site_ids {
                Some(ids) => active.into_iter().filter(|s| ids.contains(&s.id)).collect(),
                None => active,
            }
        };

        if sites.is_empty() {
            return Err(PressboxError::NoEligibleSites);
        }

        self.inner.cancel.store(false, Ordering::SeqCst);
        self.inner.status.begin_run();
        *state = EngineState::Running;
        drop(state);

        tracing::info!(
            "crawl accepted: {} site(s), {}-day window",
            sites.len(),
            days
        );

        let orchestrator = self.clone();
        tokio::spawn(async move { orchestrator.execute(sites, days).await });

        Ok(())
    }

    /// Requests cancellation; idempotent
    ///
    /// The flag is observed between units of work, so the run reaches
    /// `Cancelled` within one article fetch rather than instantly.
    pub fn stop(&self) {
        self.inner.cancel.store(true, Ordering::SeqCst);
        tracing::info!("stop requested");
    }

    /// A consistent snapshot of the latest run
    pub fn status(&self) -> StatusSnapshot {
        self.inner.status.snapshot()
    }

    /// Whether a run is currently active
    pub fn is_running(&self) -> bool {
        *self.inner.state.lock().unwrap() == EngineState::Running
    }

    fn cancelled(&self) -> bool {
        self.inner.cancel.load(Ordering::SeqCst)
    }

    async fn execute(self, sites: Vec<SiteRecord>, days: u32) {
        let outcome = self.run_sites(sites, days).await;
        self.inner.status.finish(outcome);
        *self.inner.state.lock().unwrap() = EngineState::Idle;
        tracing::info!("run finished: {:?}", outcome);
    }

    async fn run_sites(&self, sites: Vec<SiteRecord>, days: u32) -> RunState {
        let workers = self.inner.config.crawler.workers.max(1) as usize;
        let semaphore = Arc::new(Semaphore::new(workers));
        let mut tasks = JoinSet::new();

        for site in sites {
            let orchestrator = self.clone();
            let semaphore = semaphore.clone();
            tasks.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return SiteOutcome::Done,
                };
                if orchestrator.cancelled() {
                    return SiteOutcome::Cancelled;
                }
                orchestrator.crawl_site(&site, days).await
            });
        }

        let mut fatal = false;
        let mut cancelled = false;

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(SiteOutcome::Done) => {}
                Ok(SiteOutcome::Cancelled) => cancelled = true,
                Ok(SiteOutcome::Fatal) => {
                    fatal = true;
                    // stop the remaining site tasks at their next checkpoint
                    self.inner.cancel.store(true, Ordering::SeqCst);
                }
                Err(e) => {
                    self.inner
                        .status
                        .push_error(format!("site task failed: {}", e));
                }
            }
        }

        if fatal {
            RunState::Failed
        } else if cancelled || self.cancelled() {
            RunState::Cancelled
        } else {
            RunState::Completed
        }
    }

    /// Crawls one site: sitemap, window filter, then per-entry processing
    async fn crawl_site(&self, site: &SiteRecord, days: u32) -> SiteOutcome {
        self.inner.status.set_current_site(Some(&site.name));
        tracing::info!(site = %site.name, "crawling site");

        let entries = match fetch_site_entries(&self.inner.client, &site.sitemap_url).await {
            Ok(entries) => entries,
            Err(e) => {
                // site-level failure: record it and move on to the next site
                self.inner
                    .status
                    .push_error(format!("{}: {}", site.name, e));
                self.log_crawl(
                    site.id,
                    CrawlStage::Sitemap,
                    CrawlLogStatus::Failed,
                    0,
                    0,
                    Some(&e.to_string()),
                );
                return SiteOutcome::Done;
            }
        };

        let cutoff = Utc::now() - chrono::Duration::days(days as i64);
        // entries without a timestamp use discovery time as the cutoff
        // reference, which places them inside any window
        let in_window: Vec<SitemapEntry> = entries
            .into_iter()
            .filter(|entry| entry.last_modified.map_or(true, |t| t >= cutoff))
            .collect();

        tracing::info!(
            site = %site.name,
            "{} sitemap entries within the {}-day window",
            in_window.len(),
            days
        );

        self.log_crawl(
            site.id,
            CrawlStage::Sitemap,
            CrawlLogStatus::Success,
            in_window.len() as u32,
            0,
            None,
        );
        self.inner.status.add_total(in_window.len() as u64);

        let mut saved: u32 = 0;
        let mut failed: u32 = 0;

        for entry in &in_window {
            if self.cancelled() {
                self.log_crawl(
                    site.id,
                    CrawlStage::Article,
                    CrawlLogStatus::Failed,
                    in_window.len() as u32,
                    saved,
                    Some("run cancelled"),
                );
                return SiteOutcome::Cancelled;
            }

            match self.process_entry(site, entry).await {
                Ok(true) => {
                    saved += 1;
                    self.inner.status.record_saved();
                }
                Ok(false) => {}
                Err(e) if e.is_fatal() => {
                    self.inner
                        .status
                        .push_error(format!("article store failure: {}", e));
                    return SiteOutcome::Fatal;
                }
                Err(e) => {
                    failed += 1;
                    self.inner
                        .status
                        .push_error(format!("{}: {}", entry.url, e));
                }
            }

            self.inner.status.record_progress();
        }

        let status = if failed > 0 && saved == 0 {
            CrawlLogStatus::Failed
        } else {
            CrawlLogStatus::Success
        };
        let message =
            (failed > 0).then(|| format!("{} of {} entries failed", failed, in_window.len()));
        self.log_crawl(
            site.id,
            CrawlStage::Article,
            status,
            in_window.len() as u32,
            saved,
            message.as_deref(),
        );

        SiteOutcome::Done
    }

    /// Processes one sitemap entry
    ///
    /// `Ok(true)` means a new article was persisted; `Ok(false)` covers the
    /// benign skips (already ingested, rejected URL, robots denial, lost
    /// insert race). Errors bubble up for the caller to classify.
    async fn process_entry(
        &self,
        site: &SiteRecord,
        entry: &SitemapEntry,
    ) -> Result<bool, PressboxError> {
        let canonical = CanonicalUrl::parse(&entry.url)?;

        if !self.inner.validator.is_valid_url(canonical.as_str()) {
            self.inner
                .status
                .push_error(format!("{}: rejected by URL pattern", canonical));
            return Ok(false);
        }

        if !self.inner.dedup.is_new(&canonical)? {
            tracing::debug!(url = %canonical, "already ingested");
            return Ok(false);
        }

        if !self.inner.robots.is_allowed(canonical.url()).await {
            self.inner
                .status
                .push_error(format!("{}: disallowed by robots.txt", canonical));
            return Ok(false);
        }

        let host = extract_host(canonical.url()).unwrap_or_default();
        self.inner.limiter.acquire(&host).await;

        // a stop may have landed during the politeness delay
        if self.cancelled() {
            return Ok(false);
        }

        let html = fetch_html(&self.inner.client, canonical.as_str()).await?;

        if let Err(reason) = self.inner.validator.validate(canonical.as_str(), &html) {
            return Err(PressboxError::ExtractionFailed {
                url: canonical.as_str().to_string(),
                message: reason,
            });
        }

        let extracted = extract_article(&html);

        let sport_category = match site.site_type {
            SiteType::Specific => site.sport_focus.clone(),
            SiteType::General => Some(detect_category(
                canonical.as_str(),
                &extracted.title,
                &extracted.content,
            )),
        };

        let article = NewArticle {
            url_hash: canonical.hash().to_string(),
            url: canonical.as_str().to_string(),
            title: extracted.title,
            author: extracted.author,
            content: extracted.content,
            sport_category,
            published_at: extracted.published_at,
            last_modified: entry.last_modified.map(|t| t.to_rfc3339()),
            source_site: site.name.clone(),
        };

        let inserted = self.inner.dedup.record(&article)?;
        if inserted {
            tracing::info!(url = %canonical, site = %site.name, "article saved");
        }
        Ok(inserted)
    }

    /// Best-effort audit logging; a log write failure never affects the run
    fn log_crawl(
        &self,
        site_id: i64,
        stage: CrawlStage,
        status: CrawlLogStatus,
        urls_found: u32,
        articles_saved: u32,
        error_message: Option<&str>,
    ) {
        let mut storage = self.inner.storage.lock().unwrap();
        if let Err(e) = storage.log_crawl(
            site_id,
            stage,
            status,
            urls_found,
            articles_saved,
            error_message,
        ) {
            tracing::warn!("failed to write crawl log: {}", e);
        }
    }
}
