//! Run status reporting
//!
//! The orchestrator is the only writer; the external API layer polls
//! [`StatusReporter::snapshot`]. All reads see a consistent copy taken under
//! the guard, `progress` and `articles_saved` never decrease within a run,
//! and `errors` is append-only.

use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};

/// Errors surfaced in a snapshot are capped to the most recent tail
const ERROR_TAIL: usize = 20;

/// Terminal and live states of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    Completed,
    Cancelled,
    Failed,
}

/// One crawl run's live accounting
#[derive(Debug, Clone)]
pub struct CrawlRun {
    pub state: RunState,
    pub current_site: Option<String>,
    pub progress: u64,
    pub total: u64,
    pub articles_saved: u64,
    pub errors: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl CrawlRun {
    fn new() -> Self {
        Self {
            state: RunState::Running,
            current_site: None,
            progress: 0,
            total: 0,
            articles_saved: 0,
            errors: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }
}

/// Point-in-time view of the engine, shaped for the status endpoint
#[derive(Debug, Clone)]
pub struct StatusSnapshot {
    pub is_running: bool,
    /// State of the latest run; `None` before any run has started
    pub state: Option<RunState>,
    pub current_site: Option<String>,
    pub progress: u64,
    pub total: u64,
    pub articles_saved: u64,
    /// Most recent errors (at most [`ERROR_TAIL`])
    pub errors: Vec<String>,
    pub started_at: Option<DateTime<Utc>>,
    /// Finish time of the previous run
    pub last_run: Option<DateTime<Utc>>,
}

struct StatusInner {
    run: Option<CrawlRun>,
    last_run: Option<DateTime<Utc>>,
}

/// Thread-safe holder of the current run
#[derive(Clone)]
pub struct StatusReporter {
    inner: Arc<Mutex<StatusInner>>,
}

impl StatusReporter {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(StatusInner {
                run: None,
                last_run: None,
            })),
        }
    }

    /// Starts accounting for a fresh run, superseding the previous one
    pub fn begin_run(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.run = Some(CrawlRun::new());
    }

    pub fn set_current_site(&self, site: Option<&str>) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(run) = inner.run.as_mut() {
            run.current_site = site.map(str::to_string);
        }
    }

    /// Grows the expected unit count; sitemaps resolve incrementally, so the
    /// total rises while a run is underway
    pub fn add_total(&self, units: u64) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(run) = inner.run.as_mut() {
            run.total += units;
        }
    }

    pub fn record_progress(&self) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(run) = inner.run.as_mut() {
            run.progress += 1;
        }
    }

    pub fn record_saved(&self) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(run) = inner.run.as_mut() {
            run.articles_saved += 1;
        }
    }

    pub fn push_error(&self, message: String) {
        tracing::warn!("{}", message);
        let mut inner = self.inner.lock().unwrap();
        if let Some(run) = inner.run.as_mut() {
            run.errors.push(message);
        }
    }

    /// Freezes the run in its terminal state
    pub fn finish(&self, state: RunState) {
        let now = Utc::now();
        let mut inner = self.inner.lock().unwrap();
        inner.last_run = Some(now);
        if let Some(run) = inner.run.as_mut() {
            run.state = state;
            run.current_site = None;
            run.finished_at = Some(now);
        }
    }

    /// A consistent copy of the latest run
    pub fn snapshot(&self) -> StatusSnapshot {
        let inner = self.inner.lock().unwrap();

        match &inner.run {
            Some(run) => {
                let errors = run
                    .errors
                    .iter()
                    .rev()
                    .take(ERROR_TAIL)
                    .rev()
                    .cloned()
                    .collect();

                StatusSnapshot {
                    is_running: run.state == RunState::Running,
                    state: Some(run.state),
                    current_site: run.current_site.clone(),
                    progress: run.progress,
                    total: run.total,
                    articles_saved: run.articles_saved,
                    errors,
                    started_at: Some(run.started_at),
                    last_run: inner.last_run,
                }
            }
            None => StatusSnapshot {
                is_running: false,
                state: None,
                current_site: None,
                progress: 0,
                total: 0,
                articles_saved: 0,
                errors: Vec::new(),
                started_at: None,
                last_run: inner.last_run,
            },
        }
    }
}

impl Default for StatusReporter {
    fn default() -> Self {
        Self::new()
    }
}
