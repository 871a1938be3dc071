//! Per-host politeness delays
//!
//! Before each outbound fetch a worker acquires the target host's lease,
//! which sleeps out the remainder of a randomized delay window measured from
//! that host's previous fetch. Leases are per host, so concurrent work
//! against different hosts is never serialized here.

use rand::Rng;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

type HostSlot = Arc<tokio::sync::Mutex<Option<Instant>>>;

/// Per-host randomized rate limiter
pub struct RateLimiter {
    delay_min: Duration,
    delay_max: Duration,
    hosts: Mutex<HashMap<String, HostSlot>>,
}

impl RateLimiter {
    /// Creates a rate limiter with the given delay window in seconds
    pub fn new(delay_min_secs: f64, delay_max_secs: f64) -> Self {
        Self {
            delay_min: Duration::from_secs_f64(delay_min_secs.max(0.0)),
            delay_max: Duration::from_secs_f64(delay_max_secs.max(delay_min_secs.max(0.0))),
            hosts: Mutex::new(HashMap::new()),
        }
    }

    /// Acquires the host's lease, waiting out the politeness delay
    ///
    /// The lease is held only for the bookkeeping window, not for the fetch
    /// itself; callers fetch after this returns.
    pub async fn acquire(&self, host: &str) {
        let slot = {
            let mut hosts = self.hosts.lock().unwrap();
            hosts.entry(host.to_string()).or_default().clone()
        };

        // serializes cadence per host
        let mut last_fetch = slot.lock().await;

        if let Some(previous) = *last_fetch {
            let delay = self.draw_delay();
            let elapsed = previous.elapsed();
            if elapsed < delay {
                tokio::time::sleep(delay - elapsed).await;
            }
        }

        *last_fetch = Some(Instant::now());
    }

    fn draw_delay(&self) -> Duration {
        if self.delay_max <= self.delay_min {
            return self.delay_min;
        }
        let min = self.delay_min.as_secs_f64();
        let max = self.delay_max.as_secs_f64();
        Duration::from_secs_f64(rand::thread_rng().gen_range(min..=max))
    }
}
