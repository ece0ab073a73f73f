use crate::providers::benchmark::BenchmarkYieldProvider;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

pub const REFRESH_INTERVAL_HOURS: i64 = 12;

#[derive(Debug, Clone, Copy, PartialEq)]
struct CachedYield {
    value: f64,
    /// `None` until the first successful fetch.
    next_refresh: Option<DateTime<Utc>>,
    /// Bumped after every fetch, successful or not.
    attempts: u64,
}

impl CachedYield {
    fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_refresh.map_or(true, |due| now >= due)
    }
}

/// Market-wide dividend yield shared by every valuation call.
///
/// The value and its refresh deadline live behind one lock. Callers that find
/// the value current only take the read side. Callers that find it due queue on
/// `refresh`, re-check, and at most one of them fetches. Waiters that see the
/// attempt counter moved while they queued take whatever that fetch left behind.
/// A failed fetch keeps the stale value and leaves the deadline alone, so the
/// next call retries.
pub struct BenchmarkYieldCache {
    provider: Arc<dyn BenchmarkYieldProvider>,
    state: RwLock<CachedYield>,
    refresh: Mutex<()>,
}

impl BenchmarkYieldCache {
    pub fn new(provider: Arc<dyn BenchmarkYieldProvider>) -> Self {
        Self {
            provider,
            state: RwLock::new(CachedYield {
                value: 0.0,
                next_refresh: None,
                attempts: 0,
            }),
            refresh: Mutex::new(()),
        }
    }

    pub async fn get(&self) -> f64 {
        self.get_at(Utc::now()).await
    }

    pub async fn get_at(&self, now: DateTime<Utc>) -> f64 {
        let seen = *self.state.read().await;
        if !seen.is_due(now) {
            return seen.value;
        }

        let _guard = self.refresh.lock().await;

        let cached = *self.state.read().await;
        if !cached.is_due(now) || cached.attempts != seen.attempts {
            return cached.value;
        }

        let result = self.provider.fetch().await;
        let mut state = self.state.write().await;
        state.attempts += 1;
        match result {
            Ok(value) => {
                let next_refresh = now + Duration::hours(REFRESH_INTERVAL_HOURS);
                state.value = value;
                state.next_refresh = Some(next_refresh);
                tracing::info!(value, %next_refresh, "benchmark dividend yield updated");
                value
            }
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    stale_value = state.value,
                    "failed to refresh benchmark dividend yield; serving last known value"
                );
                state.value
            }
        }
    }

    pub async fn next_refresh(&self) -> Option<DateTime<Utc>> {
        self.state.read().await.next_refresh
    }
}
