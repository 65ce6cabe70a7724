use super::rate_limit_repository::{
    RateLimitDecision, RateLimitRepository, RateLimiterUnavailable, RATE_LIMIT_PREFIX,
};
use async_trait::async_trait;
use chrono::Utc;
use moka::future::Cache;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

const MAX_TRACKED_KEYS: u64 = 100_000;

type RequestLog = Arc<Mutex<VecDeque<Instant>>>;

/// Process-local sliding window. Each instance keeps its own counts, so it
/// only enforces the limit for a single-node deployment.
pub struct MemoryRateLimitRepository {
    windows: Cache<String, RequestLog>,
    limit: u32,
    window: Duration,
}

impl MemoryRateLimitRepository {
    pub fn new(limit: u32, window: Duration) -> Self {
        // A log idle for a whole window holds only expired entries.
        let windows = Cache::builder()
            .max_capacity(MAX_TRACKED_KEYS)
            .time_to_idle(window)
            .build();

        Self {
            windows,
            limit,
            window,
        }
    }

    async fn limit_at(&self, key: &str, now: Instant) -> RateLimitDecision {
        let log = self
            .windows
            .get_with(format!("{}:{}", RATE_LIMIT_PREFIX, key), async {
                Arc::new(Mutex::new(VecDeque::new()))
            })
            .await;

        let mut log = log.lock().unwrap_or_else(PoisonError::into_inner);
        while let Some(&oldest) = log.front() {
            if now.duration_since(oldest) >= self.window {
                log.pop_front();
            } else {
                break;
            }
        }

        let success = (log.len() as u32) < self.limit;
        if success {
            log.push_back(now);
        }

        let remaining = self.limit.saturating_sub(log.len() as u32);
        let reset_in = log
            .front()
            .map(|oldest| self.window.saturating_sub(now.duration_since(*oldest)))
            .unwrap_or(self.window);
        let reset_at = Utc::now()
            + chrono::Duration::from_std(reset_in).unwrap_or_else(|_| chrono::Duration::zero());

        RateLimitDecision {
            success,
            remaining,
            reset_at,
        }
    }
}

#[async_trait]
impl RateLimitRepository for MemoryRateLimitRepository {
    async fn limit(&self, key: &str) -> Result<RateLimitDecision, RateLimiterUnavailable> {
        Ok(self.limit_at(key, Instant::now()).await)
    }
}
