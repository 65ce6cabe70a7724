use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Namespace shared by every limiter key
pub const RATE_LIMIT_PREFIX: &str = "ai-proposal";

/// Outcome of one sliding-window check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub success: bool,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
#[error("rate limiter unavailable: {0}")]
pub struct RateLimiterUnavailable(pub String);

/// Sliding-window limiter: at most N requests per key per window.
/// A successful check records the request.
#[async_trait]
pub trait RateLimitRepository: Send + Sync {
    async fn limit(&self, key: &str) -> Result<RateLimitDecision, RateLimiterUnavailable>;
}
