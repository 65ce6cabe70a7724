use super::rate_limit_repository::{
    RateLimitDecision, RateLimitRepository, RateLimiterUnavailable, RATE_LIMIT_PREFIX,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::{aio::ConnectionManager, Client, ErrorKind, RedisError, Script};
use std::time::Duration;
use uuid::Uuid;

/// Prune, count and record in one round trip so concurrent checks on the
/// same key cannot both take the last slot.
const SLIDING_WINDOW_SCRIPT: &str = r#"
local key = KEYS[1]
local now = tonumber(ARGV[1])
local window = tonumber(ARGV[2])
local limit = tonumber(ARGV[3])

redis.call('ZREMRANGEBYSCORE', key, 0, now - window)
local count = redis.call('ZCARD', key)

if count < limit then
    redis.call('ZADD', key, now, ARGV[4])
    redis.call('PEXPIRE', key, window)
    local oldest = redis.call('ZRANGE', key, 0, 0, 'WITHSCORES')
    return {1, limit - count - 1, tonumber(oldest[2]) + window}
end

local oldest = redis.call('ZRANGE', key, 0, 0, 'WITHSCORES')
if oldest[2] == nil then
    return {0, 0, now + window}
end
return {0, 0, tonumber(oldest[2]) + window}
"#;

/// Sliding window shared by every instance through Redis
pub struct RedisRateLimitRepository {
    connection: ConnectionManager,
    script: Script,
    limit: u32,
    window_ms: i64,
}

impl RedisRateLimitRepository {
    pub async fn connect(
        redis_url: &str,
        limit: u32,
        window: Duration,
    ) -> Result<Self, RedisError> {
        let window_ms = i64::try_from(window.as_millis()).map_err(|_| {
            RedisError::from((
                ErrorKind::InvalidClientConfig,
                "rate limit window does not fit in milliseconds",
            ))
        })?;
        let client = Client::open(redis_url)?;
        let connection = client.get_connection_manager().await?;

        Ok(Self {
            connection,
            script: Script::new(SLIDING_WINDOW_SCRIPT),
            limit,
            window_ms,
        })
    }
}

#[async_trait]
impl RateLimitRepository for RedisRateLimitRepository {
    async fn limit(&self, key: &str) -> Result<RateLimitDecision, RateLimiterUnavailable> {
        let now_ms = Utc::now().timestamp_millis();
        let member = format!("{}-{}", now_ms, Uuid::new_v4().simple());
        let mut connection = self.connection.clone();

        let (allowed, remaining, reset_ms): (i64, i64, i64) = self
            .script
            .key(format!("{}:{}", RATE_LIMIT_PREFIX, key))
            .arg(now_ms)
            .arg(self.window_ms)
            .arg(self.limit)
            .arg(member)
            .invoke_async(&mut connection)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Redis sliding window check failed");
                RateLimiterUnavailable(e.to_string())
            })?;

        Ok(RateLimitDecision {
            success: allowed == 1,
            remaining: remaining.max(0) as u32,
            reset_at: DateTime::<Utc>::from_timestamp_millis(reset_ms).unwrap_or_else(Utc::now),
        })
    }
}
