use super::policy::{WEEKLY_LIMIT, WEEK_IN_MS};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "text")]
#[sqlx(rename_all = "lowercase")]
pub enum Plan {
    #[serde(rename = "free")]
    Free,
    #[serde(rename = "pro")]
    Pro,
}

impl Plan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Pro => "pro",
        }
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Weekly generation counter for one account
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct UsageRecord {
    pub account_id: String,
    pub weekly_count: i32,
    pub last_reset: DateTime<Utc>,
    pub plan: Plan,
}

impl UsageRecord {
    /// Record created by an account's first generation attempt
    pub fn first_attempt(account_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            account_id: account_id.to_string(),
            weekly_count: 1,
            last_reset: now,
            plan: Plan::Free,
        }
    }

    /// Strictly greater than one week: a request exactly on the boundary is
    /// still inside the current window.
    pub fn window_expired(&self, now: DateTime<Utc>) -> bool {
        (now - self.last_reset).num_milliseconds() > WEEK_IN_MS
    }

    /// First instant at which the next attempt resets the counter
    pub fn resets_at(&self) -> DateTime<Utc> {
        self.last_reset + Duration::milliseconds(WEEK_IN_MS + 1)
    }

    pub fn is_metered(&self) -> bool {
        self.plan != Plan::Pro
    }

    /// Generations left in the current window, `None` when unlimited
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<i32> {
        if !self.is_metered() {
            return None;
        }
        if self.window_expired(now) {
            return Some(WEEKLY_LIMIT);
        }
        Some((WEEKLY_LIMIT - self.weekly_count).max(0))
    }
}
