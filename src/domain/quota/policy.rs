//! Weekly generation quota for authenticated accounts.
//!
//! `decide` is evaluated inside the ledger transaction with the record as
//! read under lock. It never performs I/O, so the storage layer may call it
//! again when a transaction is retried.

use super::model::{Plan, UsageRecord};
use chrono::{DateTime, Utc};

/// Generations per rolling week on the free plan
pub const WEEKLY_LIMIT: i32 = 5;

/// Length of the account window (7 days)
pub const WEEK_IN_MS: i64 = 7 * 24 * 60 * 60 * 1000;

/// What the ledger must persist for a permitted attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuotaDecision {
    /// No record yet: insert one with count 1
    Create(UsageRecord),
    /// Window elapsed: count back to 1, plan preserved
    Reset(UsageRecord),
    /// Free plan inside the window: count + 1
    Increment(UsageRecord),
    /// Pro plan inside the window: nothing written
    Unmetered(UsageRecord),
}

impl QuotaDecision {
    /// Record state after the transaction commits
    pub fn record(&self) -> &UsageRecord {
        match self {
            QuotaDecision::Create(r)
            | QuotaDecision::Reset(r)
            | QuotaDecision::Increment(r)
            | QuotaDecision::Unmetered(r) => r,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            QuotaDecision::Create(_) => "created",
            QuotaDecision::Reset(_) => "reset",
            QuotaDecision::Increment(_) => "incremented",
            QuotaDecision::Unmetered(_) => "unmetered",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("weekly quota of {limit} generations exceeded")]
pub struct QuotaExceeded {
    pub limit: i32,
    pub resets_at: DateTime<Utc>,
}

/// Apply one generation attempt to the account's current record.
pub fn decide(
    account_id: &str,
    existing: Option<&UsageRecord>,
    now: DateTime<Utc>,
) -> Result<QuotaDecision, QuotaExceeded> {
    let Some(record) = existing else {
        return Ok(QuotaDecision::Create(UsageRecord::first_attempt(
            account_id, now,
        )));
    };

    if record.window_expired(now) {
        return Ok(QuotaDecision::Reset(UsageRecord {
            weekly_count: 1,
            last_reset: now,
            ..record.clone()
        }));
    }

    if record.plan == Plan::Pro {
        return Ok(QuotaDecision::Unmetered(record.clone()));
    }

    if record.weekly_count >= WEEKLY_LIMIT {
        return Err(QuotaExceeded {
            limit: WEEKLY_LIMIT,
            resets_at: record.resets_at(),
        });
    }

    Ok(QuotaDecision::Increment(UsageRecord {
        weekly_count: record.weekly_count + 1,
        ..record.clone()
    }))
}
