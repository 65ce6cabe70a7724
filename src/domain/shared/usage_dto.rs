use crate::domain::quota::Plan;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Response for GET /api/usage
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UsageResponse {
    pub plan: Plan,
    pub weekly_count: i32,
    pub weekly_limit: i32,
    /// `None` means unlimited
    pub remaining: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resets_at: Option<DateTime<Utc>>,
}
