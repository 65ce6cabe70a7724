use super::error::QuotaServiceError;
use super::model::{Plan, UsageRecord};
use super::policy::WEEKLY_LIMIT;
use crate::domain::shared::UsageResponse;
use crate::infrastructure::repositories::UsageRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Read side of the quota ledger, polled by clients to display remaining
/// generations. Never creates or mutates records.
pub struct QuotaService {
    usage_repo: Arc<dyn UsageRepository>,
}

impl QuotaService {
    pub fn new(usage_repo: Arc<dyn UsageRepository>) -> Self {
        Self { usage_repo }
    }
}

#[async_trait]
pub trait QuotaServiceApi: Send + Sync {
    async fn get_usage(&self, account_id: &str) -> Result<UsageResponse, QuotaServiceError>;
}

#[async_trait]
impl QuotaServiceApi for QuotaService {
    async fn get_usage(&self, account_id: &str) -> Result<UsageResponse, QuotaServiceError> {
        let record = self.usage_repo.find(account_id).await?;
        Ok(build_usage_response(record.as_ref(), Utc::now()))
    }
}

fn build_usage_response(record: Option<&UsageRecord>, now: DateTime<Utc>) -> UsageResponse {
    let Some(record) = record else {
        return UsageResponse {
            plan: Plan::Free,
            weekly_count: 0,
            weekly_limit: WEEKLY_LIMIT,
            remaining: Some(WEEKLY_LIMIT),
            resets_at: None,
        };
    };

    let expired = record.window_expired(now);
    UsageResponse {
        plan: record.plan,
        weekly_count: if expired { 0 } else { record.weekly_count },
        weekly_limit: WEEKLY_LIMIT,
        remaining: record.remaining(now),
        resets_at: if expired || !record.is_metered() {
            None
        } else {
            Some(record.resets_at())
        },
    }
}
