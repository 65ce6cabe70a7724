use crate::error::AppResult;
use crate::infrastructure::db::DbPool;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Session revocations written by the identity provider. Tokens issued
/// before `revoked_at` are no longer accepted for the account.
#[async_trait]
pub trait RevocationRepository: Send + Sync {
    async fn revoked_at(&self, account_id: &str) -> AppResult<Option<DateTime<Utc>>>;
}

pub struct PostgresRevocationRepository {
    pool: Arc<DbPool>,
}

impl PostgresRevocationRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RevocationRepository for PostgresRevocationRepository {
    async fn revoked_at(&self, account_id: &str) -> AppResult<Option<DateTime<Utc>>> {
        let pool = self.pool.as_ref();
        let revoked_at = sqlx::query_scalar::<_, DateTime<Utc>>(
            r#"
            SELECT revoked_at
            FROM revoked_sessions
            WHERE account_id = $1
            "#,
        )
        .bind(account_id)
        .fetch_optional(pool)
        .await?;

        Ok(revoked_at)
    }
}
