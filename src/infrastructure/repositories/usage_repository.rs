use crate::domain::quota::{QuotaDecision, QuotaExceeded, UsageRecord};
use crate::infrastructure::db::DbPool;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Contention retries before the ledger reports itself unavailable
const MAX_TRANSACTION_ATTEMPTS: u32 = 5;

/// Read-modify-write step run against the record as read under lock.
pub type QuotaMutation<'a> =
    &'a (dyn Fn(Option<&UsageRecord>) -> Result<QuotaDecision, QuotaExceeded> + Send + Sync);

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The mutation refused the attempt; nothing was written
    #[error(transparent)]
    Aborted(#[from] QuotaExceeded),
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

/// Per-account quota ledger.
///
/// `transact` must make the read and the write atomic with respect to other
/// transactions on the same account, so two concurrent attempts can never
/// both take the last remaining slot.
#[async_trait]
pub trait UsageRepository: Send + Sync {
    async fn transact(
        &self,
        account_id: &str,
        mutation: QuotaMutation<'_>,
    ) -> Result<QuotaDecision, LedgerError>;

    async fn find(&self, account_id: &str) -> Result<Option<UsageRecord>, LedgerError>;
}

pub struct PostgresUsageRepository {
    pool: Arc<DbPool>,
}

enum AttemptError {
    Aborted(QuotaExceeded),
    Contention(String),
    Storage(sqlx::Error),
}

impl From<sqlx::Error> for AttemptError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            // serialization_failure, deadlock_detected
            if matches!(db_err.code().as_deref(), Some("40001") | Some("40P01")) {
                return AttemptError::Contention(db_err.message().to_string());
            }
        }
        AttemptError::Storage(err)
    }
}

impl PostgresUsageRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    async fn try_transact(
        &self,
        account_id: &str,
        mutation: QuotaMutation<'_>,
    ) -> Result<QuotaDecision, AttemptError> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_as::<_, UsageRecord>(
            r#"
            SELECT account_id, weekly_count, last_reset, plan
            FROM usage_records
            WHERE account_id = $1
            FOR UPDATE
            "#,
        )
        .bind(account_id)
        .fetch_optional(&mut *tx)
        .await?;

        // Dropping `tx` without commit rolls it back.
        let decision = mutation(existing.as_ref()).map_err(AttemptError::Aborted)?;

        match &decision {
            QuotaDecision::Create(record) => {
                let inserted = sqlx::query(
                    r#"
                    INSERT INTO usage_records (account_id, weekly_count, last_reset, plan, created_at, updated_at)
                    VALUES ($1, $2, $3, $4, NOW(), NOW())
                    ON CONFLICT (account_id) DO NOTHING
                    "#,
                )
                .bind(&record.account_id)
                .bind(record.weekly_count)
                .bind(record.last_reset)
                .bind(record.plan.as_str())
                .execute(&mut *tx)
                .await?;

                if inserted.rows_affected() == 0 {
                    return Err(AttemptError::Contention(
                        "record created by a concurrent transaction".to_string(),
                    ));
                }
            }
            QuotaDecision::Reset(record) | QuotaDecision::Increment(record) => {
                sqlx::query(
                    r#"
                    UPDATE usage_records
                    SET weekly_count = $2, last_reset = $3, plan = $4, updated_at = NOW()
                    WHERE account_id = $1
                    "#,
                )
                .bind(&record.account_id)
                .bind(record.weekly_count)
                .bind(record.last_reset)
                .bind(record.plan.as_str())
                .execute(&mut *tx)
                .await?;
            }
            QuotaDecision::Unmetered(_) => {}
        }

        tx.commit().await?;

        Ok(decision)
    }
}

#[async_trait]
impl UsageRepository for PostgresUsageRepository {
    async fn transact(
        &self,
        account_id: &str,
        mutation: QuotaMutation<'_>,
    ) -> Result<QuotaDecision, LedgerError> {
        let mut attempt = 1;
        loop {
            match self.try_transact(account_id, mutation).await {
                Ok(decision) => return Ok(decision),
                Err(AttemptError::Aborted(exceeded)) => return Err(LedgerError::Aborted(exceeded)),
                Err(AttemptError::Contention(reason)) if attempt < MAX_TRANSACTION_ATTEMPTS => {
                    tracing::debug!(
                        account_id = %account_id,
                        attempt = attempt,
                        reason = %reason,
                        "Ledger transaction contention, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(10 * u64::from(attempt))).await;
                    attempt += 1;
                }
                Err(AttemptError::Contention(reason)) => {
                    return Err(LedgerError::Unavailable(format!(
                        "transaction contention after {} attempts: {}",
                        attempt, reason
                    )))
                }
                Err(AttemptError::Storage(e)) => return Err(LedgerError::Unavailable(e.to_string())),
            }
        }
    }

    async fn find(&self, account_id: &str) -> Result<Option<UsageRecord>, LedgerError> {
        let pool = self.pool.as_ref();
        sqlx::query_as::<_, UsageRecord>(
            r#"
            SELECT account_id, weekly_count, last_reset, plan
            FROM usage_records
            WHERE account_id = $1
            "#,
        )
        .bind(account_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| LedgerError::Unavailable(e.to_string()))
    }
}
