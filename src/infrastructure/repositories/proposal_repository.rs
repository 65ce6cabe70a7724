use crate::domain::proposals::SavedProposal;
use crate::error::AppResult;
use crate::infrastructure::db::DbPool;
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

/// Storage for proposals saved by accounts
#[async_trait]
pub trait ProposalRepository: Send + Sync {
    async fn create(&self, proposal: &SavedProposal) -> AppResult<()>;

    /// Newest first
    async fn find_by_account(&self, account_id: &str) -> AppResult<Vec<SavedProposal>>;

    /// Returns false when the proposal does not exist or belongs to another account
    async fn delete(&self, account_id: &str, proposal_id: Uuid) -> AppResult<bool>;
}

pub struct PostgresProposalRepository {
    pool: Arc<DbPool>,
}

impl PostgresProposalRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProposalRepository for PostgresProposalRepository {
    async fn create(&self, proposal: &SavedProposal) -> AppResult<()> {
        let pool = self.pool.as_ref();

        sqlx::query(
            r#"
            INSERT INTO saved_proposals (id, account_id, job_text, proposal, tone, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(proposal.id)
        .bind(&proposal.account_id)
        .bind(&proposal.job_text)
        .bind(&proposal.proposal)
        .bind(&proposal.tone)
        .bind(proposal.created_at)
        .execute(pool)
        .await?;

        Ok(())
    }

    async fn find_by_account(&self, account_id: &str) -> AppResult<Vec<SavedProposal>> {
        let pool = self.pool.as_ref();
        let proposals = sqlx::query_as::<_, SavedProposal>(
            r#"
            SELECT id, account_id, job_text, proposal, tone, created_at
            FROM saved_proposals
            WHERE account_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(account_id)
        .fetch_all(pool)
        .await?;

        Ok(proposals)
    }

    async fn delete(&self, account_id: &str, proposal_id: Uuid) -> AppResult<bool> {
        let pool = self.pool.as_ref();
        let result = sqlx::query(
            r#"
            DELETE FROM saved_proposals
            WHERE id = $1 AND account_id = $2
            "#,
        )
        .bind(proposal_id)
        .bind(account_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
