use super::error::ProposalServiceError;
use super::model::{CreateProposalRequest, SavedProposal, SavedProposalResponse};
use crate::domain::generation::prompt::{sanitize, sanitize_with_limit};
use crate::infrastructure::repositories::ProposalRepository;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

const MAX_PROPOSAL_CHARS: usize = 10_000;
const MAX_TONE_CHARS: usize = 50;

pub struct ProposalService {
    proposal_repo: Arc<dyn ProposalRepository>,
}

impl ProposalService {
    pub fn new(proposal_repo: Arc<dyn ProposalRepository>) -> Self {
        Self { proposal_repo }
    }
}

/// Saved proposals are independent of the quota ledger: saving, listing
/// and deleting never consume or restore generations.
#[async_trait]
pub trait ProposalServiceApi: Send + Sync {
    async fn save(
        &self,
        account_id: &str,
        request: CreateProposalRequest,
    ) -> Result<SavedProposalResponse, ProposalServiceError>;

    async fn list(&self, account_id: &str)
        -> Result<Vec<SavedProposalResponse>, ProposalServiceError>;

    async fn delete(&self, account_id: &str, proposal_id: Uuid)
        -> Result<(), ProposalServiceError>;
}

#[async_trait]
impl ProposalServiceApi for ProposalService {
    async fn save(
        &self,
        account_id: &str,
        request: CreateProposalRequest,
    ) -> Result<SavedProposalResponse, ProposalServiceError> {
        let proposal: String = request.proposal.trim().chars().take(MAX_PROPOSAL_CHARS).collect();
        if proposal.is_empty() {
            return Err(ProposalServiceError::Invalid(
                "Proposal cannot be empty".to_string(),
            ));
        }

        let saved = SavedProposal {
            id: Uuid::new_v4(),
            account_id: account_id.to_string(),
            job_text: sanitize(&request.job_text),
            proposal,
            tone: sanitize_with_limit(&request.tone, MAX_TONE_CHARS),
            created_at: Utc::now(),
        };

        self.proposal_repo.create(&saved).await?;

        tracing::info!(
            account_id = %account_id,
            proposal_id = %saved.id,
            "Proposal saved"
        );

        Ok(saved.into())
    }

    async fn list(
        &self,
        account_id: &str,
    ) -> Result<Vec<SavedProposalResponse>, ProposalServiceError> {
        let proposals = self
            .proposal_repo
            .find_by_account(account_id)
            .await
            .map_err(|e| ProposalServiceError::Dependency(e.to_string()))?;
        Ok(proposals.into_iter().map(SavedProposalResponse::from).collect())
    }

    async fn delete(&self, account_id: &str, proposal_id: Uuid) -> Result<(), ProposalServiceError> {
        let deleted = self
            .proposal_repo
            .delete(account_id, proposal_id)
            .await
            .map_err(|e| ProposalServiceError::Dependency(e.to_string()))?;

        if !deleted {
            return Err(ProposalServiceError::NotFound);
        }

        tracing::info!(
            account_id = %account_id,
            proposal_id = %proposal_id,
            "Proposal deleted"
        );

        Ok(())
    }
}
