use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A generated proposal an account chose to keep. Immutable once stored.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct SavedProposal {
    pub id: Uuid,
    pub account_id: String,
    pub job_text: String,
    pub proposal: String,
    pub tone: String,
    pub created_at: DateTime<Utc>,
}

/// Request for POST /api/proposals
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProposalRequest {
    pub job_text: String,
    pub proposal: String,
    #[serde(default)]
    pub tone: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedProposalResponse {
    pub id: Uuid,
    pub job_text: String,
    pub proposal: String,
    pub tone: String,
    pub created_at: DateTime<Utc>,
}

impl From<SavedProposal> for SavedProposalResponse {
    fn from(saved: SavedProposal) -> Self {
        Self {
            id: saved.id,
            job_text: saved.job_text,
            proposal: saved.proposal,
            tone: saved.tone,
            created_at: saved.created_at,
        }
    }
}
