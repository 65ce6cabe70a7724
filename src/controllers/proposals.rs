use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Extension, Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::proposals::{
        CreateProposalRequest, ProposalService, ProposalServiceApi, SavedProposalResponse,
    },
    error::{AppError, AppResult},
    infrastructure::auth::AuthAccount,
};

pub struct ProposalController {
    proposal_service: Arc<ProposalService>,
}

impl ProposalController {
    pub fn new(proposal_service: Arc<ProposalService>) -> Self {
        Self { proposal_service }
    }

    /// GET /api/proposals - List saved proposals, newest first
    pub async fn list_proposals(
        State(controller): State<Arc<ProposalController>>,
        Extension(auth_account): Extension<AuthAccount>,
    ) -> AppResult<Json<Vec<SavedProposalResponse>>> {
        let proposals = controller
            .proposal_service
            .list(&auth_account.account_id)
            .await?;
        Ok(Json(proposals))
    }

    /// POST /api/proposals - Save a generated proposal
    pub async fn create_proposal(
        State(controller): State<Arc<ProposalController>>,
        Extension(auth_account): Extension<AuthAccount>,
        payload: Result<Json<CreateProposalRequest>, JsonRejection>,
    ) -> AppResult<(StatusCode, Json<SavedProposalResponse>)> {
        let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

        let saved = controller
            .proposal_service
            .save(&auth_account.account_id, request)
            .await?;

        Ok((StatusCode::CREATED, Json(saved)))
    }

    /// DELETE /api/proposals/:proposalId - Delete a saved proposal
    pub async fn delete_proposal(
        State(controller): State<Arc<ProposalController>>,
        Extension(auth_account): Extension<AuthAccount>,
        proposal_id: Result<Path<Uuid>, PathRejection>,
    ) -> AppResult<StatusCode> {
        let Path(proposal_id) =
            proposal_id.map_err(|_| AppError::BadRequest("Invalid proposal id".to_string()))?;

        controller
            .proposal_service
            .delete(&auth_account.account_id, proposal_id)
            .await?;

        Ok(StatusCode::NO_CONTENT)
    }
}
