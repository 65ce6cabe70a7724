use crate::error::AppError;

#[derive(Debug, thiserror::Error)]
pub enum ProposalServiceError {
    #[error("dependency error: {0}")]
    Dependency(String),
    #[error("invalid input: {0}")]
    Invalid(String),
    #[error("proposal not found")]
    NotFound,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<AppError> for ProposalServiceError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::BadRequest(msg) => ProposalServiceError::Invalid(msg),
            AppError::NotFound(_) => ProposalServiceError::NotFound,
            _ => ProposalServiceError::Dependency(err.to_string()),
        }
    }
}

impl From<ProposalServiceError> for AppError {
    fn from(err: ProposalServiceError) -> Self {
        match err {
            ProposalServiceError::Invalid(msg) => AppError::BadRequest(msg),
            ProposalServiceError::NotFound => AppError::NotFound("Proposal not found".to_string()),
            ProposalServiceError::Dependency(msg) => AppError::Internal(msg),
            ProposalServiceError::Other(e) => AppError::Internal(e.to_string()),
        }
    }
}
