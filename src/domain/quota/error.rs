use crate::error::AppError;
use crate::infrastructure::repositories::LedgerError;

#[derive(Debug, thiserror::Error)]
pub enum QuotaServiceError {
    #[error("dependency error: {0}")]
    Dependency(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<LedgerError> for QuotaServiceError {
    fn from(err: LedgerError) -> Self {
        QuotaServiceError::Dependency(err.to_string())
    }
}

impl From<QuotaServiceError> for AppError {
    fn from(err: QuotaServiceError) -> Self {
        match err {
            QuotaServiceError::Dependency(msg) => AppError::LedgerUnavailable(msg),
            QuotaServiceError::Other(e) => AppError::Internal(e.to_string()),
        }
    }
}
