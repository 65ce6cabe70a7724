use crate::error::AppError;

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("invalid token: {0}")]
    Invalid(String),
    #[error("session revoked")]
    Revoked,
    #[error("dependency error: {0}")]
    Dependency(String),
}

impl From<IdentityError> for AppError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::Invalid(_) => AppError::Unauthorized("Invalid or expired token".to_string()),
            IdentityError::Revoked => AppError::Unauthorized("Session has been revoked".to_string()),
            IdentityError::Dependency(msg) => AppError::Internal(msg),
        }
    }
}
