use crate::domain::auth::IdentityError;
use crate::error::AppError;
use crate::infrastructure::repositories::{
    GenerationRepositoryError, LedgerError, RateLimiterUnavailable,
};
use chrono::{DateTime, Utc};

#[derive(Debug, thiserror::Error)]
pub enum GenerationServiceError {
    #[error("invalid request: {0}")]
    Invalid(String),
    #[error("invalid credential: {0}")]
    InvalidCredential(String),
    #[error("visitor trial exhausted")]
    VisitorTrialExhausted { resets_at: DateTime<Utc> },
    #[error("weekly quota of {limit} exceeded")]
    WeeklyQuotaExceeded {
        limit: i32,
        resets_at: DateTime<Utc>,
    },
    #[error("ledger unavailable: {0}")]
    LedgerUnavailable(String),
    #[error("backend rate limited: {0}")]
    BackendRateLimited(String),
    #[error("backend failure: {0}")]
    BackendFailure(String),
    #[error("generation backend is not configured")]
    Misconfiguration,
}

impl From<IdentityError> for GenerationServiceError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::Dependency(msg) => GenerationServiceError::LedgerUnavailable(msg),
            other => GenerationServiceError::InvalidCredential(other.to_string()),
        }
    }
}

impl From<LedgerError> for GenerationServiceError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Aborted(exceeded) => GenerationServiceError::WeeklyQuotaExceeded {
                limit: exceeded.limit,
                resets_at: exceeded.resets_at,
            },
            LedgerError::Unavailable(msg) => GenerationServiceError::LedgerUnavailable(msg),
        }
    }
}

impl From<RateLimiterUnavailable> for GenerationServiceError {
    fn from(err: RateLimiterUnavailable) -> Self {
        GenerationServiceError::LedgerUnavailable(err.to_string())
    }
}

impl From<GenerationRepositoryError> for GenerationServiceError {
    fn from(err: GenerationRepositoryError) -> Self {
        match err {
            GenerationRepositoryError::RateLimited(msg) => {
                GenerationServiceError::BackendRateLimited(msg)
            }
            GenerationRepositoryError::ServiceError(msg) => {
                GenerationServiceError::BackendFailure(msg)
            }
        }
    }
}

impl From<GenerationServiceError> for AppError {
    fn from(err: GenerationServiceError) -> Self {
        match err {
            GenerationServiceError::Invalid(msg) => AppError::BadRequest(msg),
            GenerationServiceError::InvalidCredential(_) => {
                AppError::BadRequest("Invalid or expired credential".to_string())
            }
            GenerationServiceError::VisitorTrialExhausted { resets_at } => {
                AppError::VisitorTrialExhausted {
                    resets_at: Some(resets_at),
                }
            }
            GenerationServiceError::WeeklyQuotaExceeded { limit, resets_at } => {
                AppError::WeeklyQuotaExceeded {
                    limit,
                    resets_at: Some(resets_at),
                }
            }
            GenerationServiceError::LedgerUnavailable(msg) => AppError::LedgerUnavailable(msg),
            GenerationServiceError::BackendRateLimited(msg) => AppError::BackendRateLimited(msg),
            GenerationServiceError::BackendFailure(msg) => AppError::ExternalService(msg),
            GenerationServiceError::Misconfiguration => {
                AppError::Misconfiguration("OPENAI_API_KEY is not set".to_string())
            }
        }
    }
}
