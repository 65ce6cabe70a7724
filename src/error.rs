use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Main application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    #[error("Invalid input: {0}")]
    BadRequest(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Visitor trial exhausted")]
    VisitorTrialExhausted { resets_at: Option<DateTime<Utc>> },

    #[error("Weekly quota of {limit} generations exceeded")]
    WeeklyQuotaExceeded {
        limit: i32,
        resets_at: Option<DateTime<Utc>>,
    },

    #[error("Generation backend rate limited: {0}")]
    BackendRateLimited(String),

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Quota store unavailable: {0}")]
    LedgerUnavailable(String),

    #[error("Misconfiguration: {0}")]
    Misconfiguration(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Closed set of machine-readable error kinds returned to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidRequest,
    Unauthorized,
    NotFound,
    VisitorTrialExhausted,
    WeeklyQuotaExceeded,
    BackendRateLimited,
    BackendServiceError,
    LedgerUnavailable,
    Misconfiguration,
    Internal,
}

impl ErrorCode {
    /// Whether the same request may succeed later without changes
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::BackendRateLimited | Self::BackendServiceError | Self::LedgerUnavailable
        )
    }
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    pub code: ErrorCode,
    pub retryable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resets_at: Option<DateTime<Utc>>,
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::VisitorTrialExhausted { .. } | Self::BackendRateLimited(_) => {
                StatusCode::TOO_MANY_REQUESTS
            }
            Self::WeeklyQuotaExceeded { .. } => StatusCode::FORBIDDEN,
            Self::Database(_)
            | Self::ExternalService(_)
            | Self::LedgerUnavailable(_)
            | Self::Misconfiguration(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Unauthorized(_) => ErrorCode::Unauthorized,
            Self::BadRequest(_) => ErrorCode::InvalidRequest,
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::VisitorTrialExhausted { .. } => ErrorCode::VisitorTrialExhausted,
            Self::WeeklyQuotaExceeded { .. } => ErrorCode::WeeklyQuotaExceeded,
            Self::BackendRateLimited(_) => ErrorCode::BackendRateLimited,
            Self::ExternalService(_) => ErrorCode::BackendServiceError,
            Self::Database(_) | Self::LedgerUnavailable(_) => ErrorCode::LedgerUnavailable,
            Self::Misconfiguration(_) => ErrorCode::Misconfiguration,
            Self::Internal(_) => ErrorCode::Internal,
        }
    }

    /// Message shown to the caller. Server-side failures never leak their detail.
    pub fn public_message(&self) -> String {
        match self {
            Self::Unauthorized(msg) | Self::BadRequest(msg) | Self::NotFound(msg) => msg.clone(),
            Self::VisitorTrialExhausted { .. } => {
                "Free trial used up! Sign in with Google to continue.".to_string()
            }
            Self::WeeklyQuotaExceeded { limit, .. } => {
                format!("Weekly quota of {} generations exceeded. Please upgrade.", limit)
            }
            Self::BackendRateLimited(_) => {
                "OpenAI rate limit reached. Please try again later.".to_string()
            }
            Self::ExternalService(_) => "The AI service failed to generate a proposal.".to_string(),
            Self::Database(_) | Self::LedgerUnavailable(_) => "Database update failed.".to_string(),
            Self::Misconfiguration(_) => {
                "Server misconfiguration: Missing OpenAI API key.".to_string()
            }
            Self::Internal(_) => "Internal server error.".to_string(),
        }
    }

    pub fn resets_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::VisitorTrialExhausted { resets_at } => *resets_at,
            Self::WeeklyQuotaExceeded { resets_at, .. } => *resets_at,
            _ => None,
        }
    }

    /// Convert to error response
    pub fn to_response(&self) -> ErrorResponse {
        let code = self.code();
        ErrorResponse {
            error: self.public_message(),
            code,
            retryable: code.is_retryable(),
            resets_at: self.resets_at(),
        }
    }
}

/// Implement IntoResponse for automatic conversion in handlers
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(
                error = %self,
                status = %status.as_u16(),
                "Request failed"
            );
        } else {
            tracing::warn!(
                error = %self,
                status = %status.as_u16(),
                "Request rejected"
            );
        }

        let retry_after = self
            .resets_at()
            .map(|at| (at - Utc::now()).num_seconds().max(1));

        let mut response = (status, Json(self.to_response())).into_response();
        if let Some(seconds) = retry_after {
            if let Ok(value) = HeaderValue::from_str(&seconds.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }

        response
    }
}

/// Custom result type for the application
pub type AppResult<T> = Result<T, AppError>;
