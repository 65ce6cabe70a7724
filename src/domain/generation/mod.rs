pub mod error;
pub mod prompt;
pub mod service;

use serde::{Deserialize, Serialize};

pub use error::GenerationServiceError;
pub use service::{Caller, GenerationRequest, GenerationService, GenerationServiceApi};

/// Request for POST /api/generate
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub job_text: String,
    #[serde(default)]
    pub profile: serde_json::Value,
    #[serde(default)]
    pub tone: String,
}

/// Response for POST /api/generate
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub proposal: String,
}
