use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::{
    domain::generation::{
        GenerateRequest, GenerateResponse, GenerationRequest, GenerationService,
        GenerationServiceApi,
    },
    error::{AppError, AppResult},
    infrastructure::auth::{bearer_token, client_key},
};

pub struct GenerationController {
    generation_service: Arc<GenerationService>,
}

impl GenerationController {
    pub fn new(generation_service: Arc<GenerationService>) -> Self {
        Self { generation_service }
    }

    /// POST /api/generate - Generate a proposal for a job description.
    /// Output is personalized and metered, so no response is cacheable.
    pub async fn generate(
        State(controller): State<Arc<GenerationController>>,
        headers: HeaderMap,
        payload: Result<Json<GenerateRequest>, JsonRejection>,
    ) -> Response {
        let mut response = match controller.handle(&headers, payload).await {
            Ok(body) => body.into_response(),
            Err(e) => e.into_response(),
        };

        response
            .headers_mut()
            .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
        response
    }

    async fn handle(
        &self,
        headers: &HeaderMap,
        payload: Result<Json<GenerateRequest>, JsonRejection>,
    ) -> AppResult<Json<GenerateResponse>> {
        let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
        let credential = bearer_token(headers)?;

        let proposal = self
            .generation_service
            .generate(GenerationRequest {
                job_text: request.job_text,
                profile: request.profile,
                tone: request.tone,
                credential,
                client_key: client_key(headers),
            })
            .await?;

        Ok(Json(GenerateResponse { proposal }))
    }
}
