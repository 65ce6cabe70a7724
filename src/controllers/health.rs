use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;
use crate::infrastructure::db::{check_connection, DbPool};

#[derive(Clone)]
pub struct HealthState {
    pub pool: Arc<DbPool>,
    pub generation_configured: bool,
}

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

pub async fn health_ready(State(state): State<HealthState>) -> impl IntoResponse {
    let database_ok = check_connection(&state.pool).await.is_ok();
    let generation = if state.generation_configured {
        "configured"
    } else {
        "misconfigured"
    };

    let (status, label) = if database_ok && state.generation_configured {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "not_ready")
    };

    (
        status,
        Json(json!({
            "status": label,
            "database": if database_ok { "connected" } else { "disconnected" },
            "generation": generation
        })),
    )
}
