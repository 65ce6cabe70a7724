use axum::{extract::State, Extension, Json};
use std::sync::Arc;

use crate::{
    domain::{
        quota::{QuotaService, QuotaServiceApi},
        shared::UsageResponse,
    },
    error::AppResult,
    infrastructure::auth::AuthAccount,
};

pub struct UsageController {
    quota_service: Arc<QuotaService>,
}

impl UsageController {
    pub fn new(quota_service: Arc<QuotaService>) -> Self {
        Self { quota_service }
    }

    /// GET /api/usage - Current weekly usage for the authenticated account
    pub async fn get_usage(
        State(controller): State<Arc<UsageController>>,
        Extension(auth_account): Extension<AuthAccount>,
    ) -> AppResult<Json<UsageResponse>> {
        let usage = controller
            .quota_service
            .get_usage(&auth_account.account_id)
            .await?;
        Ok(Json(usage))
    }
}
