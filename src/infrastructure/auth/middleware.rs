use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use super::credentials::bearer_token;
use crate::{domain::auth::IdentityVerifier, error::AppError};

/// Account context injected into request extensions after authentication
#[derive(Debug, Clone)]
pub struct AuthAccount {
    pub account_id: String,
}

/// Authentication middleware for routes that require an account
pub async fn auth_middleware(
    State(identity): State<Arc<dyn IdentityVerifier>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers())
        .map_err(|_| AppError::Unauthorized("Invalid authorization format".to_string()))?
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".to_string()))?;

    let account_id = identity.verify(&token, true).await?;

    request.extensions_mut().insert(AuthAccount { account_id });

    Ok(next.run(request).await)
}
