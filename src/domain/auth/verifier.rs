use super::error::IdentityError;
use super::jwt::JwtManager;
use crate::infrastructure::repositories::RevocationRepository;
use async_trait::async_trait;
use std::sync::Arc;

/// Turns a bearer credential into a stable account identifier
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Returns the account id, or fails when the token is malformed,
    /// expired, signed with another key or (with `check_revoked`) issued
    /// before the account's sessions were revoked.
    async fn verify(&self, token: &str, check_revoked: bool) -> Result<String, IdentityError>;
}

pub struct JwtIdentityVerifier {
    jwt_manager: JwtManager,
    revocation_repo: Arc<dyn RevocationRepository>,
}

impl JwtIdentityVerifier {
    pub fn new(jwt_manager: JwtManager, revocation_repo: Arc<dyn RevocationRepository>) -> Self {
        Self {
            jwt_manager,
            revocation_repo,
        }
    }
}

#[async_trait]
impl IdentityVerifier for JwtIdentityVerifier {
    async fn verify(&self, token: &str, check_revoked: bool) -> Result<String, IdentityError> {
        let claims = self.jwt_manager.validate_token(token)?;

        if check_revoked {
            let revoked_at = self
                .revocation_repo
                .revoked_at(&claims.sub)
                .await
                .map_err(|e| IdentityError::Dependency(e.to_string()))?;

            if let Some(revoked_at) = revoked_at {
                if claims.iat < revoked_at.timestamp() {
                    tracing::warn!(
                        account_id = %claims.sub,
                        revoked_at = %revoked_at,
                        "Rejected token issued before session revocation"
                    );
                    return Err(IdentityError::Revoked);
                }
            }
        }

        Ok(claims.sub)
    }
}
