use super::error::IdentityError;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Account ID
    pub exp: i64,    // Expiration time
    pub iat: i64,    // Issued at
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

/// Validates HS256 tokens issued by the identity provider
pub struct JwtManager {
    secret: String,
    issuer: Option<String>,
}

impl JwtManager {
    pub fn new(secret: String, issuer: Option<String>) -> Self {
        Self { secret, issuer }
    }

    /// Validate a JWT token and extract claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, IdentityError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        if let Some(issuer) = &self.issuer {
            validation.set_required_spec_claims(&["exp", "sub", "iss"]);
            validation.set_issuer(&[issuer]);
        }

        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| IdentityError::Invalid(e.to_string()))?;

        if claims.sub.trim().is_empty() {
            return Err(IdentityError::Invalid("empty subject".to_string()));
        }

        Ok(claims)
    }
}
