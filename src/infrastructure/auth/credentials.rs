use axum::http::{header, HeaderMap};

use crate::error::AppError;

/// Client identifier used when no proxy header is present
pub const LOCAL_CLIENT_KEY: &str = "local-test-ip";

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_REAL_IP: &str = "x-real-ip";

/// Extract the bearer credential from the Authorization header.
///
/// No header, or a scheme other than `Bearer`, is an anonymous caller
/// (`Ok(None)`). A `Bearer` header with nothing after it is malformed.
pub fn bearer_token(headers: &HeaderMap) -> Result<Option<String>, AppError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let value = value
        .to_str()
        .map_err(|_| AppError::BadRequest("Malformed authorization header".to_string()))?;

    // Trailing whitespace may already be stripped by the HTTP parser, so a
    // bare "Bearer" is the same malformed credential as "Bearer ".
    let (scheme, token) = value.split_once(' ').unwrap_or((value, ""));
    if scheme != "Bearer" {
        return Ok(None);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AppError::BadRequest("Empty bearer token".to_string()));
    }

    Ok(Some(token.to_string()))
}

/// Stable client identifier for the visitor window: first forwarded
/// address, then the real-ip header, then a fixed placeholder.
pub fn client_key(headers: &HeaderMap) -> String {
    let forwarded = headers
        .get(X_FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    let real_ip = || {
        headers
            .get(X_REAL_IP)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    forwarded
        .or_else(real_ip)
        .unwrap_or(LOCAL_CLIENT_KEY)
        .to_string()
}
