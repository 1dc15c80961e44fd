//! Auth middleware for Axum routes.
//!
//! Validates the JWT (Bearer header or `token` cookie) and injects Claims into
//! request extensions. Implements deny-by-default: if `auth_config` is None,
//! all requests are rejected.

use crate::api::handlers::{AppError, CatalogState};
use crate::auth::cookie::extract_token_from_cookie;
use crate::auth::jwt::decode_jwt;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

/// Pull the raw token out of the request, header first, cookie second.
fn extract_token(headers: &HeaderMap) -> Result<Option<String>, AppError> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        let value = auth_header
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid Authorization header".to_string()))?;
        let token = value.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Unauthorized("Invalid Authorization header format".to_string())
        })?;
        return Ok(Some(token.trim().to_string()));
    }

    Ok(headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(extract_token_from_cookie))
}

/// Middleware that requires a valid JWT.
///
/// # Behavior
/// 1. If `auth_config` is `None` → 403 Forbidden (deny-by-default)
/// 2. Extract `Authorization: Bearer <token>` or the `token` cookie → 401 if missing
/// 3. Validate JWT with the configured secret → 401 if invalid/expired
/// 4. Inject `Claims` into request extensions for downstream handlers
pub async fn require_auth(
    State(state): State<CatalogState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_config = state.auth_config.as_ref().ok_or_else(|| {
        AppError::Forbidden("Authentication not configured — access denied".to_string())
    })?;

    let token = extract_token(req.headers())?
        .ok_or_else(|| AppError::Unauthorized("Unauthorized".to_string()))?;

    let claims = decode_jwt(&token, &auth_config.jwt_secret)
        .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

// ============================================================================
// Tests
// ============================================================================
