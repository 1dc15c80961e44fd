//! Login / logout handlers

use super::handlers::{AppError, CatalogState};
use crate::auth::cookie::{build_clear_cookie, build_token_cookie};
use crate::auth::jwt::encode_jwt;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap},
    Json,
};
use serde::{Deserialize, Serialize};

/// Body of `POST /api/auth/login`
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Successful login
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub username: String,
    /// Same JWT as in the cookie, for non-browser clients
    pub token: String,
}

/// POST /api/auth/login — username/password authentication.
///
/// Flow:
/// 1. Check that auth is configured
/// 2. Reject missing fields (400)
/// 3. Verify the password with bcrypt (401 on mismatch, without saying which part was wrong)
/// 4. Return the JWT in the body and as the `token` cookie
pub async fn login(
    State(state): State<CatalogState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(HeaderMap, Json<LoginResponse>), AppError> {
    let auth_config = state
        .auth_config
        .as_ref()
        .ok_or_else(|| AppError::Forbidden("Authentication not configured".to_string()))?;

    let Json(req) = payload?;
    let (username, password) = match (req.username, req.password) {
        (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => (u, p),
        _ => {
            return Err(AppError::BadRequest(
                "Username and password are required".to_string(),
            ))
        }
    };

    if !auth_config.verify_credentials(&username, &password) {
        tracing::debug!(username = %username, "Login rejected");
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    let token = encode_jwt(
        &username,
        &auth_config.jwt_secret,
        auth_config.jwt_expiry_secs,
    )
    .map_err(AppError::Internal)?;

    let mut headers = HeaderMap::new();
    if let Some(cookie) = build_token_cookie(
        &token,
        auth_config.jwt_expiry_secs,
        auth_config.secure_cookies,
    ) {
        headers.insert(header::SET_COOKIE, cookie);
    }

    tracing::info!(username = %username, "Login successful");
    Ok((
        headers,
        Json(LoginResponse {
            message: "Login successful".to_string(),
            username,
            token,
        }),
    ))
}

/// POST /api/auth/logout — clears the session cookie.
pub async fn logout(State(state): State<CatalogState>) -> (HeaderMap, Json<serde_json::Value>) {
    let secure = state
        .auth_config
        .as_ref()
        .is_some_and(|c| c.secure_cookies);

    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, build_clear_cookie(secure));

    (
        headers,
        Json(serde_json::json!({ "message": "Logged out" })),
    )
}
