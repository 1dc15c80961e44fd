//! Catalog session tokens (HS256).
//!
//! Login hands the same token out twice: in the response body and as the
//! `token` cookie. Its lifetime matches the cookie's `Max-Age`.

use anyhow::{Context, Result};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Who a session belongs to and when it lapses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Catalog username
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    fn for_user(username: &str, lifetime_secs: u64) -> Self {
        let iat = chrono::Utc::now().timestamp();
        let lifetime = i64::try_from(lifetime_secs).unwrap_or(i64::MAX);
        Self {
            sub: username.to_string(),
            iat,
            exp: iat.saturating_add(lifetime),
        }
    }
}

fn session_validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation
}

/// Sign a session token for `username` valid for `lifetime_secs`.
pub fn encode_jwt(username: &str, secret: &str, lifetime_secs: u64) -> Result<String> {
    let claims = Claims::for_user(username, lifetime_secs);
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .with_context(|| format!("Could not sign session for {}", username))
}

/// Check a session token's signature and expiry.
pub fn decode_jwt(token: &str, secret: &str) -> Result<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &session_validation(),
    )
    .map(|data| data.claims)
    .context("Session token rejected")
}
