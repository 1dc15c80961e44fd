//! Session cookie helpers.
//!
//! Cookie format: `token=<jwt>; HttpOnly; SameSite=Lax; Path=/; Max-Age=<secs>; [Secure]`
//! - `HttpOnly`: not readable from JavaScript
//! - `SameSite=Lax`: not sent on cross-site POST
//! - `Path=/`: sent to the API and to the `/ws/*` upgrade alike

use axum::http::HeaderValue;

/// Cookie name carrying the JWT.
pub const TOKEN_COOKIE_NAME: &str = "token";

/// Build the `Set-Cookie` header value for a freshly issued token.
///
/// Returns `None` only if the token contains bytes not allowed in a header,
/// which a JWT never does.
pub fn build_token_cookie(token: &str, max_age_secs: u64, is_secure: bool) -> Option<HeaderValue> {
    let secure_flag = if is_secure { "; Secure" } else { "" };
    let cookie = format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}{}",
        TOKEN_COOKIE_NAME, token, max_age_secs, secure_flag
    );
    HeaderValue::from_str(&cookie).ok()
}

/// Build a `Set-Cookie` header that deletes the token cookie.
pub fn build_clear_cookie(is_secure: bool) -> HeaderValue {
    let secure_flag = if is_secure { "; Secure" } else { "" };
    let cookie = format!(
        "{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0{}",
        TOKEN_COOKIE_NAME, secure_flag
    );
    HeaderValue::from_str(&cookie).unwrap_or_else(|_| HeaderValue::from_static("token=; Max-Age=0"))
}

/// Extract the token from a `Cookie` header value.
pub fn extract_token_from_cookie(cookie_header: &str) -> Option<String> {
    let prefix = format!("{}=", TOKEN_COOKIE_NAME);
    cookie_header
        .split(';')
        .filter_map(|part| part.trim().strip_prefix(&prefix))
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_token_cookie() {
        let cookie = build_token_cookie("abc.def.ghi", 86400, false).unwrap();
        let s = cookie.to_str().unwrap();
        assert!(s.starts_with("token=abc.def.ghi;"));
        assert!(s.contains("HttpOnly"));
        assert!(s.contains("Max-Age=86400"));
        assert!(!s.contains("Secure"));
    }

    #[test]
    fn test_build_token_cookie_secure() {
        let cookie = build_token_cookie("abc", 60, true).unwrap();
        assert!(cookie.to_str().unwrap().ends_with("; Secure"));
    }

    #[test]
    fn test_build_clear_cookie() {
        let cookie = build_clear_cookie(false);
        assert!(cookie.to_str().unwrap().contains("Max-Age=0"));
    }

    #[test]
    fn test_extract_token_from_cookie() {
        assert_eq!(
            extract_token_from_cookie("session=x; token=abc.def; theme=dark"),
            Some("abc.def".to_string())
        );
        assert_eq!(extract_token_from_cookie("token=only"), Some("only".into()));
        assert_eq!(extract_token_from_cookie("session=x"), None);
        assert_eq!(extract_token_from_cookie("token="), None);
        // A cookie merely ending in "token" is not ours
        assert_eq!(extract_token_from_cookie("csrftoken=zzz"), None);
    }
}
