//! Authentication module — JWT issued at login, checked on every mutation
//!
//! Provides:
//! - JWT token encoding/decoding (`jwt` submodule)
//! - Session cookie helpers (`cookie` submodule)
//! - `require_auth` middleware and the `AuthUser` extractor

pub mod cookie;
pub mod extractor;
pub mod jwt;
pub mod middleware;

pub use extractor::AuthUser;
pub use middleware::require_auth;
