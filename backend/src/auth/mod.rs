//! Admin token verification.
//!
//! Write endpoints carry `Authorization: Bearer <token>`. The token is handed
//! to a [`TokenVerifier`], which either resolves it to an [`AdminIdentity`] or
//! rejects it. Verifiers never touch the record store.

pub mod identity_toolkit;
pub mod static_tokens;

use async_trait::async_trait;
use serde::Serialize;

pub use identity_toolkit::{IdentityToolkitConfig, IdentityToolkitVerifier};
pub use static_tokens::{StaticTokenVerifier, TokenSpecError};

/// A verified administrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminIdentity {
    pub uid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("missing Authorization header")]
    Missing,
    #[error("malformed Authorization header")]
    Malformed,
    #[error("token rejected: {0}")]
    Rejected(String),
    #[error("auth service unavailable: {0}")]
    Unavailable(String),
}

impl AuthError {
    /// Whether the request never presented a usable credential.
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, AuthError::Missing | AuthError::Malformed)
    }
}

#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<AdminIdentity, AuthError>;
}

/// Extract the token from an `Authorization` header value.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let value = header.ok_or(AuthError::Missing)?;
    let (scheme, token) = value.trim().split_once(' ').ok_or(AuthError::Malformed)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::Malformed);
    }
    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::Malformed);
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(Some("Bearer abc")), Ok("abc"));
        assert_eq!(bearer_token(Some("bearer   abc ")), Ok("abc"));
        assert_eq!(bearer_token(None), Err(AuthError::Missing));
        assert_eq!(bearer_token(Some("Basic abc")), Err(AuthError::Malformed));
        assert_eq!(bearer_token(Some("Bearer")), Err(AuthError::Malformed));
        assert_eq!(bearer_token(Some("Bearer   ")), Err(AuthError::Malformed));
    }

    #[test]
    fn test_status_classification() {
        assert!(AuthError::Missing.is_unauthenticated());
        assert!(!AuthError::Rejected("expired".into()).is_unauthenticated());
        assert!(!AuthError::Unavailable("timeout".into()).is_unauthenticated());
    }
}
