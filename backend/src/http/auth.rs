//! Admin extractor for write endpoints.

use axum::{extract::FromRequestParts, http::header::AUTHORIZATION, http::request::Parts};

use super::error::AppError;
use super::state::AppState;
use crate::auth::{bearer_token, AdminIdentity, AuthError};

/// A request that carried a verified admin token. Handlers that take this
/// argument never run for unauthenticated requests.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AdminIdentity);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = match parts.headers.get(AUTHORIZATION) {
            None => None,
            Some(value) => Some(value.to_str().map_err(|_| AuthError::Malformed)?),
        };
        let token = bearer_token(header)?;
        let identity = state.verifier.verify(token).await?;
        Ok(AdminUser(identity))
    }
}
