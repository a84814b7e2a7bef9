//! Bearer token extraction for protected routes
//!
//! Handlers that take an [`AuthUser`] argument only run for requests carrying
//! a valid `Authorization: Bearer <token>` header. Everything else is
//! rejected with 403 before the handler is called.

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};
use uuid::Uuid;

use crate::core::auth::api::{ApiError, AuthApiState};
use crate::core::auth::service::AuthError;
use crate::core::db::store::UserStore;

/// Identity proven by a valid bearer token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: Uuid,
}

impl<S: UserStore> FromRequestParts<Arc<AuthApiState<S>>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AuthApiState<S>>,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers)?;
        let user_id = state.auth_service.authenticate_token(token)?;

        Ok(AuthUser { user_id })
    }
}

/// Extract the token from the Authorization header.
///
/// The `Bearer ` prefix is stripped when present; any other value is taken
/// as the token itself and left for signature verification to reject.
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::InvalidToken)?;

    let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();

    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }

    Ok(token)
}
