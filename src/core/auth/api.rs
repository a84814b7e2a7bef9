//! Auth API endpoints
//!
//! Provides REST API endpoints for authentication:
//! - POST /api/auth/register - Register a new user
//! - POST /api/auth/login - Login and get a token
//! - GET /api/auth/me - Get current user info (bearer token required)

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::core::auth::extract::AuthUser;
use crate::core::auth::service::{AuthError, AuthService, LoginRequest, RegisterRequest};
use crate::core::db::models::UserResponse;
use crate::core::db::store::UserStore;

/// Auth API state containing the auth service
#[derive(Clone)]
pub struct AuthApiState<S> {
    pub auth_service: AuthService<S>,
}

/// Body of every non-success response
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// API error: a status code and a stable client-facing message
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Convert an auth error, reporting internal failures as `failure_message`.
    ///
    /// Internal details are logged here and never sent to the client.
    pub fn from_auth(err: AuthError, failure_message: &str) -> Self {
        let status = match &err {
            AuthError::DuplicateIdentity
            | AuthError::InvalidCredentials
            | AuthError::InvalidInput
            | AuthError::PasswordTooLong => StatusCode::BAD_REQUEST,
            AuthError::MissingToken | AuthError::InvalidToken => StatusCode::FORBIDDEN,
            AuthError::UserNotFound => StatusCode::NOT_FOUND,
            AuthError::InternalError(detail) => {
                tracing::error!("{}: {}", failure_message, detail);
                return Self::new(StatusCode::INTERNAL_SERVER_ERROR, failure_message);
            }
        };

        Self::new(status, err.to_string())
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self::from_auth(err, "Internal server error")
    }
}

/// Unreadable bodies (bad JSON, wrong field types, wrong content type) are
/// client errors like any other and use the same `{ "message" }` shape.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("Rejected request body: {}", rejection.body_text());
        Self::new(StatusCode::BAD_REQUEST, rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = MessageResponse {
            message: self.message,
        };

        (self.status, Json(body)).into_response()
    }
}

/// Response for a successful registration
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub message: String,
    pub token: String,
}

/// Response for a successful login
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Create the auth API router
pub fn auth_api_router<S: UserStore>(state: AuthApiState<S>) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route("/api/auth/register", post(register_handler::<S>))
        .route("/api/auth/login", post(login_handler::<S>))
        .route("/api/auth/me", get(me_handler::<S>))
        .with_state(state)
}

/// POST /api/auth/register
/// Register a new user
async fn register_handler<S: UserStore>(
    State(state): State<Arc<AuthApiState<S>>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let Json(request) = payload?;
    tracing::info!("Registration attempt for username: {}", request.username);

    let response = state
        .auth_service
        .register(request)
        .await
        .map_err(|e| ApiError::from_auth(e, "Registration failed"))?;

    tracing::info!("User registered successfully: {}", response.user.id);

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully".to_string(),
            token: response.token,
        }),
    ))
}

/// POST /api/auth/login
/// Login and get a token
async fn login_handler<S: UserStore>(
    State(state): State<Arc<AuthApiState<S>>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(request) = payload?;
    tracing::info!("Login attempt for username: {}", request.username);

    let response = state
        .auth_service
        .login(request)
        .await
        .map_err(|e| ApiError::from_auth(e, "Login failed"))?;

    tracing::info!("User logged in successfully: {}", response.user.id);

    Ok(Json(LoginResponse {
        token: response.token,
    }))
}

/// GET /api/auth/me
/// Get current user info from the bearer token
async fn me_handler<S: UserStore>(
    State(state): State<Arc<AuthApiState<S>>>,
    user: AuthUser,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.auth_service.get_user(user.user_id).await?;

    Ok(Json(user))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AuthError::DuplicateIdentity, StatusCode::BAD_REQUEST),
            (AuthError::InvalidCredentials, StatusCode::BAD_REQUEST),
            (AuthError::InvalidInput, StatusCode::BAD_REQUEST),
            (AuthError::PasswordTooLong, StatusCode::BAD_REQUEST),
            (AuthError::MissingToken, StatusCode::FORBIDDEN),
            (AuthError::InvalidToken, StatusCode::FORBIDDEN),
            (AuthError::UserNotFound, StatusCode::NOT_FOUND),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn test_token_error_messages() {
        assert_eq!(
            ApiError::from(AuthError::MissingToken).message(),
            "No token provided"
        );
        assert_eq!(
            ApiError::from(AuthError::InvalidToken).message(),
            "Invalid token"
        );
    }

    #[test]
    fn test_internal_error_is_generic() {
        let err = AuthError::InternalError("connection refused on 10.0.0.5".to_string());

        let api_err = ApiError::from_auth(err, "Login failed");
        assert_eq!(api_err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api_err.message(), "Login failed");
    }

    #[test]
    fn test_message_response_serialization() {
        let json = serde_json::to_string(&MessageResponse {
            message: "Invalid token".to_string(),
        })
        .unwrap();

        assert_eq!(json, r#"{"message":"Invalid token"}"#);
    }

    #[test]
    fn test_register_response_serialization() {
        let response = RegisterResponse {
            message: "User registered successfully".to_string(),
            token: "abc".to_string(),
        };
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["message"], "User registered successfully");
        assert_eq!(json["token"], "abc");
    }
}
