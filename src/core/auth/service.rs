//! Authentication service
//!
//! Provides business logic for user registration, login and bearer-token
//! authentication. Coordinates between the user store and the JWT service.

use uuid::Uuid;

use crate::core::auth::jwt::{JwtError, JwtService};
use crate::core::auth::password::{self, PasswordError};
use crate::core::db::models::{NewUser, Profile, User, UserResponse};
use crate::core::db::store::{UserStore, UserStoreError};

/// Authentication service error types
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("User already exists")]
    DuplicateIdentity,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Username and password are required")]
    InvalidInput,

    #[error("Password must be at most 72 bytes")]
    PasswordTooLong,

    #[error("No token provided")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("User not found")]
    UserNotFound,

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<UserStoreError> for AuthError {
    fn from(err: UserStoreError) -> Self {
        match err {
            UserStoreError::UsernameAlreadyExists => AuthError::DuplicateIdentity,
            UserStoreError::DatabaseError(e) => AuthError::InternalError(e.to_string()),
        }
    }
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired | JwtError::InvalidToken => AuthError::InvalidToken,
            _ => AuthError::InternalError(err.to_string()),
        }
    }
}

impl From<PasswordError> for AuthError {
    fn from(err: PasswordError) -> Self {
        AuthError::InternalError(err.to_string())
    }
}

/// Registration request data
///
/// Missing credentials deserialize as empty strings and are rejected by the
/// service with [`AuthError::InvalidInput`].
#[derive(Clone, serde::Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(flatten)]
    pub profile: Profile,
}

/// Login request data
#[derive(Clone, serde::Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Authenticated user and the session token issued for them
#[derive(Debug, Clone)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: String,
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService<S> {
    store: S,
    jwt_service: JwtService,
    bcrypt_cost: u32,
    /// Hash checked against when the username is unknown, so a miss costs
    /// the same as a wrong password
    dummy_hash: String,
}

impl<S: UserStore> AuthService<S> {
    /// Create a new authentication service
    pub async fn new(
        store: S,
        jwt_service: JwtService,
        bcrypt_cost: u32,
    ) -> Result<Self, AuthError> {
        let dummy_hash = password::hash_password("calorie-tracker-dummy", bcrypt_cost).await?;

        Ok(Self {
            store,
            jwt_service,
            bcrypt_cost,
            dummy_hash,
        })
    }

    /// Register a new user and issue their first token
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse, AuthError> {
        let user = self
            .create_user(&request.username, &request.password, request.profile)
            .await?;

        let token = self.jwt_service.issue(user.id)?;

        Ok(AuthResponse {
            user: user.into(),
            token,
        })
    }

    /// Login an existing user
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AuthError> {
        let user = self
            .verify_credentials(&request.username, &request.password)
            .await?;

        let token = self.jwt_service.issue(user.id)?;

        Ok(AuthResponse {
            user: user.into(),
            token,
        })
    }

    /// Create a user with a plain text password (hashed here, exactly once).
    ///
    /// The username is stored as given; one made only of whitespace counts
    /// as missing.
    pub async fn create_user(
        &self,
        username: &str,
        password: &str,
        profile: Profile,
    ) -> Result<User, AuthError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(AuthError::InvalidInput);
        }

        if password.len() > password::MAX_PASSWORD_BYTES {
            return Err(AuthError::PasswordTooLong);
        }

        if self.store.find_by_username(username).await?.is_some() {
            return Err(AuthError::DuplicateIdentity);
        }

        let password_hash = password::hash_password(password, self.bcrypt_cost).await?;

        // The store re-checks uniqueness atomically on insert
        let user = self
            .store
            .insert(NewUser {
                username: username.to_string(),
                password_hash,
                profile,
            })
            .await?;

        Ok(user)
    }

    /// Check a username/password pair.
    ///
    /// An unknown username and a wrong password fail the same way.
    pub async fn verify_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        let Some(user) = self.store.find_by_username(username).await? else {
            password::verify_password(password, &self.dummy_hash).await?;
            return Err(AuthError::InvalidCredentials);
        };

        if password::verify_password(password, &user.password_hash).await? {
            Ok(user)
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }

    /// Validate a bearer token and return the user ID it was issued for.
    ///
    /// An empty token counts as no token at all.
    pub fn authenticate_token(&self, token: &str) -> Result<Uuid, AuthError> {
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }

        self.jwt_service.verify(token).map_err(|e| {
            tracing::debug!("Token rejected: {}", e);
            AuthError::from(e)
        })
    }

    /// Get a user's public profile
    pub async fn get_user(&self, user_id: Uuid) -> Result<UserResponse, AuthError> {
        let user = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        Ok(user.into())
    }

    /// The JWT service used to sign tokens
    pub fn jwt_service(&self) -> &JwtService {
        &self.jwt_service
    }
}
