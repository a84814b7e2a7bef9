//! HTTP application assembly
//!
//! Builds the router from the auth API and the CORS proxy, wraps it in the
//! CORS and trace layers, and runs the server with the configured store.

use axum::Router;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::core::auth::{AuthApiState, AuthError, AuthService, JwtService, auth_api_router};
use crate::core::config::{Config, ConfigError};
use crate::core::db::{
    DbError, MemoryUserStore, UserRepository, UserStore, create_pool_with_migrations,
    health_check,
};
use crate::core::proxy::{ProxyConfig, proxy_router};

/// Errors that stop the server from starting
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Auth setup failed: {0}")]
    Auth(#[from] AuthError),

    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Build the application router
pub fn build_router<S: UserStore>(auth_service: AuthService<S>, proxy: ProxyConfig) -> Router {
    // Browser clients may call from any origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(auth_api_router(AuthApiState { auth_service }))
        .merge(proxy_router(proxy))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Serve the application on the configured port using `store` for users
pub async fn serve<S: UserStore>(config: &Config, store: S) -> Result<(), ServerError> {
    let jwt_service = JwtService::new(config.jwt.clone());
    let auth_service = AuthService::new(store, jwt_service, config.bcrypt_cost).await?;

    let app = build_router(auth_service, config.proxy.clone());

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Proxy target: {}", config.proxy.target);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Load configuration, pick the user store and serve
pub async fn run() -> Result<(), ServerError> {
    let config = Config::from_env()?;

    // Log config status (without revealing secrets)
    tracing::info!(
        "Config loaded: port={}, database={}, token_ttl={}m",
        config.port,
        config.has_database(),
        config.jwt.expiration_minutes
    );

    match config.database_url.as_deref() {
        Some(database_url) => {
            let pool = create_pool_with_migrations(database_url).await?;
            health_check(&pool).await?;
            tracing::info!("PostgreSQL connected");

            serve(&config, UserRepository::new(pool)).await
        }
        None => {
            tracing::warn!("DATABASE_URL not set, users are kept in memory and lost on restart");

            serve(&config, MemoryUserStore::new()).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::auth::JwtConfig;
    use crate::core::auth::api::{LoginResponse, MessageResponse, RegisterResponse};
    use axum::{
        body::{Body, to_bytes},
        http::{Request, Response, StatusCode, header},
    };
    use serde::de::DeserializeOwned;
    use tower::ServiceExt;

    const TEST_SECRET: &str = "app_test_secret_key";

    async fn create_test_app() -> Router {
        let jwt = JwtService::new(JwtConfig::new(TEST_SECRET));
        let auth_service = AuthService::new(MemoryUserStore::new(), jwt, 4)
            .await
            .unwrap();

        build_router(auth_service, ProxyConfig::default())
    }

    fn json_request(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn me_request(authorization: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/api/auth/me");
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn read_json<T: DeserializeOwned>(response: Response<Body>) -> T {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn alice_registration(password: &str) -> serde_json::Value {
        serde_json::json!({
            "username": "alice",
            "password": password,
            "sex": "female",
            "age": 31,
            "weight": 64.2,
            "height": 170,
            "activityLevel": "moderate",
            "plan": "lose"
        })
    }

    fn subject_of(token: &str) -> String {
        JwtService::new(JwtConfig::new(TEST_SECRET))
            .validate_token(token)
            .unwrap()
            .sub
    }

    #[tokio::test]
    async fn test_register_login_flow() {
        let app = create_test_app().await;

        // Register
        let response = app
            .clone()
            .oneshot(json_request(
                "/api/auth/register",
                alice_registration("pw123"),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let registered: RegisterResponse = read_json(response).await;
        assert_eq!(registered.message, "User registered successfully");
        let registered_subject = subject_of(&registered.token);

        // Login with the same credentials
        let response = app
            .clone()
            .oneshot(json_request(
                "/api/auth/login",
                serde_json::json!({ "username": "alice", "password": "pw123" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let login: LoginResponse = read_json(response).await;
        assert_eq!(subject_of(&login.token), registered_subject);

        // Wrong password
        let response = app
            .clone()
            .oneshot(json_request(
                "/api/auth/login",
                serde_json::json!({ "username": "alice", "password": "wrong" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: MessageResponse = read_json(response).await;
        assert_eq!(body.message, "Invalid username or password");

        // Register the same username again
        let response = app
            .clone()
            .oneshot(json_request(
                "/api/auth/register",
                alice_registration("another"),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: MessageResponse = read_json(response).await;
        assert_eq!(body.message, "User already exists");
    }

    #[tokio::test]
    async fn test_login_unknown_user() {
        let app = create_test_app().await;

        let response = app
            .oneshot(json_request(
                "/api/auth/login",
                serde_json::json!({ "username": "ghost", "password": "pw123" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: MessageResponse = read_json(response).await;
        assert_eq!(body.message, "Invalid username or password");
    }

    #[tokio::test]
    async fn test_register_empty_password() {
        let app = create_test_app().await;

        let response = app
            .oneshot(json_request("/api/auth/register", alice_registration("")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_register_missing_password() {
        let app = create_test_app().await;

        let response = app
            .oneshot(json_request(
                "/api/auth/register",
                serde_json::json!({ "username": "bob" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: MessageResponse = read_json(response).await;
        assert_eq!(body.message, "Username and password are required");
    }

    #[tokio::test]
    async fn test_register_blank_username() {
        let app = create_test_app().await;

        let response = app
            .oneshot(json_request(
                "/api/auth/register",
                serde_json::json!({ "username": "   ", "password": "pw" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: MessageResponse = read_json(response).await;
        assert_eq!(body.message, "Username and password are required");
    }

    #[tokio::test]
    async fn test_register_wrong_field_type() {
        let app = create_test_app().await;

        let response = app
            .oneshot(json_request(
                "/api/auth/register",
                serde_json::json!({ "username": "bob", "password": "pw", "age": 30.5 }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: MessageResponse = read_json(response).await;
        assert!(!body.message.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_json_gets_message_body() {
        let app = create_test_app().await;

        for uri in ["/api/auth/register", "/api/auth/login"] {
            let response = app
                .clone()
                .oneshot(
                    Request::builder()
                        .method("POST")
                        .uri(uri)
                        .header("Content-Type", "application/json")
                        .body(Body::from("not json"))
                        .unwrap(),
                )
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let body: MessageResponse = read_json(response).await;
            assert!(!body.message.is_empty());
        }
    }

    #[tokio::test]
    async fn test_register_without_content_type() {
        let app = create_test_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/auth/register")
                    .body(Body::from(r#"{"username":"bob","password":"pw"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: MessageResponse = read_json(response).await;
        assert!(!body.message.is_empty());
    }

    #[tokio::test]
    async fn test_me_with_valid_token() {
        let app = create_test_app().await;

        let response = app
            .clone()
            .oneshot(json_request(
                "/api/auth/register",
                alice_registration("pw123"),
            ))
            .await
            .unwrap();
        let registered: RegisterResponse = read_json(response).await;

        let response = app
            .oneshot(me_request(Some(&format!("Bearer {}", registered.token))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let me: serde_json::Value = read_json(response).await;
        assert_eq!(me["username"], "alice");
        assert_eq!(me["activityLevel"], "moderate");
        assert_eq!(me["id"], subject_of(&registered.token));
        assert!(me.get("password_hash").is_none());
        assert!(me.get("passwordHash").is_none());
    }

    #[tokio::test]
    async fn test_me_without_token() {
        let app = create_test_app().await;

        let response = app.oneshot(me_request(None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body: MessageResponse = read_json(response).await;
        assert_eq!(body.message, "No token provided");
    }

    #[tokio::test]
    async fn test_me_with_invalid_token() {
        let app = create_test_app().await;

        let response = app
            .oneshot(me_request(Some("Bearer not.a.token")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body: MessageResponse = read_json(response).await;
        assert_eq!(body.message, "Invalid token");
    }

    #[tokio::test]
    async fn test_me_with_token_from_other_key() {
        let app = create_test_app().await;
        let foreign = JwtService::new(JwtConfig::new("some_other_secret"))
            .issue(uuid::Uuid::new_v4())
            .unwrap();

        let response = app
            .oneshot(me_request(Some(&format!("Bearer {}", foreign))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_me_with_expired_token() {
        let app = create_test_app().await;
        let expired = JwtService::new(JwtConfig::new(TEST_SECRET))
            .issue_at(
                uuid::Uuid::new_v4(),
                chrono::Utc::now() - chrono::Duration::minutes(61),
            )
            .unwrap();

        let response = app
            .oneshot(me_request(Some(&format!("Bearer {}", expired))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body: MessageResponse = read_json(response).await;
        assert_eq!(body.message, "Invalid token");
    }

    #[tokio::test]
    async fn test_me_for_unknown_subject() {
        let app = create_test_app().await;
        let orphan = JwtService::new(JwtConfig::new(TEST_SECRET))
            .issue(uuid::Uuid::new_v4())
            .unwrap();

        let response = app
            .oneshot(me_request(Some(&format!("Bearer {}", orphan))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let app = create_test_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/api/auth/login")
                    .header(header::ORIGIN, "http://localhost:3000")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            "*"
        );
    }
}
