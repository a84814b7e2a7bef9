//! CORS bypass proxy
//!
//! `/proxy/*` is forwarded to a fixed upstream with the `/proxy` prefix
//! removed, so browser clients can reach third-party APIs through this
//! server. Method, query, body and end-to-end headers pass through
//! untouched; the upstream response is streamed back as-is.

use axum::{
    Json, Router,
    body::{Body, to_bytes},
    extract::{Request, State},
    http::{HeaderMap, HeaderName, StatusCode, header},
    response::{IntoResponse, Response},
    routing::any,
};
use std::sync::Arc;

use crate::core::auth::api::MessageResponse;

/// Default upstream, matching the public cors-anywhere service
const DEFAULT_PROXY_TARGET: &str = "https://cors-anywhere.herokuapp.com/";

/// Largest request body buffered for forwarding
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Route prefix stripped before forwarding
const PROXY_PREFIX: &str = "/proxy";

/// Proxy configuration
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Upstream base URL
    pub target: String,
}

impl ProxyConfig {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::new(
            std::env::var("PROXY_TARGET").unwrap_or_else(|_| DEFAULT_PROXY_TARGET.to_string()),
        )
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PROXY_TARGET)
    }
}

/// Proxy errors
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("Request body too large")]
    BodyTooLarge,

    #[error("Proxy request failed")]
    Upstream(#[from] reqwest::Error),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = match &self {
            ProxyError::BodyTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ProxyError::Upstream(e) => {
                tracing::warn!("Proxy upstream error: {}", e);
                StatusCode::BAD_GATEWAY
            }
        };

        let body = MessageResponse {
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

struct ProxyState {
    config: ProxyConfig,
    client: reqwest::Client,
}

/// Create the proxy router
pub fn proxy_router(config: ProxyConfig) -> Router {
    let state = Arc::new(ProxyState {
        config,
        client: reqwest::Client::new(),
    });

    Router::new()
        .route(PROXY_PREFIX, any(proxy_handler))
        .route("/proxy/{*path}", any(proxy_handler))
        .with_state(state)
}

/// ANY /proxy/{*path}
/// Forward the request to the configured upstream
async fn proxy_handler(
    State(state): State<Arc<ProxyState>>,
    request: Request,
) -> Result<Response, ProxyError> {
    let (parts, body) = request.into_parts();

    let url = upstream_url(&state.config.target, parts.uri.path(), parts.uri.query());
    tracing::debug!("Proxying {} {}", parts.method, url);

    let body = to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|_| ProxyError::BodyTooLarge)?;

    let upstream = state
        .client
        .request(parts.method, &url)
        .headers(forwardable_headers(&parts.headers, true))
        .body(body)
        .send()
        .await?;

    let status = upstream.status();
    let headers = forwardable_headers(upstream.headers(), false);

    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = headers;

    Ok(response)
}

/// Build the upstream URL: target + path without the proxy prefix + query
fn upstream_url(target: &str, path: &str, query: Option<&str>) -> String {
    let rest = path.strip_prefix(PROXY_PREFIX).unwrap_or(path);
    let rest = rest.trim_start_matches('/');

    let mut url = format!("{}/{}", target.trim_end_matches('/'), rest);
    if let Some(query) = query {
        url.push('?');
        url.push_str(query);
    }
    url
}

/// Headers that describe a single connection and must not be forwarded
fn is_hop_by_hop(name: &HeaderName) -> bool {
    matches!(
        name.as_str(),
        "connection"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "te"
            | "trailer"
            | "transfer-encoding"
            | "upgrade"
    )
}

/// Copy end-to-end headers. On the request side `Host` is dropped so the
/// client sets it from the upstream URL, and `Content-Length` is dropped
/// because the body is re-sent from a buffer.
fn forwardable_headers(headers: &HeaderMap, request: bool) -> HeaderMap {
    let mut forwarded = HeaderMap::with_capacity(headers.len());

    for (name, value) in headers {
        if is_hop_by_hop(name) {
            continue;
        }
        if request && (name == header::HOST || name == header::CONTENT_LENGTH) {
            continue;
        }
        forwarded.append(name.clone(), value.clone());
    }

    forwarded
}
