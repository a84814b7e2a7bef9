//! Authentication module for the calorie tracker
//!
//! This module provides authentication functionality including:
//! - Password hashing and verification (bcrypt)
//! - Stateless JWT session tokens
//! - User registration and login
//! - Bearer token extraction for protected routes
//! - REST API endpoints for auth operations

pub mod api;
pub mod extract;
pub mod jwt;
pub mod password;
pub mod service;

pub use api::{ApiError, AuthApiState, auth_api_router};
pub use extract::{AuthUser, extract_bearer_token};
pub use jwt::{Claims, JwtConfig, JwtError, JwtService};
pub use service::{AuthError, AuthResponse, AuthService, LoginRequest, RegisterRequest};
