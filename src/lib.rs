//! Calorie tracker backend
//!
//! User registration and login with bcrypt-hashed passwords, stateless JWT
//! bearer tokens, and a pass-through proxy for browser clients blocked by
//! CORS.

pub mod app;
pub mod core;
