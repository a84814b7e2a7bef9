//! Core services: configuration, persistence, authentication and the proxy

pub mod auth;
pub mod config;
pub mod db;
pub mod proxy;
