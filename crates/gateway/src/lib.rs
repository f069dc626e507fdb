//! HTTP gateway: token verification, route gate, session endpoints.

pub mod app;
pub mod config;
pub mod middleware;
pub mod oidc;
pub mod verifier;
