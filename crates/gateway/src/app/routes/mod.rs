use axum::{Router, routing::get};

pub mod session;
pub mod system;

/// Router for everything behind the route gate.
///
/// Dashboard pages are rendered elsewhere; requests the gate lets through
/// that no handler here serves fall back to a 404.
pub fn router() -> Router {
    Router::new()
        .route("/api/whoami", get(system::whoami))
        .route("/api/auth/policy", get(session::policy))
        .fallback(system::not_found)
}
