//! HTTP application wiring (Axum router + shared state).
//!
//! - `routes/`: handlers, one file per area
//! - `errors.rs`: consistent JSON error responses

use std::sync::Arc;

use axum::{
    Extension, Router,
    routing::{get, post},
};
use tower::ServiceBuilder;

use mkdi_auth::{RoutePolicy, TokenVerifier};

use crate::config::{ConfigError, GatewayConfig};
use crate::middleware::{self, GateState};
use crate::oidc::OidcClient;
use crate::verifier::Hs256Verifier;

pub mod errors;
pub mod routes;

/// State shared by handlers.
#[derive(Debug)]
pub struct AppState {
    pub policy: Arc<RoutePolicy>,
    pub oidc: Option<OidcClient>,
}

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(config: &GatewayConfig) -> Result<Router, ConfigError> {
    let policy = Arc::new(config.route_policy()?);
    let verifier: Arc<dyn TokenVerifier> =
        Arc::new(Hs256Verifier::new(config.jwt_secret.as_bytes()));

    Ok(build_app_with(config, policy, verifier))
}

/// Same as [`build_app`] with an already-compiled policy and verifier.
pub fn build_app_with(
    config: &GatewayConfig,
    policy: Arc<RoutePolicy>,
    verifier: Arc<dyn TokenVerifier>,
) -> Router {
    let state = Arc::new(AppState {
        policy: policy.clone(),
        oidc: config.oidc.clone().map(OidcClient::new),
    });

    let gate_state = GateState {
        policy,
        verifier,
        cookie_name: Arc::from(config.cookie_name.as_str()),
        login_path: Arc::from(config.login_path.as_str()),
    };

    // Everything in here goes through the route gate, including the fallback.
    let protected = routes::router().layer(axum::middleware::from_fn_with_state(
        gate_state,
        middleware::gate_middleware,
    ));

    // Sign-in, refresh and health must stay reachable without a session.
    Router::new()
        .route("/health", get(routes::system::health))
        .route(&config.login_path, get(routes::session::login))
        .route("/auth/refresh", post(routes::session::refresh))
        .merge(protected)
        .layer(ServiceBuilder::new().layer(Extension(state)))
}
