use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;

use mkdi_auth::{AccessDecision, CallerIdentity, DenialKind, RoutePolicy, TokenVerifier};

use crate::app::errors::json_error;

#[derive(Clone)]
pub struct GateState {
    pub policy: Arc<RoutePolicy>,
    pub verifier: Arc<dyn TokenVerifier>,
    pub cookie_name: Arc<str>,
    pub login_path: Arc<str>,
}

/// Runs the route gate in front of every protected handler.
///
/// A token that fails verification is treated exactly like no token: the
/// gate only ever sees a verified identity or nothing.
pub async fn gate_middleware(
    State(state): State<GateState>,
    mut req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path().to_string();

    let caller = extract_token(req.headers(), &state.cookie_name)
        .map(str::to_owned)
        .and_then(|token| verify(state.verifier.as_ref(), &token));

    match state.policy.evaluate(&path, caller.as_ref()) {
        AccessDecision::Allow => {
            tracing::debug!(path = %path, "gate allowed request");
            if let Some(caller) = caller {
                req.extensions_mut().insert(caller);
            }
            next.run(req).await
        }
        AccessDecision::Deny(kind) => {
            tracing::info!(
                path = %path,
                reason = ?kind,
                principal = ?caller.as_ref().map(|c| c.principal_id().to_string()),
                "gate denied request"
            );
            let target = match req.uri().query() {
                Some(q) => format!("{path}?{q}"),
                None => path.clone(),
            };
            deny_response(&state, &path, &target, kind)
        }
    }
}

fn verify(verifier: &dyn TokenVerifier, token: &str) -> Option<CallerIdentity> {
    match verifier.verify(token, Utc::now()) {
        Ok(claims) => Some(claims.into_identity()),
        Err(e) => {
            tracing::debug!(error = %e, "discarding unverifiable token");
            None
        }
    }
}

fn deny_response(state: &GateState, path: &str, target: &str, kind: DenialKind) -> Response {
    match kind {
        DenialKind::Unauthenticated if is_api_path(path) => {
            json_error(StatusCode::UNAUTHORIZED, "unauthenticated", "sign in required")
        }
        DenialKind::Unauthenticated => {
            let location = format!(
                "{}?callbackUrl={}",
                state.login_path,
                urlencoding::encode(target)
            );
            Redirect::to(&location).into_response()
        }
        DenialKind::NoMatchingRoute | DenialKind::MissingRole => {
            json_error(StatusCode::FORBIDDEN, "forbidden", "access to this resource is not permitted")
        }
    }
}

fn is_api_path(path: &str) -> bool {
    path == "/api" || path.starts_with("/api/")
}

/// Bearer header first, then the session cookie.
fn extract_token<'a>(headers: &'a HeaderMap, cookie_name: &str) -> Option<&'a str> {
    bearer_token(headers).or_else(|| session_cookie(headers, cookie_name))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

fn session_cookie<'a>(headers: &'a HeaderMap, cookie_name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}
