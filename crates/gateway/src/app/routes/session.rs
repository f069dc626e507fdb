//! Sign-in redirect, session refresh and policy audit endpoints.

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::Query,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde::Deserialize;

use mkdi_auth::{RoutePolicyConfig, SessionState, SessionToken};

use crate::app::{AppState, errors};
use crate::oidc::RefreshError;

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    #[serde(rename = "callbackUrl")]
    pub callback_url: Option<String>,
}

/// GET <login path> - send the browser to the identity provider.
///
/// The page the user was headed to travels in `state` so the sign-in
/// callback can return there. Only same-site paths are accepted.
pub async fn login(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<LoginQuery>,
) -> Response {
    let Some(oidc) = &state.oidc else {
        return errors::json_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "login_unavailable",
            "no identity provider configured",
        );
    };
    let Some(authorization_url) = oidc.authorization_url() else {
        return errors::json_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "login_unavailable",
            "identity provider has no authorization endpoint configured",
        );
    };

    let callback = query
        .callback_url
        .filter(|url| is_local_path(url))
        .unwrap_or_else(|| "/".to_string());

    let separator = if authorization_url.contains('?') { '&' } else { '?' };
    let location = format!(
        "{authorization_url}{separator}client_id={}&response_type=code&scope=openid&state={}",
        urlencoding::encode(oidc.client_id()),
        urlencoding::encode(&callback),
    );

    Redirect::to(&location).into_response()
}

/// POST /auth/refresh - renew an expired session with its refresh token.
pub async fn refresh(
    Extension(state): Extension<Arc<AppState>>,
    Json(session): Json<SessionToken>,
) -> Response {
    let now = Utc::now();

    match session.state(now) {
        SessionState::Fresh => (StatusCode::OK, Json(session)).into_response(),
        SessionState::Unrecoverable => errors::json_error(
            StatusCode::UNAUTHORIZED,
            "session_expired",
            "session expired; sign in again",
        ),
        SessionState::NeedsRefresh => {
            let Some(oidc) = &state.oidc else {
                return errors::json_error(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "refresh_unavailable",
                    "no identity provider configured",
                );
            };
            let Some(refresh_token) = session.refresh_token.clone() else {
                return errors::json_error(
                    StatusCode::UNAUTHORIZED,
                    "session_expired",
                    "session expired; sign in again",
                );
            };

            let refreshed = oidc.refresh(&refresh_token).await.and_then(|response| {
                session
                    .refreshed(response, Utc::now())
                    .map_err(RefreshError::from)
            });

            match refreshed {
                Ok(session) => {
                    tracing::debug!("session refreshed");
                    (StatusCode::OK, Json(session)).into_response()
                }
                Err(e) => {
                    tracing::warn!(error = %e, "session refresh failed");
                    errors::json_error(
                        StatusCode::UNAUTHORIZED,
                        "refresh_failed",
                        "session could not be refreshed; sign in again",
                    )
                }
            }
        }
    }
}

/// GET /api/auth/policy - the active route table, in declaration order.
pub async fn policy(Extension(state): Extension<Arc<AppState>>) -> Json<RoutePolicyConfig> {
    Json(state.policy.to_config())
}

fn is_local_path(url: &str) -> bool {
    url.starts_with('/') && !url.starts_with("//") && !url.contains('\\')
}
