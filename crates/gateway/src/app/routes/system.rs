use axum::{Extension, Json, http::StatusCode, response::IntoResponse};

use mkdi_auth::CallerIdentity;

use crate::app::errors;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(Extension(caller): Extension<CallerIdentity>) -> impl IntoResponse {
    Json(caller)
}

pub async fn not_found() -> axum::response::Response {
    errors::json_error(StatusCode::NOT_FOUND, "not_found", "not found")
}
