pub mod admin;
pub mod auth;
pub mod menu;
pub mod pages;
pub mod questionnaire;
pub mod session;

use crate::error::ClientError;
use crate::state::SharedState;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;

async fn health() -> &'static str {
    "OK"
}

pub fn routes(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/auth", auth::router(state.clone()))
        .merge(menu::router(state.clone()))
        .merge(pages::router(state.clone()))
        .merge(questionnaire::router(state.clone()))
        .nest("/admin", admin::router(state))
}

pub(crate) fn status_of(error: &ClientError) -> StatusCode {
    match error {
        ClientError::Auth(_) => StatusCode::UNAUTHORIZED,
        ClientError::Validation { .. } => StatusCode::BAD_REQUEST,
        ClientError::NotFound(_) | ClientError::Server { status: 404, .. } => StatusCode::NOT_FOUND,
        ClientError::Server { .. } | ClientError::Decode(_) => StatusCode::BAD_GATEWAY,
        ClientError::Network(_) => StatusCode::SERVICE_UNAVAILABLE,
        ClientError::PartialSave { .. } => StatusCode::CONFLICT,
    }
}

impl IntoResponse for ClientError {
    fn into_response(self) -> Response {
        let status = status_of(&self);
        if status.is_server_error() {
            tracing::error!("Upstream call failed: {}", self);
        }
        let body = match &self {
            ClientError::Validation { field, message } => json!({
                "error": message,
                "field": field,
            }),
            ClientError::PartialSave {
                completed,
                failed,
                source,
            } => json!({
                "error": source.to_string(),
                "completed": completed,
                "failed": failed,
            }),
            other => json!({ "error": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}
