use crate::error::ClientError;
use crate::services::pages;
use crate::state::SharedState;
use crate::web::session::Member;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/pages/:slug", get(public_page))
        .route("/member/pages/:slug", get(member_page))
        .with_state(state)
}

async fn public_page(
    State(state): State<SharedState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ClientError> {
    Ok(Json(pages::view_page(&state.api, None, &slug).await?))
}

async fn member_page(
    State(state): State<SharedState>,
    member: Member,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ClientError> {
    Ok(Json(pages::view_page(&state.api, Some(member.token.as_str()), &slug).await?))
}
