use crate::error::ClientError;
use crate::services::menu;
use crate::state::SharedState;
use crate::web::session::Viewer;
use axum::{response::IntoResponse, routing::get, Json, Router};

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/menu", get(navigation))
        .route("/menu/items", get(items))
        .with_state(state)
}

async fn navigation(Viewer(session): Viewer) -> Result<impl IntoResponse, ClientError> {
    Ok(Json(menu::navigation(&session).await?))
}

async fn items(Viewer(session): Viewer) -> Result<impl IntoResponse, ClientError> {
    Ok(Json(menu::assemble(&session).await?))
}
