use crate::domain::models::RegisterRequest;
use crate::error::ClientError;
use crate::services::session::{Identity, MemoryTokenStore, SessionResolver};
use crate::state::SharedState;
use crate::web::session::{self, Viewer};
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(flatten)]
    pub identity: Identity,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
        .route("/logout", post(logout))
        .route("/me", get(me))
        .with_state(state)
}

fn fresh_session(state: &SharedState) -> SessionResolver<MemoryTokenStore> {
    SessionResolver::new(state.api.clone(), MemoryTokenStore::default())
}

fn signed_in(
    state: &SharedState,
    session: &SessionResolver<MemoryTokenStore>,
    identity: Identity,
) -> Result<impl IntoResponse, ClientError> {
    let token = session
        .token()
        .ok_or_else(|| ClientError::Auth("no session token issued".to_string()))?
        .to_string();
    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, session::session_cookie(&state.config, &token)?);
    Ok((headers, Json(LoginResponse { token, identity })))
}

async fn login(
    State(state): State<SharedState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ClientError> {
    let mut session = fresh_session(&state);
    let identity = session.login(&payload.email, &payload.password).await?;
    signed_in(&state, &session, identity)
}

async fn register(
    State(state): State<SharedState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ClientError> {
    let mut session = fresh_session(&state);
    let identity = session.register(&payload).await?;
    tracing::info!("User {} registered", identity.user.id);
    signed_in(&state, &session, identity)
}

async fn logout(
    State(state): State<SharedState>,
    Viewer(mut session): Viewer,
) -> impl IntoResponse {
    if let Some(identity) = session.identity() {
        tracing::info!("User {} logged out", identity.user.id);
    }
    session.logout();
    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, session::cleared_cookie(&state.config));
    (StatusCode::NO_CONTENT, headers)
}

async fn me(Viewer(session): Viewer) -> impl IntoResponse {
    Json(session.state().clone())
}
