use crate::config::{Config, TOKEN_COOKIE};
use crate::error::ClientError;
use crate::services::session::{Identity, MemoryTokenStore, SessionResolver};
use crate::state::SharedState;
use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, HeaderMap, HeaderValue, StatusCode},
};
use std::convert::Infallible;

pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth) = headers.get(header::AUTHORIZATION) {
        if let Ok(val) = auth.to_str() {
            if let Some(bearer) = val.strip_prefix("Bearer ") {
                let bearer = bearer.trim();
                if !bearer.is_empty() {
                    return Some(bearer.to_string());
                }
            }
        }
    }
    let prefix = format!("{TOKEN_COOKIE}=");
    if let Some(cookie) = headers.get(header::COOKIE) {
        if let Ok(val) = cookie.to_str() {
            for pair in val.split(';') {
                let trimmed = pair.trim();
                if let Some(rest) = trimmed.strip_prefix(prefix.as_str()) {
                    if !rest.is_empty() {
                        return Some(rest.to_string());
                    }
                }
            }
        }
    }
    None
}

pub fn session_cookie(config: &Config, token: &str) -> Result<HeaderValue, ClientError> {
    let secure_flag = if config.secure_cookies { "; Secure" } else { "" };
    HeaderValue::from_str(&format!(
        "{TOKEN_COOKIE}={token}; HttpOnly; SameSite=Lax; Path=/{secure_flag}"
    ))
    .map_err(|_| ClientError::Decode("token is not a valid cookie value".to_string()))
}

pub fn cleared_cookie(config: &Config) -> HeaderValue {
    let secure_flag = if config.secure_cookies { "; Secure" } else { "" };
    HeaderValue::from_str(&format!(
        "{TOKEN_COOKIE}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0{secure_flag}"
    ))
    .unwrap_or_else(|_| HeaderValue::from_static("token=; Path=/; Max-Age=0"))
}

async fn resolve(state: &SharedState, headers: &HeaderMap) -> SessionResolver<MemoryTokenStore> {
    let store = match extract_token(headers) {
        Some(token) => MemoryTokenStore::with_token(token),
        None => MemoryTokenStore::default(),
    };
    let mut session = SessionResolver::new(state.api.clone(), store);
    session.init().await;
    session
}

/// Resolved session of whoever sent the request, anonymous included.
pub struct Viewer(pub SessionResolver<MemoryTokenStore>);

#[async_trait]
impl<S> FromRequestParts<S> for Viewer
where
    S: Send + Sync,
    SharedState: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let shared_state = SharedState::from_ref(state);
        Ok(Viewer(resolve(&shared_state, &parts.headers).await))
    }
}

/// Authenticated caller; anything else is rejected with 401.
pub struct Member {
    pub token: String,
    pub identity: Identity,
}

#[async_trait]
impl<S> FromRequestParts<S> for Member
where
    S: Send + Sync,
    SharedState: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let shared_state = SharedState::from_ref(state);
        let session = resolve(&shared_state, &parts.headers).await;
        match (session.token(), session.identity()) {
            (Some(token), Some(identity)) => Ok(Member {
                token: token.to_string(),
                identity: identity.clone(),
            }),
            _ => {
                tracing::debug!("Rejected unauthenticated request to {}", parts.uri.path());
                Err(StatusCode::UNAUTHORIZED)
            }
        }
    }
}
