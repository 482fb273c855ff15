use crate::domain::models::{
    AdminStats, BlockPayload, Created, Credentials, Event, EventPayload, MenuItem, NewMenuItem,
    Page, PagePayload, Questionnaire, RegisterRequest, ResponseSubmission, ToggleRequest,
    TokenResponse, User, UserResponse,
};
use crate::error::{ClientError, ClientResult};
use reqwest::{Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;

pub const DEFAULT_BASE_URL: &str = "http://localhost:4000/cesizen/api/v1";

/// Typed client for the remote CesiZen API.
///
/// Holds no session state: every authenticated call takes the bearer token
/// explicitly, so the token stays owned by the session resolver.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Builds `{base}/{collection}/{slug}` with the slug percent-encoded as a
    /// single path segment.
    fn slug_url(&self, collection: &str, slug: &str) -> ClientResult<Url> {
        if slug.is_empty() || slug == "." || slug == ".." {
            return Err(ClientError::validation("slug", "Slug is required"));
        }
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ClientError::Decode(format!("invalid API base URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| ClientError::Decode("API base URL cannot carry a path".to_string()))?
            .push(collection)
            .push(slug);
        Ok(url)
    }

    fn public(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, self.url(path))
    }

    fn authed(&self, method: Method, path: &str, token: &str) -> RequestBuilder {
        self.public(method, path).bearer_auth(token)
    }

    fn authed_at(&self, method: Method, url: Url, token: &str) -> RequestBuilder {
        self.http.request(method, url).bearer_auth(token)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> ClientResult<T> {
        let body = self.send_raw(request).await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::warn!("Failed to decode API response: {}", e);
            ClientError::Decode(e.to_string())
        })
    }

    async fn send_raw(&self, request: RequestBuilder) -> ClientResult<String> {
        let resp = request.send().await.map_err(|e| {
            tracing::warn!("API request failed: {}", e);
            ClientError::Network(e)
        })?;
        let status = resp.status();
        let url = resp.url().path().to_string();
        let body = resp.text().await?;
        if status.is_success() {
            tracing::debug!("API {} -> {}", url, status);
            return Ok(body);
        }
        tracing::warn!("API {} -> {}", url, status);
        let message = error_message(&body, status);
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Err(ClientError::Auth(message));
        }
        Err(ClientError::Server {
            status: status.as_u16(),
            message,
        })
    }

    async fn send_empty(&self, request: RequestBuilder) -> ClientResult<()> {
        self.send_raw(request).await.map(|_| ())
    }

    // ---- auth ----

    pub async fn login(&self, credentials: &Credentials) -> ClientResult<String> {
        let resp: TokenResponse = self
            .send(self.public(Method::POST, "auth/login").json(credentials))
            .await?;
        Ok(resp.token)
    }

    pub async fn register(&self, request: &RegisterRequest) -> ClientResult<String> {
        let resp: TokenResponse = self
            .send(self.public(Method::POST, "auth/register").json(request))
            .await?;
        Ok(resp.token)
    }

    pub async fn me(&self, token: &str) -> ClientResult<User> {
        self.send(self.authed(Method::GET, "auth/me", token)).await
    }

    // ---- pages & blocks ----

    pub async fn list_pages(&self, token: &str) -> ClientResult<Vec<Page>> {
        self.send(self.authed(Method::GET, "pages", token)).await
    }

    pub async fn get_page(&self, token: &str, slug: &str) -> ClientResult<Page> {
        let url = self.slug_url("pages", slug)?;
        self.send(self.authed_at(Method::GET, url, token)).await
    }

    pub async fn public_page(&self, slug: &str) -> ClientResult<Page> {
        let url = self.slug_url("public-pages", slug)?;
        self.send(self.http.get(url)).await
    }

    pub async fn create_page(&self, token: &str, payload: &PagePayload<'_>) -> ClientResult<Created> {
        self.send(self.authed(Method::POST, "pages", token).json(payload))
            .await
    }

    pub async fn update_page(
        &self,
        token: &str,
        slug: &str,
        payload: &PagePayload<'_>,
    ) -> ClientResult<()> {
        let url = self.slug_url("pages", slug)?;
        self.send_empty(self.authed_at(Method::PUT, url, token).json(payload))
            .await
    }

    pub async fn create_block(&self, token: &str, payload: &BlockPayload<'_>) -> ClientResult<Created> {
        self.send(self.authed(Method::POST, "content-blocks", token).json(payload))
            .await
    }

    pub async fn update_block(
        &self,
        token: &str,
        id: i64,
        payload: &BlockPayload<'_>,
    ) -> ClientResult<()> {
        self.send_empty(
            self.authed(Method::PUT, &format!("content-blocks/{id}"), token)
                .json(payload),
        )
        .await
    }

    pub async fn delete_block(&self, token: &str, id: i64) -> ClientResult<()> {
        self.send_empty(self.authed(Method::DELETE, &format!("content-blocks/{id}"), token))
            .await
    }

    // ---- menu ----

    pub async fn public_menu(&self) -> ClientResult<Vec<MenuItem>> {
        self.send(self.public(Method::GET, "public-menu")).await
    }

    pub async fn menu_items(&self, token: &str) -> ClientResult<Vec<MenuItem>> {
        self.send(self.authed(Method::GET, "menu-items", token)).await
    }

    pub async fn create_menu_item(&self, token: &str, item: &NewMenuItem) -> ClientResult<()> {
        self.send_empty(self.authed(Method::POST, "menu-items", token).json(item))
            .await
    }

    // ---- questionnaires & events ----

    pub async fn list_questionnaires(&self, token: &str) -> ClientResult<Vec<Questionnaire>> {
        self.send(self.authed(Method::GET, "questionnaires", token)).await
    }

    pub async fn get_questionnaire(&self, token: &str, id: i64) -> ClientResult<Questionnaire> {
        self.send(self.authed(Method::GET, &format!("questionnaires/{id}"), token))
            .await
    }

    pub async fn list_events(&self, token: &str) -> ClientResult<Vec<Event>> {
        self.send(self.authed(Method::GET, "events", token)).await
    }

    pub async fn create_event(&self, token: &str, payload: &EventPayload<'_>) -> ClientResult<Event> {
        self.send(self.authed(Method::POST, "events", token).json(payload))
            .await
    }

    pub async fn update_event(
        &self,
        token: &str,
        id: i64,
        payload: &EventPayload<'_>,
    ) -> ClientResult<()> {
        self.send_empty(
            self.authed(Method::PUT, &format!("events/{id}"), token)
                .json(payload),
        )
        .await
    }

    pub async fn delete_event(&self, token: &str, id: i64) -> ClientResult<()> {
        self.send_empty(self.authed(Method::DELETE, &format!("events/{id}"), token))
            .await
    }

    pub async fn submit_response(
        &self,
        token: &str,
        submission: &ResponseSubmission,
    ) -> ClientResult<Created> {
        self.send(
            self.authed(Method::POST, "user-responses", token)
                .json(submission),
        )
        .await
    }

    pub async fn get_response(&self, token: &str, id: i64) -> ClientResult<UserResponse> {
        self.send(self.authed(Method::GET, &format!("user-responses/{id}"), token))
            .await
    }

    // ---- users ----

    pub async fn list_users(&self, token: &str) -> ClientResult<Vec<User>> {
        self.send(self.authed(Method::GET, "users", token)).await
    }

    pub async fn toggle_user(&self, token: &str, id: i64, is_active: bool) -> ClientResult<()> {
        self.send_empty(
            self.authed(Method::PATCH, &format!("users/{id}/toggle"), token)
                .json(&ToggleRequest { is_active }),
        )
        .await
    }

    pub async fn admin_stats(&self, token: &str) -> ClientResult<AdminStats> {
        self.send(self.authed(Method::GET, "admin/stats", token)).await
    }
}

#[derive(serde::Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

/// Prefers `error`/`message` from a JSON body, then the raw text, then the
/// status reason.
fn error_message(body: &str, status: StatusCode) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(msg) = parsed.error.or(parsed.message) {
            return msg;
        }
    }
    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }
    status
        .canonical_reason()
        .unwrap_or("request failed")
        .to_string()
}
