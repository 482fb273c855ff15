//! In-process stand-in for the remote CesiZen API, served by axum on a
//! random local port. Used by tests across the crate.

use crate::api::ApiClient;
use crate::domain::models::{
    ContentBlock, Event, MenuItem, Page, Questionnaire, RequiredRole, RoleRef, User, UserResponse,
};
use axum::{
    extract::{Path, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, patch, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

pub const PASSWORD: &str = "secret";
const PREFIX: &str = "/cesizen/api/v1";

type Reply = Result<Response, (StatusCode, Json<Value>)>;

#[derive(Clone)]
struct StoredBlock {
    id: i64,
    page_id: i64,
    kind: String,
    content: String,
    order: u32,
}

#[derive(Clone)]
struct StoredPage {
    id: i64,
    title: String,
    slug: String,
}

#[derive(Default)]
struct Db {
    users: Vec<User>,
    passwords: HashMap<String, String>,
    tokens: HashMap<String, i64>,
    pages: Vec<StoredPage>,
    blocks: Vec<StoredBlock>,
    menu: Vec<MenuItem>,
    questionnaires: Vec<Questionnaire>,
    events: Vec<Event>,
    responses: Vec<UserResponse>,
    next_id: i64,
    calls: Vec<String>,
    failures: HashSet<String>,
}

impl Db {
    fn id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn add_user(&mut self, email: &str, first: &str, role: (i64, &str), active: bool) {
        let id = self.id();
        self.users.push(User {
            id,
            firstname: first.to_string(),
            lastname: "Test".to_string(),
            email: email.to_string(),
            is_active: active,
            role: RoleRef {
                id: role.0,
                label: role.1.to_string(),
            },
        });
        self.passwords.insert(email.to_string(), PASSWORD.to_string());
    }

    fn page_view(&self, page: &StoredPage) -> Page {
        let mut blocks: Vec<&StoredBlock> =
            self.blocks.iter().filter(|b| b.page_id == page.id).collect();
        blocks.sort_by_key(|b| b.order);
        let content = blocks
            .into_iter()
            .map(|b| {
                serde_json::from_value::<ContentBlock>(json!({
                    "id": b.id,
                    "type": b.kind,
                    "content": b.content,
                    "order": b.order,
                }))
                .expect("stored block is valid")
            })
            .collect();
        Page {
            id: page.id,
            title: page.title.clone(),
            slug: page.slug.clone(),
            content,
        }
    }

    fn questionnaire_view(&self, q: &Questionnaire) -> Questionnaire {
        let mut q = q.clone();
        q.events = self
            .events
            .iter()
            .filter(|e| e.questionnaire_id == q.id)
            .cloned()
            .collect();
        q
    }

    fn seed() -> Self {
        let mut db = Db::default();
        db.add_user("user@cesi.fr", "Lea", (1, "user"), true);
        db.add_user("admin@cesi.fr", "Adam", (2, "admin"), true);
        db.add_user("root@cesi.fr", "Rita", (3, "super-admin"), true);
        db.add_user("other@cesi.fr", "Omar", (1, "user"), false);

        let page_id = db.id();
        db.pages.push(StoredPage {
            id: page_id,
            title: "Accueil".to_string(),
            slug: "accueil".to_string(),
        });
        for (order, (kind, content)) in [("text", "<p>Bienvenue</p>"), ("image", "http://img/1.png")]
            .into_iter()
            .enumerate()
        {
            let id = db.id();
            db.blocks.push(StoredBlock {
                id,
                page_id,
                kind: kind.to_string(),
                content: content.to_string(),
                order: order as u32 + 1,
            });
        }

        let menu = [
            ("Accueil", "accueil", None),
            ("Espace membre", "membre", Some(RequiredRole::Id(1))),
            ("Gestion", "gestion", Some(RequiredRole::Label("admin".to_string()))),
            ("Système", "systeme", Some(RequiredRole::Id(3))),
        ];
        for (order, (label, slug, required)) in menu.into_iter().enumerate() {
            let id = db.id();
            db.menu.push(MenuItem {
                id,
                label: label.to_string(),
                slug: slug.to_string(),
                order: order as i64 + 1,
                required_role: required,
            });
        }

        let qid = db.id();
        db.questionnaires.push(Questionnaire {
            id: qid,
            title: "Holmes et Rahe".to_string(),
            description: "Échelle de stress".to_string(),
            events: Vec::new(),
            created_at: None,
            updated_at: None,
        });
        for (label, score) in [("Décès du conjoint", 100), ("Divorce", 73), ("Vacances", 13)] {
            let id = db.id();
            db.events.push(Event {
                id,
                label: label.to_string(),
                score,
                questionnaire_id: qid,
                created_at: None,
                updated_at: None,
            });
        }
        db
    }
}

#[derive(Clone)]
pub struct FakeApi {
    db: Arc<Mutex<Db>>,
    base_url: String,
}

impl FakeApi {
    pub async fn spawn() -> Self {
        let db = Arc::new(Mutex::new(Db::seed()));
        let app = router(db.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake api");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("fake api server");
        });
        Self {
            db,
            base_url: format!("http://{addr}{PREFIX}"),
        }
    }

    pub fn client(&self) -> ApiClient {
        ApiClient::new(self.base_url.clone())
    }

    /// Issues a valid token for a seeded user.
    pub fn token_for(&self, email: &str) -> String {
        let mut db = self.db.lock().unwrap();
        let user_id = db
            .users
            .iter()
            .find(|u| u.email == email)
            .map(|u| u.id)
            .expect("seeded user");
        let token = format!("tok-{email}");
        db.tokens.insert(token.clone(), user_id);
        token
    }

    pub fn user_id(&self, email: &str) -> i64 {
        let db = self.db.lock().unwrap();
        db.users.iter().find(|u| u.email == email).map(|u| u.id).expect("seeded user")
    }

    pub fn questionnaire_id(&self) -> i64 {
        self.db.lock().unwrap().questionnaires[0].id
    }

    pub fn event_ids(&self) -> Vec<i64> {
        self.db.lock().unwrap().events.iter().map(|e| e.id).collect()
    }

    /// Makes `METHOD /path` (relative to the API base) answer 500.
    pub fn fail_on(&self, method: &str, path: &str) {
        self.db
            .lock()
            .unwrap()
            .failures
            .insert(format!("{method} {path}"));
    }

    pub fn clear_failures(&self) {
        self.db.lock().unwrap().failures.clear();
    }

    /// Requests received so far, as `METHOD /path` relative to the API base.
    pub fn calls(&self) -> Vec<String> {
        self.db.lock().unwrap().calls.clone()
    }

    pub fn block_ids(&self, slug: &str) -> Vec<i64> {
        let db = self.db.lock().unwrap();
        let Some(page) = db.pages.iter().find(|p| p.slug == slug) else {
            return Vec::new();
        };
        let mut blocks: Vec<&StoredBlock> = db.blocks.iter().filter(|b| b.page_id == page.id).collect();
        blocks.sort_by_key(|b| b.order);
        blocks.iter().map(|b| b.id).collect()
    }

    pub fn menu_slugs(&self) -> Vec<String> {
        self.db.lock().unwrap().menu.iter().map(|m| m.slug.clone()).collect()
    }
}

fn router(db: Arc<Mutex<Db>>) -> Router {
    Router::new()
        .route(&format!("{PREFIX}/auth/login"), post(login))
        .route(&format!("{PREFIX}/auth/register"), post(register))
        .route(&format!("{PREFIX}/auth/me"), get(me))
        .route(&format!("{PREFIX}/pages"), get(list_pages).post(create_page))
        .route(&format!("{PREFIX}/pages/:slug"), get(get_page).put(update_page))
        .route(&format!("{PREFIX}/public-pages/:slug"), get(public_page))
        .route(&format!("{PREFIX}/content-blocks"), post(create_block))
        .route(&format!("{PREFIX}/content-blocks/:id"), put(update_block).delete(delete_block))
        .route(&format!("{PREFIX}/public-menu"), get(public_menu))
        .route(&format!("{PREFIX}/menu-items"), get(menu_items).post(create_menu_item))
        .route(&format!("{PREFIX}/questionnaires"), get(list_questionnaires))
        .route(&format!("{PREFIX}/questionnaires/:id"), get(get_questionnaire))
        .route(&format!("{PREFIX}/events"), get(list_events).post(create_event))
        .route(&format!("{PREFIX}/events/:id"), put(update_event).delete(delete_event))
        .route(&format!("{PREFIX}/user-responses"), post(create_response))
        .route(&format!("{PREFIX}/user-responses/:id"), get(get_response))
        .route(&format!("{PREFIX}/users"), get(list_users))
        .route(&format!("{PREFIX}/users/:id/toggle"), patch(toggle_user))
        .route(&format!("{PREFIX}/admin/stats"), get(stats))
        .layer(middleware::from_fn_with_state(db.clone(), record_and_inject))
        .with_state(db)
}

async fn record_and_inject(
    State(db): State<Arc<Mutex<Db>>>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().trim_start_matches(PREFIX);
    let key = format!("{} {}", request.method(), path);
    let fail = {
        let mut db = db.lock().unwrap();
        db.calls.push(key.clone());
        db.failures.contains(&key)
    };
    if fail {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "injected failure" })),
        )
            .into_response();
    }
    next.run(request).await
}

fn reject(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "error": message })))
}

fn caller(db: &Db, headers: &HeaderMap) -> Result<User, (StatusCode, Json<Value>)> {
    let token = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "Missing token"))?;
    db.tokens
        .get(token)
        .and_then(|id| db.users.iter().find(|u| u.id == *id))
        .cloned()
        .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "Invalid token"))
}

fn ok(value: impl serde::Serialize) -> Reply {
    Ok(Json(json!(value)).into_response())
}

fn str_field<'a>(body: &'a Value, key: &str) -> &'a str {
    body.get(key).and_then(Value::as_str).unwrap_or_default()
}

fn int_field(body: &Value, key: &str) -> i64 {
    body.get(key).and_then(Value::as_i64).unwrap_or_default()
}

async fn login(State(db): State<Arc<Mutex<Db>>>, Json(body): Json<Value>) -> Reply {
    let mut db = db.lock().unwrap();
    let email = str_field(&body, "email").to_string();
    if db.passwords.get(&email).map(String::as_str) != Some(str_field(&body, "password")) {
        return Err(reject(StatusCode::UNAUTHORIZED, "Invalid credentials"));
    }
    let user_id = db.users.iter().find(|u| u.email == email).map(|u| u.id).unwrap_or_default();
    let token = format!("tok-{email}");
    db.tokens.insert(token.clone(), user_id);
    ok(json!({ "token": token }))
}

async fn register(State(db): State<Arc<Mutex<Db>>>, Json(body): Json<Value>) -> Reply {
    let mut db = db.lock().unwrap();
    let email = str_field(&body, "email").to_string();
    if db.passwords.contains_key(&email) {
        return Err(reject(StatusCode::BAD_REQUEST, "Email already used"));
    }
    db.add_user(&email, str_field(&body, "firstname"), (1, "user"), true);
    let password = str_field(&body, "password").to_string();
    db.passwords.insert(email.clone(), password);
    let user_id = db.next_id;
    let token = format!("tok-{email}");
    db.tokens.insert(token.clone(), user_id);
    ok(json!({ "token": token }))
}

async fn me(State(db): State<Arc<Mutex<Db>>>, headers: HeaderMap) -> Reply {
    let db = db.lock().unwrap();
    ok(caller(&db, &headers)?)
}

async fn list_pages(State(db): State<Arc<Mutex<Db>>>, headers: HeaderMap) -> Reply {
    let db = db.lock().unwrap();
    caller(&db, &headers)?;
    let pages: Vec<Page> = db.pages.iter().map(|p| db.page_view(p)).collect();
    ok(pages)
}

async fn create_page(
    State(db): State<Arc<Mutex<Db>>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    let mut db = db.lock().unwrap();
    caller(&db, &headers)?;
    let slug = str_field(&body, "slug").to_string();
    if db.pages.iter().any(|p| p.slug == slug) {
        return Err(reject(StatusCode::BAD_REQUEST, "Slug already used"));
    }
    let id = db.id();
    let page = StoredPage {
        id,
        title: str_field(&body, "title").to_string(),
        slug,
    };
    db.pages.push(page.clone());
    ok(json!({ "id": id, "title": page.title, "slug": page.slug }))
}

async fn get_page(
    State(db): State<Arc<Mutex<Db>>>,
    headers: HeaderMap,
    Path(slug): Path<String>,
) -> Reply {
    let db = db.lock().unwrap();
    caller(&db, &headers)?;
    let page = db
        .pages
        .iter()
        .find(|p| p.slug == slug)
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "Page not found"))?;
    ok(db.page_view(page))
}

async fn public_page(State(db): State<Arc<Mutex<Db>>>, Path(slug): Path<String>) -> Reply {
    let db = db.lock().unwrap();
    let page = db
        .pages
        .iter()
        .find(|p| p.slug == slug)
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "Page not found"))?;
    ok(db.page_view(page))
}

async fn update_page(
    State(db): State<Arc<Mutex<Db>>>,
    headers: HeaderMap,
    Path(slug): Path<String>,
    Json(body): Json<Value>,
) -> Reply {
    let mut db = db.lock().unwrap();
    caller(&db, &headers)?;
    let page = db
        .pages
        .iter_mut()
        .find(|p| p.slug == slug)
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "Page not found"))?;
    page.title = str_field(&body, "title").to_string();
    page.slug = str_field(&body, "slug").to_string();
    let page = page.clone();
    ok(json!({ "id": page.id, "title": page.title, "slug": page.slug }))
}

async fn create_block(
    State(db): State<Arc<Mutex<Db>>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    let mut db = db.lock().unwrap();
    caller(&db, &headers)?;
    let page_id = int_field(&body, "pageId");
    if !db.pages.iter().any(|p| p.id == page_id) {
        return Err(reject(StatusCode::BAD_REQUEST, "Unknown page"));
    }
    let id = db.id();
    db.blocks.push(StoredBlock {
        id,
        page_id,
        kind: str_field(&body, "type").to_string(),
        content: str_field(&body, "content").to_string(),
        order: int_field(&body, "order") as u32,
    });
    ok(json!({ "id": id }))
}

async fn update_block(
    State(db): State<Arc<Mutex<Db>>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Reply {
    let mut db = db.lock().unwrap();
    caller(&db, &headers)?;
    let block = db
        .blocks
        .iter_mut()
        .find(|b| b.id == id)
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "Block not found"))?;
    block.kind = str_field(&body, "type").to_string();
    block.content = str_field(&body, "content").to_string();
    block.order = int_field(&body, "order") as u32;
    ok(json!({ "id": id }))
}

async fn delete_block(
    State(db): State<Arc<Mutex<Db>>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Reply {
    let mut db = db.lock().unwrap();
    caller(&db, &headers)?;
    let before = db.blocks.len();
    db.blocks.retain(|b| b.id != id);
    if db.blocks.len() == before {
        return Err(reject(StatusCode::NOT_FOUND, "Block not found"));
    }
    Ok(StatusCode::NO_CONTENT.into_response())
}

async fn public_menu(State(db): State<Arc<Mutex<Db>>>) -> Reply {
    let db = db.lock().unwrap();
    ok(db.menu.clone())
}

async fn menu_items(State(db): State<Arc<Mutex<Db>>>, headers: HeaderMap) -> Reply {
    let db = db.lock().unwrap();
    caller(&db, &headers)?;
    ok(db.menu.clone())
}

async fn create_menu_item(
    State(db): State<Arc<Mutex<Db>>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    let mut db = db.lock().unwrap();
    caller(&db, &headers)?;
    let id = db.id();
    let required_role = serde_json::from_value(body.get("requiredRole").cloned().unwrap_or(Value::Null))
        .unwrap_or_default();
    db.menu.push(MenuItem {
        id,
        label: str_field(&body, "label").to_string(),
        slug: str_field(&body, "slug").to_string(),
        order: int_field(&body, "order"),
        required_role,
    });
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))).into_response())
}

async fn list_questionnaires(State(db): State<Arc<Mutex<Db>>>, headers: HeaderMap) -> Reply {
    let db = db.lock().unwrap();
    caller(&db, &headers)?;
    let all: Vec<Questionnaire> = db.questionnaires.iter().map(|q| db.questionnaire_view(q)).collect();
    ok(all)
}

async fn get_questionnaire(
    State(db): State<Arc<Mutex<Db>>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Reply {
    let db = db.lock().unwrap();
    caller(&db, &headers)?;
    let q = db
        .questionnaires
        .iter()
        .find(|q| q.id == id)
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "Questionnaire not found"))?;
    ok(db.questionnaire_view(q))
}

async fn list_events(State(db): State<Arc<Mutex<Db>>>, headers: HeaderMap) -> Reply {
    let db = db.lock().unwrap();
    caller(&db, &headers)?;
    ok(db.events.clone())
}

async fn create_event(
    State(db): State<Arc<Mutex<Db>>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    let mut db = db.lock().unwrap();
    caller(&db, &headers)?;
    let id = db.id();
    let event = Event {
        id,
        label: str_field(&body, "label").to_string(),
        score: int_field(&body, "score") as u32,
        questionnaire_id: int_field(&body, "questionnaireId"),
        created_at: None,
        updated_at: None,
    };
    db.events.push(event.clone());
    ok(event)
}

async fn update_event(
    State(db): State<Arc<Mutex<Db>>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Reply {
    let mut db = db.lock().unwrap();
    caller(&db, &headers)?;
    let event = db
        .events
        .iter_mut()
        .find(|e| e.id == id)
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "Event not found"))?;
    event.label = str_field(&body, "label").to_string();
    event.score = int_field(&body, "score") as u32;
    let event = event.clone();
    ok(event)
}

async fn delete_event(
    State(db): State<Arc<Mutex<Db>>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Reply {
    let mut db = db.lock().unwrap();
    caller(&db, &headers)?;
    db.events.retain(|e| e.id != id);
    Ok(StatusCode::NO_CONTENT.into_response())
}

async fn create_response(
    State(db): State<Arc<Mutex<Db>>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    let mut db = db.lock().unwrap();
    caller(&db, &headers)?;
    let id = db.id();
    let mut response: UserResponse = serde_json::from_value(body)
        .map_err(|e| reject(StatusCode::BAD_REQUEST, &e.to_string()))?;
    response.id = Some(id);
    response.feedback_message = Some(format!("Score enregistré : {}", response.total_score));
    db.responses.push(response);
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))).into_response())
}

async fn get_response(
    State(db): State<Arc<Mutex<Db>>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Reply {
    let db = db.lock().unwrap();
    caller(&db, &headers)?;
    let response = db
        .responses
        .iter()
        .find(|r| r.id == Some(id))
        .cloned()
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "Response not found"))?;
    ok(response)
}

async fn list_users(State(db): State<Arc<Mutex<Db>>>, headers: HeaderMap) -> Reply {
    let db = db.lock().unwrap();
    caller(&db, &headers)?;
    ok(db.users.clone())
}

async fn toggle_user(
    State(db): State<Arc<Mutex<Db>>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Reply {
    let mut db = db.lock().unwrap();
    caller(&db, &headers)?;
    let active = body.get("isActive").and_then(Value::as_bool).unwrap_or_default();
    let user = db
        .users
        .iter_mut()
        .find(|u| u.id == id)
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "User not found"))?;
    user.is_active = active;
    let user = user.clone();
    ok(user)
}

async fn stats(State(db): State<Arc<Mutex<Db>>>, headers: HeaderMap) -> Reply {
    let db = db.lock().unwrap();
    caller(&db, &headers)?;
    ok(json!({
        "usersCount": db.users.len(),
        "contentCount": db.pages.len(),
        "questionnaireCount": db.questionnaires.len(),
    }))
}
