use crate::domain::editor::{BlockEdit, PageEditor};
use crate::domain::models::BlockKind;
use crate::domain::scoring::EventDraft;
use crate::error::{ClientError, ClientResult};
use crate::services::{events, pages, users};
use crate::state::SharedState;
use crate::web::session::Member;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

/// Page as submitted by the admin editor. A 409 body's `editor` object is
/// accepted as-is, which lets a client resume an interrupted save.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageDraft {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub blocks: Vec<DraftBlock>,
    #[serde(default)]
    pub page_id: Option<i64>,
    #[serde(default)]
    pub menu_linked: bool,
}

#[derive(Debug, Deserialize)]
pub struct DraftBlock {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub content: String,
}

impl PageDraft {
    fn apply(self, editor: &mut PageEditor) -> ClientResult<()> {
        let blocks = self
            .blocks
            .into_iter()
            .map(|b| {
                BlockKind::from_parts(&b.kind, b.content)
                    .map(|kind| (b.id, kind))
                    .ok_or_else(|| ClientError::validation("blocks", format!("unknown block type `{}`", b.kind)))
            })
            .collect::<ClientResult<Vec<_>>>()?;
        editor.set_title(self.title);
        editor.set_slug(self.slug);
        editor.replace_blocks(blocks);
        if let (None, Some(id)) = (editor.page_id(), self.page_id) {
            let slug = editor.clean_slug();
            editor.page_saved(id, slug);
        }
        if self.menu_linked {
            editor.set_menu_linked();
        }
        Ok(())
    }
}

/// One edit applied to a draft by `POST /admin/editor`.
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditorOp {
    /// Appends a block; an empty text block unless `type` says otherwise.
    Add {
        #[serde(default, rename = "type")]
        kind: Option<String>,
        #[serde(default)]
        content: Option<String>,
    },
    Edit {
        index: usize,
        #[serde(default, rename = "type")]
        kind: Option<String>,
        #[serde(default)]
        content: Option<String>,
    },
    Remove {
        index: usize,
    },
    Move {
        from: usize,
        to: usize,
    },
}

impl EditorOp {
    fn apply(self, editor: &mut PageEditor) -> ClientResult<()> {
        match self {
            EditorOp::Add { kind, content } => {
                let index = editor.append();
                edit_block(editor, index, kind, content)
            }
            EditorOp::Edit {
                index,
                kind,
                content,
            } => edit_block(editor, index, kind, content),
            EditorOp::Remove { index } => editor.remove(index).map(|_| ()),
            EditorOp::Move { from, to } => editor.move_block(from, to),
        }
    }
}

fn edit_block(
    editor: &mut PageEditor,
    index: usize,
    kind: Option<String>,
    content: Option<String>,
) -> ClientResult<()> {
    if let Some(kind) = kind {
        editor.edit(index, BlockEdit::Kind(kind))?;
    }
    if let Some(content) = content {
        editor.edit(index, BlockEdit::Content(content))?;
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct EditRequest {
    pub editor: PageDraft,
    #[serde(default)]
    pub ops: Vec<EditorOp>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventQuery {
    pub questionnaire_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventForm {
    pub questionnaire_id: i64,
    #[serde(flatten)]
    pub draft: EventDraft,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/stats", get(stats))
        .route("/pages", get(list_pages).post(create_page))
        .route("/pages/:slug", get(edit_page).put(update_page))
        .route("/editor", post(edit_draft))
        .route("/users", get(list_users))
        .route("/users/:id/toggle", post(toggle_user))
        .route("/questionnaires", get(list_questionnaires))
        .route("/events", get(list_events).post(create_event))
        .route("/events/:id", put(update_event).delete(delete_event))
        .with_state(state)
}

async fn stats(
    State(state): State<SharedState>,
    member: Member,
) -> Result<impl IntoResponse, ClientError> {
    Ok(Json(users::stats(&state.api, &member.token).await?))
}

async fn list_pages(
    State(state): State<SharedState>,
    member: Member,
) -> Result<impl IntoResponse, ClientError> {
    Ok(Json(pages::list_pages(&state.api, &member.token).await?))
}

async fn edit_page(
    State(state): State<SharedState>,
    member: Member,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ClientError> {
    Ok(Json(pages::load_editor(&state.api, &member.token, &slug).await?))
}

/// Applies block edits to a draft and answers the resulting editor state.
/// Nothing is sent to the remote API.
async fn edit_draft(
    _member: Member,
    Json(request): Json<EditRequest>,
) -> Result<impl IntoResponse, ClientError> {
    let mut editor = PageEditor::new_page();
    request.editor.apply(&mut editor)?;
    for op in request.ops {
        op.apply(&mut editor)?;
    }
    Ok(Json(editor))
}

/// Turns a save outcome into a response. An interrupted save answers 409
/// with the editor state so the client can retry only what is left.
fn save_outcome(
    outcome: ClientResult<pages::SaveReport>,
    editor: &PageEditor,
    created: bool,
) -> Result<Response, ClientError> {
    match outcome {
        Ok(report) => {
            let status = if created { StatusCode::CREATED } else { StatusCode::OK };
            Ok((status, Json(report)).into_response())
        }
        Err(ClientError::PartialSave {
            completed,
            failed,
            source,
        }) => Ok((
            StatusCode::CONFLICT,
            Json(json!({
                "error": source.to_string(),
                "completed": completed,
                "failed": failed,
                "editor": editor,
            })),
        )
            .into_response()),
        Err(e) => Err(e),
    }
}

async fn create_page(
    State(state): State<SharedState>,
    member: Member,
    Json(draft): Json<PageDraft>,
) -> Result<Response, ClientError> {
    let mut editor = PageEditor::new_page();
    draft.apply(&mut editor)?;
    let outcome = pages::publish_new_page(&state.api, &member.token, &mut editor).await;
    save_outcome(outcome, &editor, true)
}

async fn update_page(
    State(state): State<SharedState>,
    member: Member,
    Path(slug): Path<String>,
    Json(draft): Json<PageDraft>,
) -> Result<Response, ClientError> {
    let mut editor = pages::load_editor(&state.api, &member.token, &slug).await?;
    draft.apply(&mut editor)?;
    let outcome = pages::save_page(&state.api, &member.token, &mut editor).await;
    save_outcome(outcome, &editor, false)
}

async fn list_users(
    State(state): State<SharedState>,
    member: Member,
) -> Result<impl IntoResponse, ClientError> {
    Ok(Json(
        users::list(&state.api, &member.token, member.identity.role).await?,
    ))
}

async fn toggle_user(
    State(state): State<SharedState>,
    member: Member,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ClientError> {
    let is_active = users::toggle(&state.api, &member.token, id).await?;
    Ok(Json(json!({ "id": id, "isActive": is_active })))
}

async fn list_questionnaires(
    State(state): State<SharedState>,
    member: Member,
) -> Result<impl IntoResponse, ClientError> {
    Ok(Json(events::questionnaires(&state.api, &member.token).await?))
}

async fn list_events(
    State(state): State<SharedState>,
    member: Member,
    Query(query): Query<EventQuery>,
) -> Result<impl IntoResponse, ClientError> {
    Ok(Json(
        events::events_for(&state.api, &member.token, query.questionnaire_id).await?,
    ))
}

async fn create_event(
    State(state): State<SharedState>,
    member: Member,
    Json(form): Json<EventForm>,
) -> Result<impl IntoResponse, ClientError> {
    let event = events::create(&state.api, &member.token, form.questionnaire_id, &form.draft).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

async fn update_event(
    State(state): State<SharedState>,
    member: Member,
    Path(id): Path<i64>,
    Json(form): Json<EventForm>,
) -> Result<impl IntoResponse, ClientError> {
    events::update(&state.api, &member.token, id, form.questionnaire_id, &form.draft).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_event(
    State(state): State<SharedState>,
    member: Member,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ClientError> {
    events::delete(&state.api, &member.token, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
