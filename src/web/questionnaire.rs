use crate::domain::models::{Event, Questionnaire};
use crate::domain::scoring::{Phase, QuestionnaireForm, StressBand};
use crate::error::ClientError;
use crate::services::{events, questionnaire};
use crate::state::SharedState;
use crate::web::{session::Member, status_of};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionnaireView<'a> {
    #[serde(flatten)]
    pub phase: &'a Phase,
    pub questionnaire: Option<&'a Questionnaire>,
    pub events: &'a [Event],
    pub selected: &'a BTreeSet<i64>,
    pub last_error: Option<&'a str>,
}

impl<'a> From<&'a QuestionnaireForm> for QuestionnaireView<'a> {
    fn from(form: &'a QuestionnaireForm) -> Self {
        Self {
            phase: form.phase(),
            questionnaire: form.questionnaire(),
            events: form.events(),
            selected: form.selected(),
            last_error: form.last_error(),
        }
    }
}

#[derive(Deserialize)]
pub struct SubmitRequest {
    /// Events answered "yes"; everything else counts as "no".
    #[serde(default)]
    pub selected: Vec<i64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub response_id: i64,
    pub total_score: u64,
    pub band: StressBand,
    pub interpretation: &'static str,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/questionnaires", get(list))
        .route("/questionnaires/:id", get(show))
        .route("/questionnaires/:id/submit", post(submit))
        .route("/results/:id", get(result))
        .with_state(state)
}

async fn list(
    State(state): State<SharedState>,
    member: Member,
) -> Result<impl IntoResponse, ClientError> {
    Ok(Json(events::questionnaires(&state.api, &member.token).await?))
}

async fn show(
    State(state): State<SharedState>,
    member: Member,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let (form, error) = questionnaire::load(&state.api, &member.token, id).await;
    let status = error.as_ref().map_or(StatusCode::OK, status_of);
    (status, Json(QuestionnaireView::from(&form))).into_response()
}

async fn submit(
    State(state): State<SharedState>,
    member: Member,
    Path(id): Path<i64>,
    Json(payload): Json<SubmitRequest>,
) -> Result<impl IntoResponse, ClientError> {
    let mut form = questionnaire::fetch(&state.api, &member.token, id).await?;
    for event_id in payload.selected {
        form.answer(event_id, true)?;
    }
    let response_id =
        questionnaire::submit(&state.api, &member.token, member.identity.user.id, &mut form).await?;
    let band = form.band();
    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            response_id,
            total_score: form.total_score(),
            band,
            interpretation: band.description(),
        }),
    ))
}

async fn result(
    State(state): State<SharedState>,
    member: Member,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ClientError> {
    Ok(Json(questionnaire::result(&state.api, &member.token, id).await?))
}
