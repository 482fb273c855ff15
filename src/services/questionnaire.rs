use crate::api::ApiClient;
use crate::domain::scoring::{QuestionnaireForm, StressBand};
use crate::error::{ClientError, ClientResult};
use serde::Serialize;

/// Loads a questionnaire into a fresh, ready form.
pub async fn fetch(api: &ApiClient, token: &str, questionnaire_id: i64) -> ClientResult<QuestionnaireForm> {
    let questionnaire = api.get_questionnaire(token, questionnaire_id).await?;
    let mut form = QuestionnaireForm::new();
    form.loaded(questionnaire)?;
    Ok(form)
}

/// Like [`fetch`], but always yields a form: a load failure leaves it in its
/// error phase and hands the cause back alongside.
pub async fn load(
    api: &ApiClient,
    token: &str,
    questionnaire_id: i64,
) -> (QuestionnaireForm, Option<ClientError>) {
    match fetch(api, token, questionnaire_id).await {
        Ok(form) => (form, None),
        Err(e) => {
            tracing::warn!("Failed to load questionnaire {}: {}", questionnaire_id, e);
            let mut form = QuestionnaireForm::new();
            form.load_failed(e.to_string());
            (form, Some(e))
        }
    }
}

/// Submits the current selection. On success the form moves to Submitted
/// and the server-issued response id is returned; on failure it goes back
/// to Ready and the error is surfaced.
pub async fn submit(
    api: &ApiClient,
    token: &str,
    user_id: i64,
    form: &mut QuestionnaireForm,
) -> ClientResult<i64> {
    let submission = form.begin_submit(user_id)?;
    match api.submit_response(token, &submission).await {
        Ok(created) => {
            tracing::info!(
                "Questionnaire {} submitted by user {} (score {})",
                submission.questionnaire_id,
                user_id,
                submission.total_score
            );
            form.submit_succeeded(created.id);
            Ok(created.id)
        }
        Err(e) => {
            tracing::warn!("Questionnaire submission failed: {}", e);
            form.submit_failed(e.to_string());
            Err(e)
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultView {
    pub response_id: i64,
    pub questionnaire_id: i64,
    pub total_score: u64,
    pub band: StressBand,
    pub interpretation: &'static str,
    pub feedback_message: Option<String>,
}

pub async fn result(api: &ApiClient, token: &str, response_id: i64) -> ClientResult<ResultView> {
    let response = api.get_response(token, response_id).await?;
    let band = StressBand::from_score(response.total_score);
    Ok(ResultView {
        response_id: response.id.unwrap_or(response_id),
        questionnaire_id: response.questionnaire_id,
        total_score: response.total_score,
        band,
        interpretation: band.description(),
        feedback_message: response.feedback_message,
    })
}
