use crate::api::ApiClient;
use crate::domain::models::{Event, EventPayload, Questionnaire};
use crate::domain::scoring::EventDraft;
use crate::error::ClientResult;

pub async fn questionnaires(api: &ApiClient, token: &str) -> ClientResult<Vec<Questionnaire>> {
    api.list_questionnaires(token).await
}

pub async fn events_for(
    api: &ApiClient,
    token: &str,
    questionnaire_id: i64,
) -> ClientResult<Vec<Event>> {
    let events = api.list_events(token).await?;
    Ok(events
        .into_iter()
        .filter(|e| e.questionnaire_id == questionnaire_id)
        .collect())
}

pub async fn create(
    api: &ApiClient,
    token: &str,
    questionnaire_id: i64,
    draft: &EventDraft,
) -> ClientResult<Event> {
    let (label, score) = draft.validate()?;
    let event = api
        .create_event(
            token,
            &EventPayload {
                label: &label,
                score,
                questionnaire_id,
            },
        )
        .await?;
    tracing::info!("Event {} created in questionnaire {}", event.id, questionnaire_id);
    Ok(event)
}

pub async fn update(
    api: &ApiClient,
    token: &str,
    event_id: i64,
    questionnaire_id: i64,
    draft: &EventDraft,
) -> ClientResult<()> {
    let (label, score) = draft.validate()?;
    api.update_event(
        token,
        event_id,
        &EventPayload {
            label: &label,
            score,
            questionnaire_id,
        },
    )
    .await?;
    tracing::info!("Event {} updated", event_id);
    Ok(())
}

pub async fn delete(api: &ApiClient, token: &str, event_id: i64) -> ClientResult<()> {
    api.delete_event(token, event_id).await?;
    tracing::info!("Event {} deleted", event_id);
    Ok(())
}
