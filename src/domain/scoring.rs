use crate::domain::models::{Event, Questionnaire, ResponseSubmission};
use crate::error::{ClientError, ClientResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const MODERATE_THRESHOLD: u64 = 50;
pub const HIGH_THRESHOLD: u64 = 100;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StressBand {
    Low,
    Moderate,
    High,
}

impl StressBand {
    pub fn from_score(score: u64) -> Self {
        if score < MODERATE_THRESHOLD {
            StressBand::Low
        } else if score < HIGH_THRESHOLD {
            StressBand::Moderate
        } else {
            StressBand::High
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StressBand::Low => "low",
            StressBand::Moderate => "moderate",
            StressBand::High => "high",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            StressBand::Low => "Low stress level",
            StressBand::Moderate => "Moderate stress level",
            StressBand::High => "High stress level",
        }
    }
}

/// Sum of the scores of the selected events. Ids that match no event
/// contribute nothing.
pub fn total_score(events: &[Event], selected: &BTreeSet<i64>) -> u64 {
    events
        .iter()
        .filter(|e| selected.contains(&e.id))
        .map(|e| u64::from(e.score))
        .sum()
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum Phase {
    Loading,
    Ready,
    Submitting,
    Submitted {
        #[serde(rename = "responseId")]
        response_id: i64,
    },
    Error { message: String },
}

/// Client-side state of one questionnaire run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionnaireForm {
    phase: Phase,
    questionnaire: Option<Questionnaire>,
    selected: BTreeSet<i64>,
    last_error: Option<String>,
}

impl Default for QuestionnaireForm {
    fn default() -> Self {
        Self::new()
    }
}

impl QuestionnaireForm {
    pub fn new() -> Self {
        Self {
            phase: Phase::Loading,
            questionnaire: None,
            selected: BTreeSet::new(),
            last_error: None,
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn questionnaire(&self) -> Option<&Questionnaire> {
        self.questionnaire.as_ref()
    }

    pub fn events(&self) -> &[Event] {
        self.questionnaire
            .as_ref()
            .map(|q| q.events.as_slice())
            .unwrap_or(&[])
    }

    pub fn selected(&self) -> &BTreeSet<i64> {
        &self.selected
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn loaded(&mut self, questionnaire: Questionnaire) -> ClientResult<()> {
        self.expect_phase(matches!(self.phase, Phase::Loading), "load")?;
        self.questionnaire = Some(questionnaire);
        self.selected.clear();
        self.phase = Phase::Ready;
        Ok(())
    }

    pub fn load_failed(&mut self, message: impl Into<String>) {
        if matches!(self.phase, Phase::Loading) {
            self.phase = Phase::Error {
                message: message.into(),
            };
        }
    }

    /// Yes selects the event, no deselects it.
    pub fn answer(&mut self, event_id: i64, yes: bool) -> ClientResult<()> {
        self.expect_phase(matches!(self.phase, Phase::Ready), "answer")?;
        if !self.events().iter().any(|e| e.id == event_id) {
            return Err(ClientError::validation(
                "event",
                format!("event {event_id} is not part of this questionnaire"),
            ));
        }
        if yes {
            self.selected.insert(event_id);
        } else {
            self.selected.remove(&event_id);
        }
        Ok(())
    }

    pub fn total_score(&self) -> u64 {
        total_score(self.events(), &self.selected)
    }

    pub fn band(&self) -> StressBand {
        StressBand::from_score(self.total_score())
    }

    /// Ready -> Submitting; returns the payload to send.
    pub fn begin_submit(&mut self, user_id: i64) -> ClientResult<ResponseSubmission> {
        self.expect_phase(matches!(self.phase, Phase::Ready), "submit")?;
        let questionnaire_id = self
            .questionnaire
            .as_ref()
            .map(|q| q.id)
            .ok_or_else(|| ClientError::validation("questionnaire", "not loaded"))?;
        let submission = ResponseSubmission {
            user_id,
            questionnaire_id,
            selected_events: self.selected.iter().copied().collect(),
            total_score: self.total_score(),
        };
        self.last_error = None;
        self.phase = Phase::Submitting;
        Ok(submission)
    }

    pub fn submit_succeeded(&mut self, response_id: i64) {
        if matches!(self.phase, Phase::Submitting) {
            self.phase = Phase::Submitted { response_id };
        }
    }

    /// Back to Ready with the selection intact.
    pub fn submit_failed(&mut self, message: impl Into<String>) {
        if matches!(self.phase, Phase::Submitting) {
            self.last_error = Some(message.into());
            self.phase = Phase::Ready;
        }
    }

    fn expect_phase(&self, ok: bool, action: &str) -> ClientResult<()> {
        if ok {
            Ok(())
        } else {
            Err(ClientError::validation(
                "questionnaire",
                format!("cannot {action} while {:?}", self.phase),
            ))
        }
    }
}

/// Admin-side input for creating or editing an event.
#[derive(Debug, Clone, Deserialize)]
pub struct EventDraft {
    pub label: String,
    pub score: i64,
}

impl EventDraft {
    /// Returns the trimmed label and the score as stored.
    pub fn validate(&self) -> ClientResult<(String, u32)> {
        let label = self.label.trim();
        let len = label.chars().count();
        if len == 0 {
            return Err(ClientError::validation("label", "label is required"));
        }
        if len < 3 {
            return Err(ClientError::validation("label", "label must be at least 3 characters"));
        }
        if len > 255 {
            return Err(ClientError::validation("label", "label must be at most 255 characters"));
        }
        if self.score < 0 {
            return Err(ClientError::validation("score", "score must be greater than or equal to 0"));
        }
        let score = u32::try_from(self.score)
            .map_err(|_| ClientError::validation("score", "score is too large"))?;
        Ok((label.to_string(), score))
    }
}
