use crate::domain::editor::SaveStep;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("invalid {field}: {message}")]
    Validation { field: &'static str, message: String },
    #[error("{0} not found")]
    NotFound(String),
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },
    #[error("unexpected response body: {0}")]
    Decode(String),
    #[error("save interrupted at {failed} after {} completed step(s): {source}", completed.len())]
    PartialSave {
        completed: Vec<SaveStep>,
        failed: SaveStep,
        #[source]
        source: Box<ClientError>,
    },
}

impl ClientError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        ClientError::Validation {
            field,
            message: message.into(),
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
