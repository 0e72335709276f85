use thiserror::Error;

/// Why a prediction request failed. Every variant is recovered by the session
/// through the fallback prediction.
#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("request to the prediction API failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("prediction API returned status {status}: {body}")]
    HttpStatus {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("no response candidates received from the prediction API")]
    EmptyResponse,

    #[error("response text does not contain a JSON object")]
    NoJsonObject,

    #[error("response JSON could not be parsed: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("response JSON does not match the prediction schema: {0}")]
    Schema(String),
}

/// Coarse classification of [`PredictionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    EmptyResponse,
    Format,
}

impl PredictionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PredictionError::Transport(_) | PredictionError::HttpStatus { .. } => {
                ErrorKind::Transport
            }
            PredictionError::EmptyResponse => ErrorKind::EmptyResponse,
            PredictionError::NoJsonObject
            | PredictionError::InvalidJson(_)
            | PredictionError::Schema(_) => ErrorKind::Format,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("request was superseded by a newer submission")]
    Superseded,

    #[error("request was cancelled")]
    Cancelled,
}
