//! Step client failures

use crate::llm::{LlmError, LlmErrorKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a step request produced no step
#[derive(Debug, Error)]
pub enum StepError {
    #[error("no Gemini API key is configured")]
    MissingCredential,

    #[error("step request failed: {0}")]
    Transport(#[from] LlmError),

    #[error("model response contained no text")]
    EmptyResponse,

    #[error("model output is not a step object: {source}")]
    MalformedStep {
        raw: String,
        #[source]
        source: serde_json::Error,
    },
}

impl StepError {
    pub fn kind(&self) -> FailureKind {
        match self {
            StepError::MissingCredential => FailureKind::MissingCredential,
            StepError::Transport(e) if e.kind == LlmErrorKind::MalformedResponse => {
                FailureKind::MalformedResponse
            }
            StepError::Transport(_) => FailureKind::Transport,
            StepError::EmptyResponse | StepError::MalformedStep { .. } => {
                FailureKind::MalformedResponse
            }
        }
    }

    /// Message shown in the UI's error area
    pub fn user_message(&self) -> String {
        match self {
            StepError::MissingCredential => {
                "Please set your Gemini API key in settings".to_string()
            }
            StepError::Transport(e) if e.kind == LlmErrorKind::Auth => {
                "Gemini rejected the API key. Please check it in settings and try again.".to_string()
            }
            StepError::Transport(e) if e.kind == LlmErrorKind::RateLimit => {
                "Gemini rate limit reached. Please wait a moment and try again.".to_string()
            }
            StepError::Transport(e) if e.kind == LlmErrorKind::MalformedResponse => {
                "The model returned a response that could not be read.".to_string()
            }
            StepError::Transport(_) => {
                "Failed to connect to Gemini API. Please check your API key and try again."
                    .to_string()
            }
            StepError::EmptyResponse => "The model returned an empty response.".to_string(),
            StepError::MalformedStep { .. } => {
                "The model returned a step that could not be read.".to_string()
            }
        }
    }
}

/// Classification of a failed run, shared with the state machine and the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    MissingCredential,
    Transport,
    MalformedResponse,
    StepLimit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(StepError::MissingCredential.kind(), FailureKind::MissingCredential);
        assert_eq!(
            StepError::Transport(LlmError::server_error("boom")).kind(),
            FailureKind::Transport
        );
        assert_eq!(StepError::EmptyResponse.kind(), FailureKind::MalformedResponse);
        assert_eq!(
            StepError::Transport(LlmError::malformed_response("bad body")).kind(),
            FailureKind::MalformedResponse
        );

        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let malformed = StepError::MalformedStep {
            raw: "{".to_string(),
            source,
        };
        assert_eq!(malformed.kind(), FailureKind::MalformedResponse);
    }

    #[test]
    fn test_user_messages_never_leak_detail() {
        let err = StepError::Transport(LlmError::auth("Authentication failed: key=abc123"));
        assert!(!err.user_message().contains("abc123"));
        assert!(err.user_message().contains("API key"));

        let err = StepError::Transport(LlmError::network("Connection failed"));
        assert!(err.user_message().starts_with("Failed to connect to Gemini API"));
    }
}
