//! API request and response types

use crate::credential::CredentialSource;
use serde::{Deserialize, Serialize};

/// Request to start a reasoning run
#[derive(Debug, Deserialize)]
pub struct StartRunRequest {
    pub query: String,
}

/// Response for an accepted run
#[derive(Debug, Serialize)]
pub struct StartRunResponse {
    pub run_id: String,
}

/// Request to store the Gemini API key
#[derive(Debug, Deserialize)]
pub struct CredentialRequest {
    pub api_key: String,
}

/// Current settings. The key itself is never returned.
#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    pub credential: CredentialSource,
}

/// Response for settings writes
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
