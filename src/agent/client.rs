//! Step client: one request to the model, one parsed step back

use super::error::StepError;
use super::step::{parse_step, Step};
use super::transcript::Transcript;
use crate::credential::CredentialResolver;
use crate::llm::{LlmRequest, LlmService, SystemContent};
use crate::system_prompt::build_system_prompt;
use std::sync::Arc;

/// Performs exactly one generation request per call. Never retries.
pub struct StepClient {
    llm: Arc<dyn LlmService>,
    credentials: Arc<CredentialResolver>,
    system_prompt: String,
}

impl StepClient {
    pub fn new(llm: Arc<dyn LlmService>, credentials: Arc<CredentialResolver>) -> Self {
        Self {
            llm,
            credentials,
            system_prompt: build_system_prompt(),
        }
    }

    fn build_request(&self, query: &str, transcript: &Transcript) -> LlmRequest {
        LlmRequest {
            system: vec![SystemContent::new(self.system_prompt.clone())],
            messages: transcript.request_messages(query),
        }
    }

    /// Request the next step for `query` given the history so far.
    ///
    /// Missing credentials are detected before any request is built.
    pub async fn request_step(
        &self,
        query: &str,
        transcript: &Transcript,
    ) -> Result<Step, StepError> {
        let credential = self
            .credentials
            .resolve()
            .ok_or(StepError::MissingCredential)?;

        let request = self.build_request(query, transcript);
        let response = self.llm.complete(&request, &credential.secret).await?;

        if response.is_empty() {
            tracing::warn!(turns = transcript.len(), "Model returned no step text");
            return Err(StepError::EmptyResponse);
        }

        let raw = response.text();
        parse_step(&raw).map_err(|source| {
            tracing::warn!(error = %source, raw = %raw, "Failed to parse step JSON");
            StepError::MalformedStep { raw, source }
        })
    }
}
