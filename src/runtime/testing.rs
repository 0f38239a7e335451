//! Mock implementations for testing
//!
//! These mocks enable driver and client tests without real I/O.

use super::traits::StepSource;
use crate::agent::{Step, StepError, Transcript};
use crate::llm::{LlmError, LlmRequest, LlmResponse, LlmService, Usage};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Build a one-part response carrying `text`
pub fn text_response(text: &str) -> LlmResponse {
    LlmResponse {
        parts: vec![text.to_string()],
        usage: Usage::default(),
    }
}

/// Build a response whose text is the JSON form of a step
pub fn step_response(name: &str, content: &str) -> LlmResponse {
    text_response(&Step::new(name, content).to_turn_text())
}

// ============================================================================
// Mock LLM Service
// ============================================================================

/// Mock LLM service that returns queued responses
pub struct MockLlmService {
    responses: Mutex<VecDeque<Result<LlmResponse, LlmError>>>,
    /// Record of all requests made, with the key they carried
    requests: Mutex<Vec<(LlmRequest, String)>>,
}

impl MockLlmService {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful response
    pub fn queue_response(&self, response: LlmResponse) {
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    /// Queue an error response
    pub fn queue_error(&self, error: LlmError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<(LlmRequest, String)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmService for MockLlmService {
    async fn complete(
        &self,
        request: &LlmRequest,
        api_key: &SecretString,
    ) -> Result<LlmResponse, LlmError> {
        self.requests
            .lock()
            .unwrap()
            .push((request.clone(), api_key.expose_secret().clone()));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::network("No mock response queued")))
    }

    fn model_id(&self) -> &str {
        "mock-model"
    }
}

// ============================================================================
// Mock Step Source
// ============================================================================

/// Mock step source that returns queued outcomes
pub struct MockStepSource {
    outcomes: Mutex<VecDeque<Result<Step, StepError>>>,
    /// Transcript length seen by each call
    calls: Mutex<Vec<usize>>,
}

impl MockStepSource {
    pub fn new() -> Self {
        Self {
            outcomes: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue steps with the given names, in order
    pub fn with_steps(names: &[&str]) -> Self {
        let source = Self::new();
        for name in names {
            source.queue_step(Step::new(*name, format!("content of {name}")));
        }
        source
    }

    pub fn queue_step(&self, step: Step) {
        self.outcomes.lock().unwrap().push_back(Ok(step));
    }

    pub fn queue_error(&self, error: StepError) {
        self.outcomes.lock().unwrap().push_back(Err(error));
    }

    /// Transcript lengths passed to each call, in order
    pub fn recorded_calls(&self) -> Vec<usize> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl StepSource for MockStepSource {
    async fn next_step(&self, _query: &str, transcript: &Transcript) -> Result<Step, StepError> {
        self.calls.lock().unwrap().push(transcript.len());
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(StepError::Transport(LlmError::network("No mock step queued"))))
    }
}
