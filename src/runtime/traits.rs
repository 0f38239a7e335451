//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the driver with mock implementations.

use crate::agent::{Step, StepClient, StepError, Transcript};
use async_trait::async_trait;
use std::sync::Arc;

/// Source of reasoning steps
#[async_trait]
pub trait StepSource: Send + Sync {
    /// Produce the next step for `query` given the history so far
    async fn next_step(&self, query: &str, transcript: &Transcript) -> Result<Step, StepError>;
}

#[async_trait]
impl<T: StepSource + ?Sized> StepSource for Arc<T> {
    async fn next_step(&self, query: &str, transcript: &Transcript) -> Result<Step, StepError> {
        (**self).next_step(query, transcript).await
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

#[async_trait]
impl StepSource for StepClient {
    async fn next_step(&self, query: &str, transcript: &Transcript) -> Result<Step, StepError> {
        self.request_step(query, transcript).await
    }
}
