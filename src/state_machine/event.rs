//! Events that can occur during a run

use crate::agent::{FailureKind, Step};

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    /// The caller started the run
    Start,

    /// The step client returned a step
    StepReceived { step: Step },

    /// The step client returned no step
    StepFailed { message: String, kind: FailureKind },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::Start => "start",
            Event::StepReceived { .. } => "step_received",
            Event::StepFailed { .. } => "step_failed",
        }
    }
}
