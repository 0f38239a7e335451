//! Run state types

use crate::agent::FailureKind;
use serde::{Deserialize, Serialize};

/// Default cap on steps per run when none is configured
pub const DEFAULT_MAX_STEPS: usize = 10;

/// State of one reasoning run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunState {
    /// Created, no request made yet
    #[default]
    Idle,

    /// Step request in flight; `step_index` is the position being fetched
    Requesting { step_index: usize },

    /// The model produced the final step
    Completed { steps: usize },

    /// The run stopped early; collected steps stay valid
    Failed {
        message: String,
        kind: FailureKind,
        steps: usize,
    },
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Completed { .. } | RunState::Failed { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            RunState::Idle => "idle",
            RunState::Requesting { .. } => "requesting",
            RunState::Completed { .. } => "completed",
            RunState::Failed { .. } => "failed",
        }
    }
}

/// Context for a run (immutable configuration)
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: String,
    /// `None` leaves termination entirely to the model
    pub max_steps: Option<usize>,
}

impl RunContext {
    pub fn new(run_id: impl Into<String>, max_steps: Option<usize>) -> Self {
        Self {
            run_id: run_id.into(),
            max_steps,
        }
    }

    pub fn limit_reached(&self, steps: usize) -> bool {
        self.max_steps.is_some_and(|max| steps >= max)
    }
}
