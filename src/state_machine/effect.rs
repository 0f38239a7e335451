//! Effects produced by state transitions

use crate::agent::Step;

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Ask the step client for the next step
    RequestStep,

    /// Append the step to the session: collected steps and transcript
    RecordStep { step: Step },

    /// Notify connected clients of a new step
    NotifyStep { index: usize, step: Step },

    /// Notify connected clients of the new state
    NotifyStateChange,

    /// Write the message to the error slot and notify clients
    NotifyError { message: String },

    /// The run is over
    NotifyDone,
}
