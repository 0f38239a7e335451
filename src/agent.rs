//! Stepwise reasoning agent
//!
//! The step client and the data it exchanges with the model: steps, the
//! transcript, and the failures a step request can end in.

mod client;
mod error;
mod step;
mod transcript;

pub use client::StepClient;
pub use error::{FailureKind, StepError};
pub use step::{parse_step, Step, FINAL_STEP, INITIAL_STEP};
pub use transcript::{Transcript, CONTINUE_INSTRUCTION};
