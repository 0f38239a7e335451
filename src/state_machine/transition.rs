//! Pure state transition function
//!
//! Decides, for each step-client outcome, whether the run continues and what
//! the executor must do. No I/O happens here.

use super::{Effect, Event, RunContext, RunState};
use crate::agent::FailureKind;
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: RunState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: RunState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("A step request is already in flight")]
    AgentBusy,
    #[error("Run already finished")]
    RunFinished,
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function
///
/// Given the same inputs it always produces the same outputs. Terminal
/// states are reached only by a final step, a failed request, or the step
/// limit.
pub fn transition(
    state: &RunState,
    context: &RunContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        (RunState::Idle, Event::Start) => Ok(TransitionResult::new(RunState::Requesting {
            step_index: 0,
        })
        .with_effect(Effect::NotifyStateChange)
        .with_effect(Effect::RequestStep)),

        (RunState::Requesting { .. }, Event::Start) => Err(TransitionError::AgentBusy),

        (RunState::Completed { .. } | RunState::Failed { .. }, Event::Start) => {
            Err(TransitionError::RunFinished)
        }

        (RunState::Requesting { step_index }, Event::StepReceived { step }) => {
            let index = *step_index;
            let steps = index + 1;
            let is_final = step.is_final();

            let recorded = [
                Effect::RecordStep { step: step.clone() },
                Effect::NotifyStep { index, step },
            ];

            if is_final {
                return Ok(TransitionResult::new(RunState::Completed { steps })
                    .with_effects(recorded)
                    .with_effect(Effect::NotifyStateChange)
                    .with_effect(Effect::NotifyDone));
            }

            if context.limit_reached(steps) {
                let message = format!("Stopped after {steps} steps without a final result");
                return Ok(TransitionResult::new(RunState::Failed {
                    message: message.clone(),
                    kind: FailureKind::StepLimit,
                    steps,
                })
                .with_effects(recorded)
                .with_effect(Effect::NotifyStateChange)
                .with_effect(Effect::NotifyError { message })
                .with_effect(Effect::NotifyDone));
            }

            Ok(TransitionResult::new(RunState::Requesting { step_index: steps })
                .with_effects(recorded)
                .with_effect(Effect::NotifyStateChange)
                .with_effect(Effect::RequestStep))
        }

        // No step recorded and nothing appended to the transcript
        (RunState::Requesting { step_index }, Event::StepFailed { message, kind }) => {
            Ok(TransitionResult::new(RunState::Failed {
                message: message.clone(),
                kind,
                steps: *step_index,
            })
            .with_effect(Effect::NotifyStateChange)
            .with_effect(Effect::NotifyError { message })
            .with_effect(Effect::NotifyDone))
        }

        (state, event) => Err(TransitionError::InvalidTransition(format!(
            "{} + {}",
            state.name(),
            event.name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Step;

    fn test_context() -> RunContext {
        RunContext::new("test-run", Some(10))
    }

    #[test]
    fn test_start_requests_first_step() {
        let result = transition(&RunState::Idle, &test_context(), Event::Start).unwrap();
        assert_eq!(result.new_state, RunState::Requesting { step_index: 0 });
        assert_eq!(result.effects.last(), Some(&Effect::RequestStep));
    }

    #[test]
    fn test_reject_start_while_busy() {
        let result = transition(
            &RunState::Requesting { step_index: 2 },
            &test_context(),
            Event::Start,
        );
        assert!(matches!(result, Err(TransitionError::AgentBusy)));
    }

    #[test]
    fn test_intermediate_step_continues() {
        let step = Step::new("initialization", "frame");
        let result = transition(
            &RunState::Requesting { step_index: 0 },
            &test_context(),
            Event::StepReceived { step: step.clone() },
        )
        .unwrap();

        assert_eq!(result.new_state, RunState::Requesting { step_index: 1 });
        assert_eq!(
            result.effects,
            vec![
                Effect::RecordStep { step: step.clone() },
                Effect::NotifyStep { index: 0, step },
                Effect::NotifyStateChange,
                Effect::RequestStep,
            ]
        );
    }

    #[test]
    fn test_final_step_completes() {
        let result = transition(
            &RunState::Requesting { step_index: 4 },
            &test_context(),
            Event::StepReceived {
                step: Step::new("final_result", "answer"),
            },
        )
        .unwrap();

        assert_eq!(result.new_state, RunState::Completed { steps: 5 });
        assert!(!result.effects.contains(&Effect::RequestStep));
        assert_eq!(result.effects.last(), Some(&Effect::NotifyDone));
    }

    #[test]
    fn test_failure_records_nothing() {
        let result = transition(
            &RunState::Requesting { step_index: 2 },
            &test_context(),
            Event::StepFailed {
                message: "Failed to connect".to_string(),
                kind: FailureKind::Transport,
            },
        )
        .unwrap();

        assert!(matches!(
            result.new_state,
            RunState::Failed { steps: 2, kind: FailureKind::Transport, .. }
        ));
        assert!(!result
            .effects
            .iter()
            .any(|e| matches!(e, Effect::RecordStep { .. } | Effect::RequestStep)));
        let errors = result
            .effects
            .iter()
            .filter(|e| matches!(e, Effect::NotifyError { .. }))
            .count();
        assert_eq!(errors, 1);
    }

    #[test]
    fn test_step_limit_stops_run() {
        let context = RunContext::new("test-run", Some(3));
        let result = transition(
            &RunState::Requesting { step_index: 2 },
            &context,
            Event::StepReceived {
                step: Step::new("still_going", "..."),
            },
        )
        .unwrap();

        assert!(matches!(
            result.new_state,
            RunState::Failed { steps: 3, kind: FailureKind::StepLimit, .. }
        ));
        // The third step is still kept
        assert!(result
            .effects
            .iter()
            .any(|e| matches!(e, Effect::RecordStep { .. })));
    }

    #[test]
    fn test_final_step_at_limit_completes() {
        let context = RunContext::new("test-run", Some(5));
        let result = transition(
            &RunState::Requesting { step_index: 4 },
            &context,
            Event::StepReceived {
                step: Step::new("final_result", "answer"),
            },
        )
        .unwrap();
        assert_eq!(result.new_state, RunState::Completed { steps: 5 });
    }

    #[test]
    fn test_unbounded_context_never_limits() {
        let context = RunContext::new("test-run", None);
        let result = transition(
            &RunState::Requesting { step_index: 500 },
            &context,
            Event::StepReceived {
                step: Step::new("more", "..."),
            },
        )
        .unwrap();
        assert_eq!(result.new_state, RunState::Requesting { step_index: 501 });
    }

    #[test]
    fn test_finished_run_cannot_restart() {
        let result = transition(
            &RunState::Completed { steps: 5 },
            &test_context(),
            Event::Start,
        );
        assert!(matches!(result, Err(TransitionError::RunFinished)));

        let result = transition(
            &RunState::Idle,
            &test_context(),
            Event::StepReceived {
                step: Step::new("x", "y"),
            },
        );
        assert!(matches!(result, Err(TransitionError::InvalidTransition(_))));
    }
}
