//! Property-based tests for the state machine
//!
//! Drive the pure transition function with scripted step-client outcomes
//! and check the loop's termination rules hold for every script.

use super::*;
use crate::agent::{FailureKind, Step, FINAL_STEP};
use proptest::prelude::*;

// ============================================================================
// Test Helpers
// ============================================================================

/// What the step client does on one call
#[derive(Debug, Clone)]
enum Outcome {
    Step(Step),
    Fail(FailureKind),
}

/// Tally of a simulated run
#[derive(Debug, Default)]
struct Simulation {
    final_state: RunState,
    requests: usize,
    recorded: Vec<Step>,
    errors: usize,
    done: usize,
}

/// Run the machine to completion, answering each `RequestStep` with the next
/// scripted outcome. Panics if the machine asks for more than the script has.
fn simulate(context: &RunContext, script: &[Outcome]) -> Simulation {
    let mut sim = Simulation::default();
    let mut state = RunState::Idle;
    let mut pending = vec![Event::Start];

    while let Some(event) = pending.pop() {
        let result = transition(&state, context, event).expect("valid transition");
        state = result.new_state;

        for effect in result.effects {
            match effect {
                Effect::RequestStep => {
                    let outcome = script
                        .get(sim.requests)
                        .cloned()
                        .expect("machine requested past the script");
                    sim.requests += 1;
                    pending.push(match outcome {
                        Outcome::Step(step) => Event::StepReceived { step },
                        Outcome::Fail(kind) => Event::StepFailed {
                            message: format!("{kind:?}"),
                            kind,
                        },
                    });
                }
                Effect::RecordStep { step } => sim.recorded.push(step),
                Effect::NotifyError { .. } => sim.errors += 1,
                Effect::NotifyDone => sim.done += 1,
                Effect::NotifyStep { .. } | Effect::NotifyStateChange => {}
            }
        }
    }

    sim.final_state = state;
    sim
}

/// Position of the first outcome that ends the run
fn first_stop(context: &RunContext, script: &[Outcome]) -> Option<usize> {
    script.iter().enumerate().position(|(i, outcome)| match outcome {
        Outcome::Step(step) => step.is_final() || context.limit_reached(i + 1),
        Outcome::Fail(_) => true,
    })
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        8 => ("[a-z_]{1,16}", "[a-zA-Z0-9 ]{0,40}").prop_map(|(name, content)| Step::new(name, content)),
        1 => "[a-zA-Z0-9 ]{0,40}".prop_map(|content| Step::new(FINAL_STEP, content)),
    ]
}

fn arb_failure_kind() -> impl Strategy<Value = FailureKind> {
    prop_oneof![
        Just(FailureKind::MissingCredential),
        Just(FailureKind::Transport),
        Just(FailureKind::MalformedResponse),
    ]
}

fn arb_outcome() -> impl Strategy<Value = Outcome> {
    prop_oneof![
        6 => arb_step().prop_map(Outcome::Step),
        1 => arb_failure_kind().prop_map(Outcome::Fail),
    ]
}

/// Scripts that always end: the last outcome is terminal
fn arb_script() -> impl Strategy<Value = Vec<Outcome>> {
    (
        prop::collection::vec(arb_outcome(), 0..12),
        prop_oneof![
            "[a-z ]{0,20}".prop_map(|c| Outcome::Step(Step::new(FINAL_STEP, c))),
            arb_failure_kind().prop_map(Outcome::Fail),
        ],
    )
        .prop_map(|(mut script, last)| {
            script.push(last);
            script
        })
}

fn arb_max_steps() -> impl Strategy<Value = Option<usize>> {
    prop_oneof![Just(None), (1usize..8).prop_map(Some)]
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// The run stops at the first final step, failure, or limit, and never
    /// asks the client again afterwards.
    #[test]
    fn stops_exactly_at_first_terminal_outcome(
        script in arb_script(),
        max_steps in arb_max_steps(),
    ) {
        let context = RunContext::new("prop-run", max_steps);
        let sim = simulate(&context, &script);
        let stop = first_stop(&context, &script).expect("script ends in a terminal outcome");

        prop_assert_eq!(sim.requests, stop + 1);
        prop_assert!(sim.final_state.is_terminal());
        prop_assert_eq!(sim.done, 1);
    }

    /// Recorded steps are exactly the successful outcomes up to the stop,
    /// in order.
    #[test]
    fn records_successful_steps_in_order(
        script in arb_script(),
        max_steps in arb_max_steps(),
    ) {
        let context = RunContext::new("prop-run", max_steps);
        let sim = simulate(&context, &script);
        let stop = first_stop(&context, &script).expect("script ends in a terminal outcome");

        let expected: Vec<Step> = script[..=stop]
            .iter()
            .filter_map(|o| match o {
                Outcome::Step(s) => Some(s.clone()),
                Outcome::Fail(_) => None,
            })
            .collect();
        prop_assert_eq!(&sim.recorded, &expected);

        if let Some(max) = max_steps {
            prop_assert!(sim.recorded.len() <= max);
        }
    }

    /// Completed iff the last recorded step is final; otherwise exactly one
    /// error is reported.
    #[test]
    fn completion_and_error_reporting_agree(
        script in arb_script(),
        max_steps in arb_max_steps(),
    ) {
        let context = RunContext::new("prop-run", max_steps);
        let sim = simulate(&context, &script);

        match &sim.final_state {
            RunState::Completed { steps } => {
                prop_assert_eq!(*steps, sim.recorded.len());
                prop_assert!(sim.recorded.last().is_some_and(Step::is_final));
                prop_assert_eq!(sim.errors, 0);
            }
            RunState::Failed { steps, .. } => {
                prop_assert_eq!(*steps, sim.recorded.len());
                prop_assert_eq!(sim.errors, 1);
            }
            other => prop_assert!(false, "non-terminal final state {:?}", other),
        }
    }
}
