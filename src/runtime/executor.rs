//! Conversation driver: executes the effects of the run state machine

use super::traits::StepSource;
use super::{RunHub, SseEvent};
use crate::agent::{Step, Transcript};
use crate::state_machine::{transition, Effect, Event, RunContext, RunState, TransitionError};
use serde::Serialize;

/// Everything one run accumulates, owned by whoever started it
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub query: String,
    pub transcript: Transcript,
    pub steps: Vec<Step>,
}

impl Session {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            transcript: Transcript::new(),
            steps: Vec::new(),
        }
    }

    /// Append a step to the visible output and its exchange to the transcript
    fn record(&mut self, step: Step) {
        self.transcript.record_exchange(&self.query, &step);
        self.steps.push(step);
    }
}

/// Final result of a run
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub session: Session,
    pub state: RunState,
}

/// Drives one run: requests steps one at a time until the state machine
/// reaches a terminal state.
pub struct ConversationDriver<S>
where
    S: StepSource,
{
    context: RunContext,
    state: RunState,
    session: Session,
    source: S,
    hub: RunHub,
}

impl<S> ConversationDriver<S>
where
    S: StepSource,
{
    pub fn new(context: RunContext, session: Session, source: S, hub: RunHub) -> Self {
        Self {
            context,
            state: RunState::Idle,
            session,
            source,
            hub,
        }
    }

    pub async fn run(mut self) -> RunOutcome {
        tracing::info!(run_id = %self.context.run_id, "Starting reasoning run");

        if let Err(e) = self.process_event(Event::Start).await {
            tracing::error!(run_id = %self.context.run_id, error = %e, "Run aborted");
            self.hub
                .publish(SseEvent::Error {
                    run_id: self.context.run_id.clone(),
                    message: e.to_string(),
                })
                .await;
        }

        tracing::info!(
            run_id = %self.context.run_id,
            state = self.state.name(),
            steps = self.session.steps.len(),
            "Reasoning run finished"
        );

        RunOutcome {
            session: self.session,
            state: self.state,
        }
    }

    async fn process_event(&mut self, event: Event) -> Result<(), TransitionError> {
        // Effects can generate follow-up events; loop instead of recursing
        let mut events_to_process = vec![event];

        while let Some(current_event) = events_to_process.pop() {
            let result = transition(&self.state, &self.context, current_event)?;
            self.state = result.new_state;

            for effect in result.effects {
                if let Some(generated_event) = self.execute_effect(effect).await {
                    events_to_process.push(generated_event);
                }
            }
        }

        Ok(())
    }

    async fn execute_effect(&mut self, effect: Effect) -> Option<Event> {
        let run_id = self.context.run_id.clone();
        match effect {
            Effect::RequestStep => Some(self.request_step().await),
            Effect::RecordStep { step } => {
                self.session.record(step);
                None
            }
            Effect::NotifyStep { index, step } => {
                self.hub.publish(SseEvent::Step { run_id, index, step }).await;
                None
            }
            Effect::NotifyStateChange => {
                let state = self.state.clone();
                self.hub.publish(SseEvent::StateChange { run_id, state }).await;
                None
            }
            Effect::NotifyError { message } => {
                self.hub.publish(SseEvent::Error { run_id, message }).await;
                None
            }
            Effect::NotifyDone => {
                let state = self.state.clone();
                let steps = self.session.steps.len();
                self.hub.publish(SseEvent::RunDone { run_id, state, steps }).await;
                None
            }
        }
    }

    async fn request_step(&self) -> Event {
        let step_index = match self.state {
            RunState::Requesting { step_index } => step_index,
            _ => self.session.steps.len(),
        };

        match self
            .source
            .next_step(&self.session.query, &self.session.transcript)
            .await
        {
            Ok(step) => {
                tracing::debug!(
                    run_id = %self.context.run_id,
                    step_index,
                    step = %step.name,
                    "Step received"
                );
                if step_index == 0 && !step.is_initial() {
                    tracing::warn!(
                        run_id = %self.context.run_id,
                        step = %step.name,
                        "First step is not named initialization"
                    );
                }
                Event::StepReceived { step }
            }
            Err(e) => {
                tracing::warn!(
                    run_id = %self.context.run_id,
                    step_index,
                    error = %e,
                    "Step request failed"
                );
                Event::StepFailed {
                    message: e.user_message(),
                    kind: e.kind(),
                }
            }
        }
    }
}
