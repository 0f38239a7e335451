//! Append-only conversation history sent back to the model on every call

use super::step::Step;
use crate::llm::{LlmMessage, MessageRole};
use serde::Serialize;

/// Fixed user turn asking the model to continue from where it left off
pub const CONTINUE_INSTRUCTION: &str = "Proceed with next step";

/// Speaker of a transcript turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Model,
}

/// One entry of the transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }

    fn to_message(&self) -> LlmMessage {
        LlmMessage {
            role: match self.role {
                Role::User => MessageRole::User,
                Role::Model => MessageRole::Model,
            },
            text: self.text.clone(),
        }
    }
}

/// Ordered user/model turns
///
/// Turns are only ever appended in user/model pairs, one pair per
/// successful round trip, so the sequence always alternates and starts with
/// the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// The user turn to send next: the raw query on the first call, the
    /// continue instruction afterwards.
    pub fn next_user_turn(&self, query: &str) -> Turn {
        if self.turns.is_empty() {
            Turn::user(query)
        } else {
            Turn::user(CONTINUE_INSTRUCTION)
        }
    }

    /// Full message list for the next request: history plus the next user turn
    pub fn request_messages(&self, query: &str) -> Vec<LlmMessage> {
        let next = self.next_user_turn(query);
        self.turns
            .iter()
            .chain(std::iter::once(&next))
            .map(Turn::to_message)
            .collect()
    }

    /// Record a completed round trip: the user turn that was sent and the
    /// step the model answered with.
    pub fn record_exchange(&mut self, query: &str, step: &Step) {
        let user = self.next_user_turn(query);
        self.turns.push(user);
        self.turns.push(Turn::model(step.to_turn_text()));
    }
}
