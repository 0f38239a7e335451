//! Reasoning steps and the model-output parser

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Name the model is told to give the first step
pub const INITIAL_STEP: &str = "initialization";

/// Name of the terminal step; seeing it ends a run
pub const FINAL_STEP: &str = "final_result";

/// Matches a response wrapped in a Markdown code fence, with or without a
/// language tag, capturing the inner text.
static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\A\s*```[A-Za-z0-9_-]*\s*(.*?)\s*```\s*\z").expect("valid fence pattern")
});

/// One named unit of reasoning returned by the model
///
/// Serializes as `{"step": <name>, "content": <text>}`, the same shape the
/// model is asked to produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    #[serde(rename = "step")]
    pub name: String,
    pub content: String,
}

impl Step {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    pub fn is_final(&self) -> bool {
        self.name == FINAL_STEP
    }

    pub fn is_initial(&self) -> bool {
        self.name == INITIAL_STEP
    }

    /// JSON form used as the model turn in the transcript
    pub fn to_turn_text(&self) -> String {
        serde_json::json!({ "step": self.name, "content": self.content }).to_string()
    }
}

/// Remove a surrounding code fence, if any, and trim whitespace
pub fn strip_code_fence(raw: &str) -> &str {
    CODE_FENCE
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map_or_else(|| raw.trim(), |inner| inner.as_str().trim())
}

/// Parse model output into a step
pub fn parse_step(raw: &str) -> Result<Step, serde_json::Error> {
    serde_json::from_str(strip_code_fence(raw))
}
