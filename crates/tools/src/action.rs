//! Tool outcome classification.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What the orchestrator should do with a tool's outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    /// Tool name unknown. Abort the turn, no speech.
    NotFound,
    /// Fire-and-forget, nothing to say.
    None,
    /// Speak `response` directly, no further model call.
    Response,
    /// Append the tool result to the dialogue and re-query the model.
    ReqLlm,
    /// Inject a message into the dialogue, no speech.
    AddSystem,
    /// Inject message(s), speak `response`, then re-enter the model loop.
    AddSystemSpeak,
}

/// Scheduling policy attached to each registered tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ToolType {
    /// Background execution, result ignored.
    None,
    /// Synchronous, caller blocks on the result.
    Wait,
    /// Synchronous time-based side effect.
    Scheduler,
    /// Background execution; acknowledge now, deliver the result later
    /// when the conversation is idle.
    TimeConsuming,
    /// Synchronous, mutates the dialogue only.
    AddSysPrompt,
}

/// Outcome of one tool invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResponse {
    pub action: Action,
    /// Data handed back to the model (REQLLM) or injected into the
    /// dialogue (ADDSYSTEM variants).
    pub result: Option<Value>,
    /// Text to speak directly.
    pub response: Option<String>,
}

impl ActionResponse {
    pub fn not_found() -> Self {
        Self {
            action: Action::NotFound,
            result: None,
            response: None,
        }
    }

    pub fn none() -> Self {
        Self {
            action: Action::None,
            result: None,
            response: None,
        }
    }

    pub fn response(text: impl Into<String>) -> Self {
        Self {
            action: Action::Response,
            result: None,
            response: Some(text.into()),
        }
    }

    pub fn req_llm(result: Value) -> Self {
        Self {
            action: Action::ReqLlm,
            result: Some(result),
            response: None,
        }
    }

    pub fn add_system(result: Value) -> Self {
        Self {
            action: Action::AddSystem,
            result: Some(result),
            response: None,
        }
    }

    pub fn add_system_speak(result: Value, response: impl Into<String>) -> Self {
        Self {
            action: Action::AddSystemSpeak,
            result: Some(result),
            response: Some(response.into()),
        }
    }

    /// Best text rendering of this outcome, for speaking a background
    /// result once the conversation goes idle.
    pub fn speakable_text(&self) -> Option<String> {
        if let Some(text) = &self.response {
            return Some(text.clone());
        }
        match &self.result {
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn action_serializes_screaming_snake() {
        assert_eq!(
            serde_json::to_string(&Action::ReqLlm).unwrap(),
            "\"REQ_LLM\""
        );
        assert_eq!(
            serde_json::to_string(&ToolType::TimeConsuming).unwrap(),
            "\"TIME_CONSUMING\""
        );
    }

    #[test]
    fn speakable_text_prefers_response() {
        let r = ActionResponse::add_system_speak(json!({"k": 1}), "spoken");
        assert_eq!(r.speakable_text().as_deref(), Some("spoken"));

        let r = ActionResponse::req_llm(json!("rainy then clear"));
        assert_eq!(r.speakable_text().as_deref(), Some("rainy then clear"));

        assert_eq!(ActionResponse::none().speakable_text(), None);
    }
}
