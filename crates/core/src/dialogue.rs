//! Ordered conversation history
//!
//! A [`Dialogue`] is an append-only sequence of [`Message`]s, seeded with
//! the system prompt. It is owned by the orchestrator for the lifetime of
//! one conversation session; appends are strictly ordered by the single
//! thread of control driving a turn, never reordered or deleted.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;

/// Message role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

/// A fully-assembled tool call recorded on an assistant message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Call id, referenced by the matching `role=tool` message.
    pub id: String,
    /// Registered tool name.
    pub name: String,
    /// Raw JSON argument string as produced by the model.
    pub arguments: String,
}

impl ToolCallRequest {
    /// Project into the OpenAI-compatible wire shape.
    pub fn to_wire(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id,
            "type": "function",
            "function": {
                "name": self.name,
                "arguments": self.arguments,
            }
        })
    }
}

/// One entry in the dialogue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub role: Role,
    /// Text content. Usually `None` when `tool_calls` is set.
    pub content: Option<String>,
    /// Tool calls issued by an assistant message.
    pub tool_calls: Option<Vec<ToolCallRequest>>,
    /// For `role = tool`: the assistant tool call this result answers.
    pub tool_call_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    fn new(role: Role, content: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content,
            tool_calls: None,
            tool_call_id: None,
            created_at: Utc::now(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, Some(content.into()))
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, Some(content.into()))
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, Some(content.into()))
    }

    /// An assistant message carrying tool calls and no spoken content.
    pub fn assistant_tool_calls(calls: Vec<ToolCallRequest>) -> Self {
        let mut msg = Self::new(Role::Assistant, None);
        msg.tool_calls = Some(calls);
        msg
    }

    /// A tool result answering `tool_call_id`.
    pub fn tool(content: impl Into<String>, tool_call_id: impl Into<String>) -> Self {
        let mut msg = Self::new(Role::Tool, Some(content.into()));
        msg.tool_call_id = Some(tool_call_id.into());
        msg
    }
}

/// The minimal projection of a [`Message`] a language model consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMessage {
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

/// Ordered conversation history.
#[derive(Debug)]
pub struct Dialogue {
    messages: Vec<Message>,
    history_path: Option<PathBuf>,
    started_at: DateTime<Utc>,
}

impl Dialogue {
    /// Create a dialogue seeded with the system prompt.
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system_prompt)],
            history_path: None,
            started_at: Utc::now(),
        }
    }

    /// Enable on-disk turn persistence under `path`.
    pub fn with_history_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.history_path = Some(path.into());
        self
    }

    /// Append a message. Order is insertion order; nothing is validated
    /// beyond what the constructors already guarantee.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Project the history into what the language model consumes,
    /// preserving order. Assistant tool-call messages keep only their
    /// calls; tool results keep their call id.
    pub fn model_view(&self) -> Vec<ModelMessage> {
        self.messages
            .iter()
            .map(|m| {
                if let Some(calls) = &m.tool_calls {
                    ModelMessage {
                        role: m.role,
                        content: None,
                        tool_calls: Some(calls.iter().map(ToolCallRequest::to_wire).collect()),
                        tool_call_id: None,
                    }
                } else if m.role == Role::Tool {
                    ModelMessage {
                        role: m.role,
                        content: m.content.clone(),
                        tool_calls: None,
                        tool_call_id: m.tool_call_id.clone(),
                    }
                } else {
                    ModelMessage {
                        role: m.role,
                        content: m.content.clone(),
                        tool_calls: None,
                        tool_call_id: None,
                    }
                }
            })
            .collect()
    }

    /// Persist the user/assistant exchanges to the history directory,
    /// one JSON file per session. No-op when no path is configured.
    pub fn persist_turn(&self) -> Result<()> {
        let Some(dir) = &self.history_path else {
            return Ok(());
        };
        let exchanges: Vec<_> = self
            .model_view()
            .into_iter()
            .filter(|m| matches!(m.role, Role::User | Role::Assistant) && m.content.is_some())
            .collect();
        std::fs::create_dir_all(dir)?;
        let file = dir.join(format!(
            "dialogue-{}.json",
            self.started_at.format("%Y-%m-%d_%H-%M-%S")
        ));
        let json = serde_json::to_string_pretty(&exchanges)?;
        std::fs::write(file, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeds_system_message() {
        let d = Dialogue::new("be brief");
        assert_eq!(d.len(), 1);
        assert_eq!(d.messages()[0].role, Role::System);
        assert_eq!(d.messages()[0].content.as_deref(), Some("be brief"));
    }

    #[test]
    fn model_view_projects_tool_calls() {
        let mut d = Dialogue::new("sys");
        d.push(Message::user("weather in hangzhou?"));
        d.push(Message::assistant_tool_calls(vec![ToolCallRequest {
            id: "call_1".into(),
            name: "get_weather".into(),
            arguments: r#"{"city":"zhejiang/hangzhou"}"#.into(),
        }]));
        d.push(Message::tool("light rain", "call_1"));
        d.push(Message::assistant("It is raining lightly."));

        let view = d.model_view();
        assert_eq!(view.len(), 5);
        assert!(view[2].tool_calls.is_some());
        assert!(view[2].content.is_none());
        assert_eq!(view[3].tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(view[3].content.as_deref(), Some("light rain"));
    }

    #[test]
    fn persist_writes_user_assistant_only() {
        let dir = tempfile::tempdir().unwrap();
        let mut d = Dialogue::new("sys").with_history_path(dir.path());
        d.push(Message::user("hi"));
        d.push(Message::assistant_tool_calls(vec![ToolCallRequest {
            id: "c".into(),
            name: "t".into(),
            arguments: "{}".into(),
        }]));
        d.push(Message::assistant("hello"));
        d.persist_turn().unwrap();

        let entry = std::fs::read_dir(dir.path()).unwrap().next().unwrap().unwrap();
        let text = std::fs::read_to_string(entry.path()).unwrap();
        let parsed: Vec<serde_json::Value> = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0]["role"], "user");
        assert_eq!(parsed[1]["role"], "assistant");
    }

    #[test]
    fn persist_without_path_is_noop() {
        let d = Dialogue::new("sys");
        d.persist_turn().unwrap();
    }
}
