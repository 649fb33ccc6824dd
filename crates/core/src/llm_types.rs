//! LLM streaming types
//!
//! A language model turn is a single-pass stream of [`StreamDelta`]s:
//! text tokens, optionally interleaved with incremental tool-call
//! fragments. [`ToolCallAccumulator`] reassembles the fragments into
//! complete [`ToolCallRequest`]s once the stream ends.

use std::pin::Pin;

use futures::Stream;
use serde::{Deserialize, Serialize};

use crate::dialogue::ToolCallRequest;
use crate::error::Result;

/// Tool schema advertised to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON schema for the arguments object.
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }

    /// Project into the OpenAI-compatible `tools` array element.
    pub fn to_wire(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters,
            }
        })
    }
}

/// An incremental tool-call delta from the model stream.
///
/// The first fragment of a call carries `id` and `name`; subsequent
/// fragments append to `arguments`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolCallFragment {
    /// Slot index; models may interleave several calls.
    pub index: usize,
    pub id: Option<String>,
    pub name: Option<String>,
    /// Argument JSON delta (possibly empty).
    pub arguments: String,
}

/// One element of a model stream: a token, a tool-call fragment, or both.
#[derive(Debug, Clone, Default)]
pub struct StreamDelta {
    pub token: Option<String>,
    pub tool_call: Option<ToolCallFragment>,
}

impl StreamDelta {
    pub fn token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            tool_call: None,
        }
    }

    pub fn tool_call(fragment: ToolCallFragment) -> Self {
        Self {
            token: None,
            tool_call: Some(fragment),
        }
    }
}

/// A lazy, single-pass model stream. Not restartable.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<StreamDelta>> + Send>>;

/// Reassembles [`ToolCallFragment`]s into complete requests.
#[derive(Debug, Default)]
pub struct ToolCallAccumulator {
    slots: Vec<ToolCallRequest>,
}

impl ToolCallAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one fragment into its slot.
    pub fn push(&mut self, fragment: ToolCallFragment) {
        while self.slots.len() <= fragment.index {
            self.slots.push(ToolCallRequest {
                id: String::new(),
                name: String::new(),
                arguments: String::new(),
            });
        }
        let slot = &mut self.slots[fragment.index];
        if let Some(id) = fragment.id {
            slot.id = id;
        }
        if let Some(name) = fragment.name {
            slot.name = name;
        }
        slot.arguments.push_str(&fragment.arguments);
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Finish accumulation, dropping slots that never received a name.
    pub fn finish(self) -> Vec<ToolCallRequest> {
        self.slots
            .into_iter()
            .filter(|c| !c.name.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_fragmented_arguments() {
        let mut acc = ToolCallAccumulator::new();
        acc.push(ToolCallFragment {
            index: 0,
            id: Some("call_1".into()),
            name: Some("get_weather".into()),
            arguments: r#"{"ci"#.into(),
        });
        acc.push(ToolCallFragment {
            index: 0,
            id: None,
            name: None,
            arguments: r#"ty":"hangzhou"}"#.into(),
        });

        let calls = acc.finish();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].id, "call_1");
        assert_eq!(calls[0].name, "get_weather");
        assert_eq!(calls[0].arguments, r#"{"city":"hangzhou"}"#);
    }

    #[test]
    fn drops_nameless_slots() {
        let mut acc = ToolCallAccumulator::new();
        acc.push(ToolCallFragment {
            index: 1,
            id: Some("call_2".into()),
            name: Some("lookup".into()),
            arguments: "{}".into(),
        });
        // slot 0 never named
        let calls = acc.finish();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "lookup");
    }

    #[test]
    fn tool_definition_wire_shape() {
        let def = ToolDefinition::new("t", "a tool", serde_json::json!({"type": "object"}));
        let wire = def.to_wire();
        assert_eq!(wire["type"], "function");
        assert_eq!(wire["function"]["name"], "t");
    }
}
