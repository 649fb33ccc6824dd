//! Explicit tool registry.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use duplex_core::ToolDefinition;

use crate::{ActionResponse, ToolError, ToolType};

/// A callable the model may invoke by name.
#[async_trait]
pub trait Tool: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON Schema of the arguments object.
    fn parameters(&self) -> Value;

    fn tool_type(&self) -> ToolType;

    async fn call(&self, args: Value) -> Result<ActionResponse, ToolError>;
}

/// Name-keyed tool collection, built once at startup and shared by
/// reference. No global registration.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        debug!(tool = tool.name(), tool_type = ?tool.tool_type(), "registered tool");
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Wire-format schemas for every registered tool, for the model's
    /// `tools` parameter.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> = self
            .tools
            .values()
            .map(|t| ToolDefinition::new(t.name(), t.description(), t.parameters()))
            .collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// Validate a parsed arguments object against the tool's schema.
    pub fn validate_args(&self, tool: &dyn Tool, args: &Value) -> Result<(), ToolError> {
        let schema = tool.parameters();
        let compiled = jsonschema::JSONSchema::compile(&schema).map_err(|e| {
            ToolError::InvalidArguments {
                tool: tool.name().to_string(),
                message: format!("bad schema: {e}"),
            }
        })?;
        if let Err(errors) = compiled.validate(args) {
            let message = errors
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(ToolError::InvalidArguments {
                tool: tool.name().to_string(),
                message,
            });
        }
        Ok(())
    }
}
