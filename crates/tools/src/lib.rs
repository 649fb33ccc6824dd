//! Tool registry and dispatch.
//!
//! Tools are registered explicitly at startup into a [`ToolRegistry`];
//! the [`ToolDispatcher`] executes a resolved tool call under its
//! scheduling policy ([`ToolType`]) and classifies the outcome into an
//! [`ActionResponse`] the orchestrator acts on. Background results
//! are parked on an idle-result queue until the conversation quiets
//! down.

pub mod action;
pub mod builtin;
pub mod dispatcher;
pub mod registry;

pub use action::{Action, ActionResponse, ToolType};
pub use builtin::DayOfWeekTool;
pub use dispatcher::{IdleResult, ToolDispatcher};
pub use registry::{Tool, ToolRegistry};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    Unknown(String),

    #[error("invalid arguments for {tool}: {message}")]
    InvalidArguments { tool: String, message: String },

    #[error("tool {tool} failed: {message}")]
    Execution { tool: String, message: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl From<ToolError> for duplex_core::Error {
    fn from(e: ToolError) -> Self {
        duplex_core::Error::Tool(e.to_string())
    }
}
