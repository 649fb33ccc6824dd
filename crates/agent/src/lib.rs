//! Duplex conversation orchestration.
//!
//! The [`DuplexOrchestrator`] binds capture, voice-activity detection,
//! recognition, the language model, tool dispatch and ordered speech
//! playback into one full-duplex loop: the agent can hear the user
//! start talking while it is still speaking, and yields the floor.

pub mod orchestrator;

pub use orchestrator::{Collaborators, DuplexOrchestrator, OrchestratorConfig, TurnListener};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error(transparent)]
    Core(#[from] duplex_core::Error),

    #[error(transparent)]
    Pipeline(#[from] duplex_pipeline::PipelineError),

    #[error(transparent)]
    Tool(#[from] duplex_tools::ToolError),
}
