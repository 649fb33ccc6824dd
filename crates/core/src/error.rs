//! Error types shared across the workspace

use thiserror::Error;

/// Core error type
///
/// Each pipeline stage converts its internal failures into one of these
/// variants at the stage boundary. Stage errors are logged and the stage
/// continues; they never cross a queue boundary (see the orchestrator).
#[derive(Error, Debug)]
pub enum Error {
    #[error("audio capture error: {0}")]
    Capture(String),

    #[error("voice activity detection error: {0}")]
    Vad(String),

    #[error("speech recognition error: {0}")]
    Recognition(String),

    #[error("speech synthesis error: {0}")]
    Synthesis(String),

    #[error("language model error: {0}")]
    Model(String),

    #[error("playback error: {0}")]
    Playback(String),

    #[error("tool error: {0}")]
    Tool(String),

    /// A stage's queue counterpart went away. Usually means shutdown.
    #[error("channel closed: {0}")]
    ChannelClosed(&'static str),

    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
