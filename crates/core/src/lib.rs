//! Core traits and types for the duplex conversation agent
//!
//! This crate provides the foundational types used across all other crates:
//! - Collaborator traits for pluggable backends (recorder, VAD, ASR, TTS,
//!   player, language model)
//! - Audio frame and VAD event types
//! - Dialogue history (ordered messages with tool-call bookkeeping)
//! - LLM streaming types (token deltas, tool-call fragments)
//! - Error types

pub mod audio;
pub mod dialogue;
pub mod error;
pub mod llm_types;
pub mod traits;

pub use audio::{AudioFrame, VadEvent, VadStatus, FRAME_SAMPLES, SAMPLE_RATE_HZ};
pub use dialogue::{Dialogue, Message, ModelMessage, Role, ToolCallRequest};
pub use error::{Error, Result};
pub use llm_types::{
    StreamDelta, TokenStream, ToolCallAccumulator, ToolCallFragment, ToolDefinition,
};
pub use traits::{
    LanguageModel, Player, Recorder, SpeechArtifact, SpeechRecognizer, SpeechSynthesizer,
    VoiceActivityDetector,
};
