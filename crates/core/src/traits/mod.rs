//! Collaborator contracts
//!
//! Every external stage the orchestrator coordinates is behind one of
//! these traits, enabling:
//! - Pluggable backends (swap implementations without code changes)
//! - Testing with mocks
//! - Runtime selection based on configuration
//!
//! ```text
//! Audio I/O:
//!   - Recorder: pushes raw PCM frames into a capture channel
//!   - VoiceActivityDetector: classifies a frame as start/end
//!   - Player: plays artifacts in submission order, stoppable
//!
//! Speech:
//!   - SpeechRecognizer: buffered utterance -> text
//!   - SpeechSynthesizer: text segment -> playable artifact
//!
//! Language model:
//!   - LanguageModel: dialogue view -> lazy token/tool-call stream
//! ```

mod audio_io;
mod llm;
mod speech;

pub use audio_io::{Player, Recorder, VoiceActivityDetector};
pub use llm::LanguageModel;
pub use speech::{SpeechArtifact, SpeechRecognizer, SpeechSynthesizer};
