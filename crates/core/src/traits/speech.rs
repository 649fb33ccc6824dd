//! Speech recognition and synthesis traits

use std::path::PathBuf;

use async_trait::async_trait;

use crate::audio::AudioFrame;
use crate::error::Result;

/// A playable synthesis result.
///
/// Synthesizer backends render to a file (WAV) and hand the path to the
/// player; `text` is kept for logging and listener callbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechArtifact {
    pub path: PathBuf,
    pub text: String,
}

impl SpeechArtifact {
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }
}

/// Speech-to-text over a complete buffered utterance.
///
/// Implementations:
/// - `HttpRecognizer` - POST the utterance WAV to a sidecar ASR service
/// - test mocks
#[async_trait]
pub trait SpeechRecognizer: Send + Sync + 'static {
    /// Recognize an ordered frame sequence. Whitespace-only results are
    /// treated as "nothing said" by the caller.
    async fn recognize(&self, frames: &[AudioFrame]) -> Result<String>;
}

/// Text-to-speech for one segment.
///
/// Implementations:
/// - `HttpSynthesizer` - POST the text to a sidecar TTS service
/// - test mocks
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync + 'static {
    async fn synthesize(&self, text: &str) -> Result<SpeechArtifact>;
}
