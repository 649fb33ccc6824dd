//! Audio pipeline stages: capture, voice-activity detection, text
//! segmentation and ordered speech playback.
//!
//! Each stage is a separate task; stages talk only over channels. The
//! [`SpeechPipeline`] owns the ordered-playback discipline: segments
//! are synthesized concurrently but always played in the order they
//! were produced.

pub mod backends;
pub mod capture;
pub mod playback;
pub mod segment;
pub mod vad;

pub use capture::spawn_capture;
pub use playback::SpeechPipeline;
pub use segment::SegmentBuffer;
pub use vad::EnergyVad;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend returned status {status}: {body}")]
    Backend { status: u16, body: String },

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<PipelineError> for duplex_core::Error {
    fn from(e: PipelineError) -> Self {
        match e {
            PipelineError::Wav(err) => duplex_core::Error::Playback(err.to_string()),
            PipelineError::Io(err) => duplex_core::Error::Io(err),
            other => duplex_core::Error::Synthesis(other.to_string()),
        }
    }
}
