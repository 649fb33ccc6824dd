//! Audio frame and VAD event types
//!
//! Frames are opaque PCM byte buffers; the agent never inspects samples
//! beyond handing them to the VAD and recognizer collaborators. The fixed
//! framing (16 kHz mono s16le, 512 samples per frame) matches what the
//! capture and VAD backends expect.

use serde::{Deserialize, Serialize};

/// Capture sample rate in Hz.
pub const SAMPLE_RATE_HZ: u32 = 16_000;

/// Samples per capture frame (32 ms at 16 kHz).
pub const FRAME_SAMPLES: usize = 512;

/// A single raw PCM frame from the capture stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFrame {
    /// Raw PCM bytes (s16le).
    pub pcm: Vec<u8>,
    /// Monotonic capture sequence number.
    pub sequence: u64,
}

impl AudioFrame {
    pub fn new(pcm: Vec<u8>, sequence: u64) -> Self {
        Self { pcm, sequence }
    }

    /// Frame duration derived from the fixed sample format.
    pub fn duration_ms(&self) -> u64 {
        let samples = (self.pcm.len() / 2) as u64;
        samples * 1000 / SAMPLE_RATE_HZ as u64
    }

    pub fn is_empty(&self) -> bool {
        self.pcm.is_empty()
    }
}

/// Voice-activity classification boundary for a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VadStatus {
    /// Speech started at this frame.
    Start,
    /// Speech ended at this frame.
    End,
}

/// A frame paired with its VAD classification.
///
/// Produced by the VAD stage, consumed exactly once by the duplex loop.
/// `status == None` means the frame carries no boundary (silence, or
/// mid-utterance speech).
#[derive(Debug, Clone)]
pub struct VadEvent {
    pub frame: AudioFrame,
    pub status: Option<VadStatus>,
}

impl VadEvent {
    pub fn new(frame: AudioFrame, status: Option<VadStatus>) -> Self {
        Self { frame, status }
    }

    pub fn is_start(&self) -> bool {
        self.status == Some(VadStatus::Start)
    }

    pub fn is_end(&self) -> bool {
        self.status == Some(VadStatus::End)
    }
}
