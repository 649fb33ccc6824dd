//! Amplitude-threshold voice activity detection with hangover.

use parking_lot::Mutex;

use duplex_core::{AudioFrame, VadStatus, VoiceActivityDetector};

#[derive(Default)]
struct VadState {
    in_speech: bool,
    speech_run: usize,
    silence_run: usize,
}

/// Energy-based detector over s16le frames. A frame is "speech" when
/// its mean absolute amplitude exceeds the threshold; `start`/`end`
/// fire only after a run of consecutive frames, which filters clicks
/// and short pauses.
pub struct EnergyVad {
    amplitude_threshold: f32,
    start_frames: usize,
    end_frames: usize,
    state: Mutex<VadState>,
}

impl EnergyVad {
    pub fn new(amplitude_threshold: f32, start_frames: usize, end_frames: usize) -> Self {
        Self {
            amplitude_threshold,
            start_frames: start_frames.max(1),
            end_frames: end_frames.max(1),
            state: Mutex::new(VadState::default()),
        }
    }

    fn is_speech(&self, frame: &AudioFrame) -> bool {
        let samples = frame.pcm.chunks_exact(2);
        let count = samples.len().max(1);
        let sum: f64 = samples
            .map(|b| (i16::from_le_bytes([b[0], b[1]]) as f64).abs())
            .sum();
        (sum / count as f64) as f32 > self.amplitude_threshold
    }
}

impl VoiceActivityDetector for EnergyVad {
    fn classify(&self, frame: &AudioFrame) -> Option<VadStatus> {
        let speech = self.is_speech(frame);
        let mut state = self.state.lock();

        if state.in_speech {
            if speech {
                state.silence_run = 0;
                None
            } else {
                state.silence_run += 1;
                if state.silence_run >= self.end_frames {
                    state.in_speech = false;
                    state.silence_run = 0;
                    state.speech_run = 0;
                    Some(VadStatus::End)
                } else {
                    None
                }
            }
        } else if speech {
            state.speech_run += 1;
            if state.speech_run >= self.start_frames {
                state.in_speech = true;
                state.speech_run = 0;
                state.silence_run = 0;
                Some(VadStatus::Start)
            } else {
                None
            }
        } else {
            state.speech_run = 0;
            None
        }
    }

    fn reset(&self) {
        *self.state.lock() = VadState::default();
    }
}
