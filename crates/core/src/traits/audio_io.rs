//! Audio capture and playback traits

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::audio::{AudioFrame, VadStatus};
use crate::error::Result;
use crate::traits::SpeechArtifact;

/// Audio capture source.
///
/// Pushes raw frames into the sink channel until stopped. `start` returns
/// once capture is running; frames flow on a background task.
#[async_trait]
pub trait Recorder: Send + Sync + 'static {
    async fn start(&self, sink: mpsc::Sender<AudioFrame>) -> Result<()>;

    /// Stop capture. Idempotent.
    async fn stop(&self);
}

/// Voice-activity detector.
///
/// Classification is a pure function of the frame plus detector-internal
/// state (hangover counters etc.); `reset` clears that state.
pub trait VoiceActivityDetector: Send + Sync + 'static {
    fn classify(&self, frame: &AudioFrame) -> Option<VadStatus>;

    fn reset(&self);
}

/// Audio playback sink.
///
/// Artifacts play in submission order. `stop` flushes anything pending
/// and halts current output; `is_playing` reports whether audio is
/// currently audible or queued.
#[async_trait]
pub trait Player: Send + Sync + 'static {
    async fn play(&self, artifact: SpeechArtifact) -> Result<()>;

    /// Flush pending artifacts and halt current output. Idempotent.
    fn stop(&self);

    fn is_playing(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct ToggleVad {
        speaking: Mutex<bool>,
    }

    impl VoiceActivityDetector for ToggleVad {
        fn classify(&self, frame: &AudioFrame) -> Option<VadStatus> {
            let loud = frame.pcm.iter().any(|b| *b != 0);
            let mut speaking = self.speaking.lock().unwrap();
            match (*speaking, loud) {
                (false, true) => {
                    *speaking = true;
                    Some(VadStatus::Start)
                }
                (true, false) => {
                    *speaking = false;
                    Some(VadStatus::End)
                }
                _ => None,
            }
        }

        fn reset(&self) {
            *self.speaking.lock().unwrap() = false;
        }
    }

    #[test]
    fn toggle_vad_emits_boundaries() {
        let vad = Arc::new(ToggleVad {
            speaking: Mutex::new(false),
        });
        let quiet = AudioFrame::new(vec![0u8; 4], 0);
        let loud = AudioFrame::new(vec![1u8; 4], 1);

        assert_eq!(vad.classify(&quiet), None);
        assert_eq!(vad.classify(&loud), Some(VadStatus::Start));
        assert_eq!(vad.classify(&loud), None);
        assert_eq!(vad.classify(&quiet), Some(VadStatus::End));
    }
}
