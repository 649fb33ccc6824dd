//! WAV artifact player.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use duplex_core::{Player, Result, SpeechArtifact};

use crate::PipelineError;

/// Granularity at which an in-progress artifact notices `stop`.
const STOP_POLL: Duration = Duration::from_millis(20);

/// Plays WAV artifacts for their real duration, pacing playback so that
/// `is_playing` reflects when audio would be audible. Output goes to
/// whatever device consumes the artifact files (or nothing, in tests
/// and headless runs); the pacing is what the duplex loop observes.
pub struct WavQueuePlayer {
    playing: AtomicBool,
    stop_epoch: AtomicU64,
}

impl WavQueuePlayer {
    pub fn new() -> Self {
        Self {
            playing: AtomicBool::new(false),
            stop_epoch: AtomicU64::new(0),
        }
    }

    fn artifact_duration(artifact: &SpeechArtifact) -> Result<Duration> {
        let reader = hound::WavReader::open(&artifact.path).map_err(PipelineError::Wav)?;
        let spec = reader.spec();
        let samples = reader.len() as u64 / spec.channels as u64;
        Ok(Duration::from_millis(
            samples * 1_000 / spec.sample_rate as u64,
        ))
    }
}

impl Default for WavQueuePlayer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Player for WavQueuePlayer {
    async fn play(&self, artifact: SpeechArtifact) -> Result<()> {
        let duration = Self::artifact_duration(&artifact)?;
        let epoch = self.stop_epoch.load(Ordering::SeqCst);
        debug!(
            path = %artifact.path.display(),
            duration_ms = duration.as_millis() as u64,
            text = %artifact.text,
            "playing segment"
        );

        self.playing.store(true, Ordering::SeqCst);
        let mut remaining = duration;
        while !remaining.is_zero() {
            if self.stop_epoch.load(Ordering::SeqCst) != epoch {
                warn!(path = %artifact.path.display(), "playback halted");
                break;
            }
            let step = remaining.min(STOP_POLL);
            tokio::time::sleep(step).await;
            remaining -= step;
        }
        self.playing.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&self) {
        self.stop_epoch.fetch_add(1, Ordering::SeqCst);
        self.playing.store(false, Ordering::SeqCst);
    }

    fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }
}
