//! Capture-to-VAD wiring.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use duplex_core::{AudioFrame, Recorder, Result, VadEvent, VoiceActivityDetector};

/// Channel depth between capture and classification. At 32ms per frame
/// this buffers about two seconds of audio.
const FRAME_CHANNEL_CAPACITY: usize = 64;

/// Start the recorder and spawn the classification stage. Returns the
/// event channel the duplex loop consumes plus the stage handle; events
/// arrive in capture order. The stage exits when the recorder closes
/// its frame channel or the event receiver is dropped.
pub async fn spawn_capture(
    recorder: Arc<dyn Recorder>,
    vad: Arc<dyn VoiceActivityDetector>,
    event_capacity: usize,
) -> Result<(mpsc::Receiver<VadEvent>, JoinHandle<()>)> {
    let (frame_tx, frame_rx) = mpsc::channel::<AudioFrame>(FRAME_CHANNEL_CAPACITY);
    recorder.start(frame_tx).await?;

    let (event_tx, event_rx) = mpsc::channel::<VadEvent>(event_capacity);
    let handle = tokio::spawn(classify_frames(vad, frame_rx, event_tx));
    Ok((event_rx, handle))
}

async fn classify_frames(
    vad: Arc<dyn VoiceActivityDetector>,
    mut frames: mpsc::Receiver<AudioFrame>,
    events: mpsc::Sender<VadEvent>,
) {
    while let Some(frame) = frames.recv().await {
        let status = vad.classify(&frame);
        if let Some(status) = &status {
            debug!(?status, sequence = frame.sequence, "vad boundary");
        }
        if events.send(VadEvent { frame, status }).await.is_err() {
            warn!("vad event receiver dropped, stopping classification");
            break;
        }
    }
    vad.reset();
}
