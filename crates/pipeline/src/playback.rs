//! Ordered synthesis and playback of text segments.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, Notify};
use tokio::time::timeout;
use tracing::{debug, warn};

use duplex_core::{Player, Result, SpeechArtifact, SpeechSynthesizer};

struct Slot {
    epoch: u64,
    text: String,
    rx: oneshot::Receiver<Result<SpeechArtifact>>,
}

/// Synthesizes segments concurrently but plays them strictly in
/// submission order.
///
/// Each submitted segment gets a queue slot holding the future result
/// of its synthesis; a single drain task consumes slots positionally,
/// waiting (bounded by a timeout) for each slot's artifact before
/// handing it to the player. A slow or failed segment is skipped, not
/// retried, and never reorders its successors.
///
/// [`SpeechPipeline::interrupt`] advances an epoch counter; slots from
/// older epochs are discarded unplayed. That is the barge-in path:
/// already-running synthesis completes and is thrown away.
pub struct SpeechPipeline {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    slots: mpsc::UnboundedSender<Slot>,
    player: Arc<dyn Player>,
    epoch: Arc<AtomicU64>,
    pending: Arc<AtomicUsize>,
    interrupted: Arc<Notify>,
}

impl SpeechPipeline {
    pub fn new(
        synthesizer: Arc<dyn SpeechSynthesizer>,
        player: Arc<dyn Player>,
        segment_timeout: Duration,
    ) -> Self {
        let (slot_tx, slot_rx) = mpsc::unbounded_channel();
        let epoch = Arc::new(AtomicU64::new(0));
        let pending = Arc::new(AtomicUsize::new(0));
        let interrupted = Arc::new(Notify::new());

        tokio::spawn(drain(
            slot_rx,
            player.clone(),
            epoch.clone(),
            pending.clone(),
            interrupted.clone(),
            segment_timeout,
        ));

        Self {
            synthesizer,
            slots: slot_tx,
            player,
            epoch,
            pending,
            interrupted,
        }
    }

    /// Submit one segment for synthesis. Playback position equals
    /// submission order; synthesis itself runs concurrently.
    pub fn submit(&self, text: String) {
        let epoch = self.epoch.load(Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        let synthesizer = self.synthesizer.clone();
        let task_text = text.clone();
        tokio::spawn(async move {
            let _ = tx.send(synthesizer.synthesize(&task_text).await);
        });

        self.pending.fetch_add(1, Ordering::SeqCst);
        if self.slots.send(Slot { epoch, text, rx }).is_err() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            warn!("playback drain gone, segment dropped");
        }
    }

    /// Discard every queued-but-unplayed segment and halt current
    /// output. Synthesis already in flight finishes and is thrown away.
    pub fn interrupt(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.interrupted.notify_waiters();
        self.player.stop();
    }

    /// True when nothing is queued, being synthesized for playback, or
    /// audible.
    pub fn is_idle(&self) -> bool {
        self.pending.load(Ordering::SeqCst) == 0 && !self.player.is_playing()
    }

    pub fn is_playing(&self) -> bool {
        self.player.is_playing()
    }
}

async fn drain(
    mut slots: mpsc::UnboundedReceiver<Slot>,
    player: Arc<dyn Player>,
    epoch: Arc<AtomicU64>,
    pending: Arc<AtomicUsize>,
    interrupted: Arc<Notify>,
    segment_timeout: Duration,
) {
    while let Some(slot) = slots.recv().await {
        drain_one(slot, &player, &epoch, &interrupted, segment_timeout).await;
        pending.fetch_sub(1, Ordering::SeqCst);
    }
    debug!("playback drain stopped");
}

async fn drain_one(
    slot: Slot,
    player: &Arc<dyn Player>,
    epoch: &AtomicU64,
    interrupted: &Notify,
    segment_timeout: Duration,
) {
    if slot.epoch != epoch.load(Ordering::SeqCst) {
        debug!(text = %slot.text, "discarding superseded segment");
        return;
    }

    let waken = interrupted.notified();
    tokio::pin!(waken);

    let artifact = tokio::select! {
        res = timeout(segment_timeout, slot.rx) => match res {
            Err(_) => {
                warn!(text = %slot.text, timeout_ms = segment_timeout.as_millis() as u64,
                      "synthesis timed out, skipping segment");
                return;
            }
            Ok(Err(_)) => {
                warn!(text = %slot.text, "synthesis task dropped, skipping segment");
                return;
            }
            Ok(Ok(Err(e))) => {
                warn!(text = %slot.text, error = %e, "synthesis failed, skipping segment");
                return;
            }
            Ok(Ok(Ok(artifact))) => artifact,
        },
        _ = &mut waken => {
            debug!(text = %slot.text, "segment interrupted while pending");
            return;
        }
    };

    if slot.epoch != epoch.load(Ordering::SeqCst) {
        debug!(text = %slot.text, "discarding superseded segment");
        return;
    }
    if let Err(e) = player.play(artifact).await {
        warn!(text = %slot.text, error = %e, "playback failed");
    }
}
