//! Raw PCM capture from standard input.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use duplex_core::{AudioFrame, Recorder, Result, FRAME_SAMPLES};

/// Reads s16le mono PCM from stdin in fixed-size frames. Pair it with
/// something like `arecord -f S16_LE -r 16000 -c 1 | duplex-cli` to
/// capture from a microphone without an in-process audio stack.
pub struct StdinRecorder {
    stopped: Arc<AtomicBool>,
}

impl StdinRecorder {
    pub fn new() -> Self {
        Self {
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl Default for StdinRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Recorder for StdinRecorder {
    async fn start(&self, sink: mpsc::Sender<AudioFrame>) -> Result<()> {
        self.stopped.store(false, Ordering::SeqCst);
        let stopped = self.stopped.clone();

        tokio::spawn(async move {
            let mut stdin = tokio::io::stdin();
            let mut buf = vec![0u8; FRAME_SAMPLES * 2];
            let mut sequence = 0u64;

            loop {
                if stopped.load(Ordering::SeqCst) {
                    break;
                }
                match stdin.read_exact(&mut buf).await {
                    Ok(_) => {
                        let frame = AudioFrame::new(buf.clone(), sequence);
                        sequence += 1;
                        if sink.send(frame).await.is_err() {
                            debug!("frame sink closed, stopping capture");
                            break;
                        }
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                        debug!("stdin closed, stopping capture");
                        break;
                    }
                    Err(e) => {
                        warn!(error = %e, "capture read failed");
                        break;
                    }
                }
            }
        });

        Ok(())
    }

    async fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}
