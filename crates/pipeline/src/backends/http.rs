//! HTTP sidecar backends for speech recognition and synthesis.
//!
//! Both talk to small model-serving processes over plain HTTP: the
//! recognizer posts a WAV body and gets `{"text": ...}` back, the
//! synthesizer posts `{"text": ...}` and gets WAV bytes back.

use std::io::Cursor;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use duplex_core::{
    AudioFrame, Result, SpeechArtifact, SpeechRecognizer, SpeechSynthesizer, SAMPLE_RATE_HZ,
};

use crate::PipelineError;

fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Encode captured frames as a mono 16-bit WAV in memory.
fn frames_to_wav(frames: &[AudioFrame]) -> std::result::Result<Vec<u8>, PipelineError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE_HZ,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for frame in frames {
            for bytes in frame.pcm.chunks_exact(2) {
                writer.write_sample(i16::from_le_bytes([bytes[0], bytes[1]]))?;
            }
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}

#[derive(Deserialize)]
struct RecognizeResponse {
    text: String,
}

/// Recognizer backed by an HTTP transcription sidecar.
pub struct HttpRecognizer {
    client: reqwest::Client,
    url: String,
}

impl HttpRecognizer {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: http_client(timeout),
            url: url.into(),
        }
    }
}

#[async_trait]
impl SpeechRecognizer for HttpRecognizer {
    async fn recognize(&self, frames: &[AudioFrame]) -> Result<String> {
        let wav = frames_to_wav(frames)?;
        debug!(frames = frames.len(), bytes = wav.len(), "sending utterance for recognition");

        let response = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "audio/wav")
            .body(wav)
            .send()
            .await
            .map_err(PipelineError::Http)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(duplex_core::Error::Recognition(format!(
                "recognizer returned {status}: {body}"
            )));
        }

        let parsed: RecognizeResponse = response
            .json()
            .await
            .map_err(|e| duplex_core::Error::Recognition(e.to_string()))?;
        Ok(parsed.text)
    }
}

/// Synthesizer backed by an HTTP text-to-speech sidecar. Artifacts are
/// written as WAV files under `artifact_dir`.
pub struct HttpSynthesizer {
    client: reqwest::Client,
    url: String,
    artifact_dir: PathBuf,
}

impl HttpSynthesizer {
    pub fn new(url: impl Into<String>, artifact_dir: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            client: http_client(timeout),
            url: url.into(),
            artifact_dir: artifact_dir.into(),
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for HttpSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<SpeechArtifact> {
        let response = self
            .client
            .post(&self.url)
            .json(&json!({ "text": text }))
            .send()
            .await
            .map_err(|e| duplex_core::Error::Synthesis(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(duplex_core::Error::Synthesis(format!(
                "synthesizer returned {status}: {body}"
            )));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| duplex_core::Error::Synthesis(e.to_string()))?;

        tokio::fs::create_dir_all(&self.artifact_dir).await?;
        let path = self.artifact_dir.join(format!("{}.wav", Uuid::new_v4()));
        tokio::fs::write(&path, &audio).await?;
        debug!(path = %path.display(), bytes = audio.len(), "synthesized segment");

        Ok(SpeechArtifact::new(path, text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wav_encoding_preserves_sample_count() {
        let frames = vec![
            AudioFrame::new(vec![0u8; 512 * 2], 0),
            AudioFrame::new(vec![1u8; 512 * 2], 1),
        ];
        let wav = frames_to_wav(&frames).unwrap();
        let reader = hound::WavReader::new(Cursor::new(wav)).unwrap();
        assert_eq!(reader.spec().sample_rate, SAMPLE_RATE_HZ);
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.len(), 1024);
    }
}
