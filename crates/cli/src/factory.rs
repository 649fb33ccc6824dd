//! Config-keyed construction of collaborators.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};

use duplex_agent::Collaborators;
use duplex_config::Settings;
use duplex_core::{
    LanguageModel, Player, Recorder, SpeechRecognizer, SpeechSynthesizer, VoiceActivityDetector,
};
use duplex_llm::OpenAiCompatBackend;
use duplex_pipeline::backends::{HttpRecognizer, HttpSynthesizer, StdinRecorder, WavQueuePlayer};
use duplex_pipeline::{EnergyVad, SpeechPipeline};
use duplex_tools::{DayOfWeekTool, ToolDispatcher, ToolRegistry};

pub fn build_collaborators(settings: &Settings) -> Result<Collaborators> {
    let recorder: Arc<dyn Recorder> = match settings.recorder.backend.as_str() {
        "stdin" => Arc::new(StdinRecorder::new()),
        other => bail!("unknown recorder backend: {other}"),
    };

    let vad: Arc<dyn VoiceActivityDetector> = match settings.vad.backend.as_str() {
        "energy" => Arc::new(EnergyVad::new(
            settings.vad.amplitude_threshold,
            settings.vad.start_frames,
            settings.vad.end_frames,
        )),
        other => bail!("unknown vad backend: {other}"),
    };

    let recognizer: Arc<dyn SpeechRecognizer> = match settings.asr.backend.as_str() {
        "http" => Arc::new(HttpRecognizer::new(
            &settings.asr.url,
            Duration::from_millis(settings.asr.timeout_ms),
        )),
        other => bail!("unknown asr backend: {other}"),
    };

    let synthesizer: Arc<dyn SpeechSynthesizer> = match settings.tts.backend.as_str() {
        "http" => Arc::new(HttpSynthesizer::new(
            &settings.tts.url,
            &settings.tts.artifact_dir,
            Duration::from_millis(settings.tts.timeout_ms),
        )),
        other => bail!("unknown tts backend: {other}"),
    };

    let player: Arc<dyn Player> = match settings.player.backend.as_str() {
        "wav-queue" => Arc::new(WavQueuePlayer::new()),
        other => bail!("unknown player backend: {other}"),
    };

    let model: Arc<dyn LanguageModel> = match settings.llm.backend.as_str() {
        "openai" => Arc::new(OpenAiCompatBackend::new(
            &settings.llm.url,
            &settings.llm.model,
            settings.llm.api_key.clone(),
            settings.llm.temperature,
            Duration::from_millis(settings.llm.timeout_ms),
        )),
        other => bail!("unknown llm backend: {other}"),
    };

    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(DayOfWeekTool));
    let dispatcher = Arc::new(ToolDispatcher::new(
        Arc::new(registry),
        &settings.turn.busy_acknowledgement,
    ));

    let pipeline = Arc::new(SpeechPipeline::new(
        synthesizer,
        player,
        Duration::from_millis(settings.turn.segment_timeout_ms),
    ));

    Ok(Collaborators {
        recorder,
        vad,
        recognizer,
        model,
        dispatcher,
        pipeline,
    })
}
