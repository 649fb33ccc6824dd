//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::ConfigError;

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// System prompt seeding every dialogue.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Whether user speech may interrupt playback (barge-in).
    #[serde(default = "default_true")]
    pub interrupt: bool,

    /// Directory for per-session dialogue history dumps. None disables
    /// persistence.
    #[serde(default)]
    pub history_path: Option<String>,

    #[serde(default)]
    pub recorder: RecorderConfig,

    #[serde(default)]
    pub vad: VadConfig,

    #[serde(default)]
    pub asr: AsrConfig,

    #[serde(default)]
    pub tts: TtsConfig,

    #[serde(default)]
    pub player: PlayerConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub turn: TurnConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            interrupt: true,
            history_path: None,
            recorder: RecorderConfig::default(),
            vad: VadConfig::default(),
            asr: AsrConfig::default(),
            tts: TtsConfig::default(),
            player: PlayerConfig::default(),
            llm: LlmConfig::default(),
            turn: TurnConfig::default(),
        }
    }
}

/// Capture backend selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecorderConfig {
    /// Backend key for the factory ("stdin").
    #[serde(default = "default_recorder_backend")]
    pub backend: String,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            backend: default_recorder_backend(),
        }
    }
}

/// Energy VAD parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VadConfig {
    /// Backend key for the factory ("energy").
    #[serde(default = "default_vad_backend")]
    pub backend: String,

    /// Mean absolute sample amplitude above which a frame counts as
    /// speech (s16le units).
    #[serde(default = "default_vad_threshold")]
    pub amplitude_threshold: f32,

    /// Consecutive speech frames required before emitting `start`.
    #[serde(default = "default_start_frames")]
    pub start_frames: usize,

    /// Consecutive silence frames required before emitting `end`.
    #[serde(default = "default_end_frames")]
    pub end_frames: usize,
}

impl Default for VadConfig {
    fn default() -> Self {
        Self {
            backend: default_vad_backend(),
            amplitude_threshold: default_vad_threshold(),
            start_frames: default_start_frames(),
            end_frames: default_end_frames(),
        }
    }
}

/// Speech-recognition backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AsrConfig {
    /// Backend key for the factory ("http").
    #[serde(default = "default_http_backend")]
    pub backend: String,

    #[serde(default = "default_asr_url")]
    pub url: String,

    #[serde(default = "default_http_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for AsrConfig {
    fn default() -> Self {
        Self {
            backend: default_http_backend(),
            url: default_asr_url(),
            timeout_ms: default_http_timeout_ms(),
        }
    }
}

/// Speech-synthesis backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsConfig {
    /// Backend key for the factory ("http").
    #[serde(default = "default_http_backend")]
    pub backend: String,

    #[serde(default = "default_tts_url")]
    pub url: String,

    #[serde(default = "default_http_timeout_ms")]
    pub timeout_ms: u64,

    /// Directory where synthesized WAV artifacts are written.
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: String,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            backend: default_http_backend(),
            url: default_tts_url(),
            timeout_ms: default_http_timeout_ms(),
            artifact_dir: default_artifact_dir(),
        }
    }
}

/// Playback backend selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Backend key for the factory ("wav-queue").
    #[serde(default = "default_player_backend")]
    pub backend: String,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            backend: default_player_backend(),
        }
    }
}

/// Language-model backend settings (OpenAI-compatible endpoint).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Backend key for the factory ("openai").
    #[serde(default = "default_llm_backend")]
    pub backend: String,

    #[serde(default = "default_llm_model")]
    pub model: String,

    #[serde(default = "default_llm_url")]
    pub url: String,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_http_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            backend: default_llm_backend(),
            model: default_llm_model(),
            url: default_llm_url(),
            api_key: None,
            temperature: default_temperature(),
            timeout_ms: default_http_timeout_ms(),
        }
    }
}

/// Chat-turn tuning knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnConfig {
    /// Per-segment synthesis wait before the drain skips the slot.
    #[serde(default = "default_segment_timeout_ms")]
    pub segment_timeout_ms: u64,

    /// Maximum REQLLM/ADDSYSTEMSPEAK chain length per user turn.
    #[serde(default = "default_tool_chain_depth")]
    pub max_tool_chain_depth: usize,

    /// Spoken acknowledgement for TIME_CONSUMING tools.
    #[serde(default = "default_busy_acknowledgement")]
    pub busy_acknowledgement: String,
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            segment_timeout_ms: default_segment_timeout_ms(),
            max_tool_chain_depth: default_tool_chain_depth(),
            busy_acknowledgement: default_busy_acknowledgement(),
        }
    }
}

fn default_system_prompt() -> String {
    "You are a friendly voice assistant. Keep replies short and \
     conversational; they will be spoken aloud."
        .to_string()
}

fn default_true() -> bool {
    true
}

fn default_recorder_backend() -> String {
    "stdin".to_string()
}

fn default_vad_backend() -> String {
    "energy".to_string()
}

fn default_vad_threshold() -> f32 {
    600.0
}

fn default_start_frames() -> usize {
    2
}

fn default_end_frames() -> usize {
    15
}

fn default_http_backend() -> String {
    "http".to_string()
}

fn default_asr_url() -> String {
    "http://127.0.0.1:8090/recognize".to_string()
}

fn default_tts_url() -> String {
    "http://127.0.0.1:8091/synthesize".to_string()
}

fn default_http_timeout_ms() -> u64 {
    30_000
}

fn default_artifact_dir() -> String {
    "tmp/tts".to_string()
}

fn default_player_backend() -> String {
    "wav-queue".to_string()
}

fn default_llm_backend() -> String {
    "openai".to_string()
}

fn default_llm_model() -> String {
    "qwen2.5:7b-instruct".to_string()
}

fn default_llm_url() -> String {
    "http://127.0.0.1:11434/v1".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_segment_timeout_ms() -> u64 {
    5_000
}

fn default_tool_chain_depth() -> usize {
    4
}

fn default_busy_acknowledgement() -> String {
    "I'm looking that up, I'll let you know in a moment.".to_string()
}

/// Load settings from an optional YAML file plus `DUPLEX_` environment
/// overrides. Missing file with an explicit path is an error; no path
/// means defaults + environment.
pub fn load_settings(path: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    if let Some(path) = path {
        if !Path::new(path).exists() {
            return Err(ConfigError::FileNotFound(path.to_string()));
        }
        builder = builder.add_source(File::with_name(path));
    }

    let config = builder
        .add_source(Environment::with_prefix("DUPLEX").separator("__"))
        .build()?;

    let settings: Settings = config.try_deserialize()?;

    if settings.turn.max_tool_chain_depth == 0 {
        return Err(ConfigError::InvalidValue {
            field: "turn.max_tool_chain_depth".to_string(),
            message: "must be at least 1".to_string(),
        });
    }

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_sane() {
        let s = Settings::default();
        assert!(s.interrupt);
        assert_eq!(s.turn.segment_timeout_ms, 5_000);
        assert_eq!(s.turn.max_tool_chain_depth, 4);
        assert!(s.history_path.is_none());
    }

    #[test]
    fn loads_yaml_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent.yaml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(
            f,
            "interrupt: false\nturn:\n  segment_timeout_ms: 1200\nllm:\n  model: test-model"
        )
        .unwrap();

        let s = load_settings(Some(path.to_str().unwrap())).unwrap();
        assert!(!s.interrupt);
        assert_eq!(s.turn.segment_timeout_ms, 1200);
        assert_eq!(s.llm.model, "test-model");
        // untouched defaults survive
        assert_eq!(s.turn.max_tool_chain_depth, 4);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(matches!(
            load_settings(Some("/nonexistent/agent.yaml")),
            Err(ConfigError::FileNotFound(_))
        ));
    }
}
