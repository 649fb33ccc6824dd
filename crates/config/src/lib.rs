//! Configuration management for the duplex conversation agent
//!
//! Supports loading configuration from:
//! - YAML files
//! - Environment variables (`DUPLEX_` prefix)
//! - Built-in defaults

pub mod settings;

pub use settings::{
    load_settings, AsrConfig, LlmConfig, PlayerConfig, RecorderConfig, Settings, TtsConfig,
    TurnConfig, VadConfig,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
