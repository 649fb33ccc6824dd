//! Concrete collaborator backends: HTTP sidecars for recognition and
//! synthesis, stdin capture, and a WAV file player.

pub mod http;
pub mod player;
pub mod recorder;

pub use http::{HttpRecognizer, HttpSynthesizer};
pub use player::WavQueuePlayer;
pub use recorder::StdinRecorder;
