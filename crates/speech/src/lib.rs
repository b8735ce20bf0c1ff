//! Speech service clients
//!
//! Synthesis and transcription are opaque HTTP services behind the core
//! `SpeechSynthesizer` / `SpeechToText` traits. Audio is an opaque byte
//! blob throughout; no decoding or resampling happens here.

pub mod stt;
pub mod tts;

pub use stt::HttpTranscriber;
pub use tts::HttpSynthesizer;

use thiserror::Error;

/// Construction-time error for speech clients
#[derive(Error, Debug)]
pub enum SpeechClientError {
    #[error("failed to create HTTP client: {0}")]
    Client(String),
}
