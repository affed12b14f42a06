//! Speech synthesizer abstraction shared by providers and the pipeline.

use async_trait::async_trait;
use thiserror::Error;

/// Voice parameters applied to every synthesized utterance.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceParams {
    pub language_code: String, // BCP-47 language code
    pub voice_name: String,    // Provider voice name
    pub speaking_rate: f64,    // 1.0 is normal speed
    pub pitch: f64,            // Semitones
    pub volume_gain_db: f64,   // Gain in dB
}

/// Errors returned by a speech synthesizer.
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("failed to obtain access token: {0}")]
    Auth(#[from] gcp_auth::Error),

    #[error("request to text-to-speech API failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("text-to-speech API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("invalid response from text-to-speech API: {0}")]
    InvalidResponse(String),

    #[error("text-to-speech API returned no audio")]
    EmptyAudio,
}

/// Converts text into encoded audio bytes.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize one utterance.
    ///
    /// # Arguments
    /// * `text` - The text to speak (may be empty)
    /// * `voice` - Voice parameters for the request
    ///
    /// # Returns
    /// Non-empty encoded audio bytes.
    ///
    /// # Errors
    /// Returns a `SynthesisError` if the provider rejects the request or is unreachable.
    async fn synthesize(&self, text: &str, voice: &VoiceParams) -> Result<Vec<u8>, SynthesisError>;
}
