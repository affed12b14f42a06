//! Google Cloud Text-to-Speech synthesizer over the REST API.

use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use gcp_auth::{CustomServiceAccount, TokenProvider};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::synthesizer::{SpeechSynthesizer, SynthesisError, VoiceParams};

/// OAuth2 scope required by the Text-to-Speech API.
const SCOPES: &[&str] = &["https://www.googleapis.com/auth/cloud-platform"];

/// Audio encoding requested for every utterance (Opus in an Ogg container).
pub const AUDIO_ENCODING: &str = "OGG_OPUS";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeRequest<'a> {
    input: SynthesisInput<'a>,
    voice: VoiceSelection<'a>,
    audio_config: AudioConfig,
}

#[derive(Debug, Serialize)]
struct SynthesisInput<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceSelection<'a> {
    language_code: &'a str,
    name: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioConfig {
    audio_encoding: &'static str,
    speaking_rate: f64,
    pitch: f64,
    volume_gain_db: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    #[serde(default)]
    audio_content: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl<'a> SynthesizeRequest<'a> {
    fn new(text: &'a str, voice: &'a VoiceParams) -> Self {
        Self {
            input: SynthesisInput { text },
            voice: VoiceSelection { language_code: &voice.language_code, name: &voice.voice_name },
            audio_config: AudioConfig {
                audio_encoding: AUDIO_ENCODING,
                speaking_rate: voice.speaking_rate,
                pitch: voice.pitch,
                volume_gain_db: voice.volume_gain_db,
            },
        }
    }
}

/// HTTP half of a synthesize call, given an access token.
struct SynthesizeEndpoint {
    http: reqwest::Client, // Shared HTTP client
    url: String,           // Full text:synthesize URL
}

impl SynthesizeEndpoint {
    fn new(endpoint: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { http, url: synthesize_url(endpoint) })
    }

    async fn synthesize(&self, token: &str, text: &str, voice: &VoiceParams) -> Result<Vec<u8>, SynthesisError> {
        debug!("Requesting synthesis of {} characters with voice {}", text.chars().count(), voice.voice_name);

        let response = self.http.post(&self.url).bearer_auth(token).json(&SynthesizeRequest::new(text, voice)).send().await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(SynthesisError::Api { status: status.as_u16(), message: error_message(&body) });
        }

        decode_audio(&body)
    }
}

/// Text-to-speech synthesizer backed by Google Cloud.
pub struct GoogleSynthesizer {
    endpoint: SynthesizeEndpoint,      // REST endpoint
    credentials: CustomServiceAccount, // Service account (caches access tokens)
}

impl GoogleSynthesizer {
    /// Create a new Google synthesizer.
    ///
    /// # Arguments
    /// * `credentials_path` - Service account JSON file
    /// * `endpoint` - API base URL (e.g. `https://texttospeech.googleapis.com`)
    ///
    /// # Returns
    /// A new `GoogleSynthesizer` instance.
    ///
    /// # Errors
    /// Returns an error if the credentials cannot be loaded or the HTTP client cannot be built.
    pub fn new(credentials_path: &Path, endpoint: &str) -> Result<Self> {
        info!("Loading credentials from {}", credentials_path.display());

        let credentials = CustomServiceAccount::from_file(credentials_path)
            .with_context(|| format!("Failed to load credentials from {}", credentials_path.display()))?;

        Ok(Self { endpoint: SynthesizeEndpoint::new(endpoint)?, credentials })
    }
}

#[async_trait]
impl SpeechSynthesizer for GoogleSynthesizer {
    async fn synthesize(&self, text: &str, voice: &VoiceParams) -> Result<Vec<u8>, SynthesisError> {
        let token = self.credentials.token(SCOPES).await?;
        self.endpoint.synthesize(token.as_str(), text, voice).await
    }
}

/// Build the synthesize URL from an API base URL.
fn synthesize_url(endpoint: &str) -> String {
    format!("{}/v1/text:synthesize", endpoint.trim_end_matches('/'))
}

/// Extract the provider's error message, falling back to the raw body.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(response) => response.error.message,
        Err(_) => body.trim().to_string(),
    }
}

/// Decode the base64 audio payload of a successful response.
fn decode_audio(body: &str) -> Result<Vec<u8>, SynthesisError> {
    let response: SynthesizeResponse = serde_json::from_str(body).map_err(|e| SynthesisError::InvalidResponse(e.to_string()))?;

    let audio = STANDARD.decode(response.audio_content.as_bytes()).map_err(|e| SynthesisError::InvalidResponse(format!("audioContent is not valid base64: {}", e)))?;

    if audio.is_empty() {
        return Err(SynthesisError::EmptyAudio);
    }

    Ok(audio)
}
