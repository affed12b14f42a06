//! Application configuration and CLI argument parsing.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use crate::tts::VoiceParams;

/// Default Google Cloud Text-to-Speech endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://texttospeech.googleapis.com";

/// Speak lines from stdin application configuration.
#[derive(Parser, Debug, Clone)]
#[command(name = "cloud-say")]
#[command(author, version, about = "Speak each line of stdin with Google Cloud Text-to-Speech", long_about = None)]
pub struct AppConfig {
    /// Language code of the voice (BCP-47, e.g. en-US, es-ES)
    #[arg(long = "language", short = 'l', default_value = "en-US")]
    pub language_code: String,

    /// Voice name (e.g. en-US-Standard-A, en-US-Wavenet-D)
    #[arg(long = "voice", default_value = "en-US-Standard-A")]
    pub voice_name: String,

    /// Speaking rate (provider accepts roughly 0.25 - 4.0)
    #[arg(long = "speed", short = 's', default_value = "1.0", allow_negative_numbers = true)]
    pub speaking_rate: f64,

    /// Speaking pitch in semitones (provider accepts roughly -20.0 - 20.0)
    #[arg(long, short = 'p', default_value = "0.0", allow_negative_numbers = true)]
    pub pitch: f64,

    /// Volume gain in dB
    #[arg(long = "gain", short = 'g', default_value = "0.0", allow_negative_numbers = true)]
    pub volume_gain_db: f64,

    /// Player command line; "-" is appended so the player reads audio from stdin
    #[arg(long, default_value = "mpv")]
    pub player: String,

    /// Application credentials file path (service account JSON)
    #[arg(long, short = 'c', env = "GOOGLE_APPLICATION_CREDENTIALS")]
    pub credentials: PathBuf,

    /// Text-to-Speech API endpoint
    #[arg(long, env = "TTS_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Enable verbose logging
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

impl AppConfig {
    /// Parse configuration from command line arguments.
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Voice parameters sent with every synthesis request.
    pub fn voice_params(&self) -> VoiceParams {
        VoiceParams {
            language_code: self.language_code.clone(),
            voice_name: self.voice_name.clone(),
            speaking_rate: self.speaking_rate,
            pitch: self.pitch,
            volume_gain_db: self.volume_gain_db,
        }
    }

    /// Validate the configuration.
    ///
    /// Ranges of speaking rate, pitch and gain are left to the provider; only
    /// non-finite values are rejected here.
    pub fn validate(&self) -> Result<()> {
        if !self.credentials.exists() {
            anyhow::bail!("Credentials file does not exist: {}", self.credentials.display());
        }

        if !self.credentials.is_file() {
            anyhow::bail!("Credentials path is not a file: {}", self.credentials.display());
        }

        if self.player.trim().is_empty() {
            anyhow::bail!("Player command must not be empty");
        }

        for (name, value) in [("speed", self.speaking_rate), ("pitch", self.pitch), ("gain", self.volume_gain_db)] {
            if !value.is_finite() {
                anyhow::bail!("{} must be a finite number, got {}", name, value);
            }
        }

        Ok(())
    }

    /// Log the current configuration.
    pub fn log_config(&self) {
        info!("Configuration:");
        info!("  Language: {}", self.language_code);
        info!("  Voice: {}", self.voice_name);
        info!("  Speaking rate: {}", self.speaking_rate);
        info!("  Pitch: {}", self.pitch);
        info!("  Volume gain: {} dB", self.volume_gain_db);
        info!("  Player: {}", self.player);
        info!("  Credentials: {}", self.credentials.display());
        if self.endpoint != DEFAULT_ENDPOINT {
            info!("  Endpoint: {}", self.endpoint);
        }
    }
}
