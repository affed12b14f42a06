//! Text-to-speech module.
//!
//! Provides speech synthesis through Google Cloud Text-to-Speech.

mod google;
mod synthesizer;

pub use google::GoogleSynthesizer;
pub use synthesizer::{SpeechSynthesizer, SynthesisError, VoiceParams};
