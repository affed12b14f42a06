//! Sequential read → synthesize → play loop.

use std::io;

use tokio::io::AsyncBufRead;
use tracing::{debug, error, info};

use crate::input::LineReader;
use crate::player::PlayerCommand;
use crate::tts::{SpeechSynthesizer, VoiceParams};

/// Counters reported when input ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub lines: usize,              // Lines read from input
    pub played: usize,             // Lines played successfully
    pub synthesis_failures: usize, // Lines skipped because synthesis failed
    pub playback_failures: usize,  // Lines whose player failed
}

/// Speaks utterances one at a time, strictly in input order.
pub struct Pipeline<S> {
    synthesizer: S,        // Speech synthesizer
    voice: VoiceParams,    // Voice parameters for every utterance
    player: PlayerCommand, // Player command (parsed once)
}

impl<S: SpeechSynthesizer> Pipeline<S> {
    /// Create a new pipeline.
    ///
    /// # Arguments
    /// * `synthesizer` - Speech synthesizer
    /// * `voice` - Voice parameters applied to every line
    /// * `player` - Parsed player command
    pub fn new(synthesizer: S, voice: VoiceParams, player: PlayerCommand) -> Self {
        Self { synthesizer, voice, player }
    }

    /// Speak every line of `input` until end of input.
    ///
    /// Synthesis and playback failures are logged and the line is skipped. The next
    /// line is not read until the player for the current one has exited.
    ///
    /// # Returns
    /// Counters for the processed lines.
    ///
    /// # Errors
    /// Returns an error only if reading input fails.
    pub async fn run<R: AsyncBufRead + Unpin>(&self, input: R) -> io::Result<PipelineStats> {
        let mut reader = LineReader::new(input);
        let mut stats = PipelineStats::default();

        while let Some(line) = reader.next_line().await? {
            stats.lines += 1;
            debug!("📝 Line {}: \"{}\"", stats.lines, line);

            let audio = match self.synthesizer.synthesize(&line, &self.voice).await {
                Ok(audio) => audio,
                Err(e) => {
                    error!("❌ Failed to synthesize speech: {}", e);
                    stats.synthesis_failures += 1;
                    continue;
                }
            };

            info!("🔊 Playing line {} ({} bytes)", stats.lines, audio.len());

            match self.player.play(audio).await {
                Ok(()) => stats.played += 1,
                Err(e) => {
                    error!("❌ {}", e);
                    stats.playback_failures += 1;
                }
            }
        }

        Ok(stats)
    }
}
