//! cloud-say - speak lines of text with Google Cloud Text-to-Speech.
//!
//! Each line read from stdin is synthesized remotely and the resulting audio is
//! streamed into an external media player (mpv by default), one line at a time.

mod config;
mod input;
mod pipeline;
mod player;
mod tts;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, BufReader};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::LocalTime;

use config::AppConfig;
use pipeline::{Pipeline, PipelineStats};
use player::PlayerCommand;
use tts::GoogleSynthesizer;

/// Validate the configuration and build the pipeline.
///
/// All fatal startup checks happen here, before any input is read.
///
/// # Errors
/// Returns an error for invalid configuration, an unparsable player command or
/// unusable credentials.
fn prepare(config: &AppConfig) -> Result<Pipeline<GoogleSynthesizer>> {
    config.validate().context("Configuration error")?;

    let player = PlayerCommand::parse(&config.player)?;

    let synthesizer = GoogleSynthesizer::new(&config.credentials, &config.endpoint).context("Failed to initialize text-to-speech client")?;

    config.log_config();
    debug!("Player invocation: {} {}", player.program(), player.args().join(" "));

    Ok(Pipeline::new(synthesizer, config.voice_params(), player))
}

/// Prepare the pipeline and speak every line of `input`.
async fn run<R: AsyncBufRead + Unpin>(config: &AppConfig, input: R) -> Result<PipelineStats> {
    let pipeline = prepare(config)?;

    info!("Reading lines from stdin...");
    pipeline.run(input).await.context("Failed to read from stdin")
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments (exits on missing credentials)
    let config = AppConfig::from_args();

    // Respect RUST_LOG env var, fallback to verbose flag, default to info.
    // Logs go to stderr so the player keeps stdout.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(if config.verbose { "debug" } else { "info" }));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_timer(LocalTime::new(time::macros::format_description!("[hour]:[minute]:[second]")))
        .init();

    info!("🗣️  cloud-say v{}", env!("CARGO_PKG_VERSION"));

    let stats = match run(&config, BufReader::new(tokio::io::stdin())).await {
        Ok(stats) => stats,
        Err(e) => {
            error!("❌ {:#}", e);
            std::process::exit(1);
        }
    };

    info!(
        "✅ Done: {} line(s) read, {} played, {} synthesis failure(s), {} playback failure(s)",
        stats.lines, stats.played, stats.synthesis_failures, stats.playback_failures
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::pin::Pin;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::task::{Context as TaskContext, Poll};

    use clap::Parser;
    use tokio::io::{AsyncRead, ReadBuf};

    use super::*;

    /// Input that records whether it was ever read.
    struct WatchedInput {
        touched: Arc<AtomicBool>,
    }

    impl AsyncRead for WatchedInput {
        fn poll_read(self: Pin<&mut Self>, _cx: &mut TaskContext<'_>, _buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
            self.touched.store(true, Ordering::SeqCst);
            Poll::Ready(Ok(()))
        }
    }

    async fn run_watched(args: &[&str]) -> (Result<PipelineStats>, bool) {
        let mut argv = vec!["cloud-say"];
        argv.extend_from_slice(args);
        let config = AppConfig::try_parse_from(argv).unwrap();

        let touched = Arc::new(AtomicBool::new(false));
        let input = BufReader::new(WatchedInput { touched: touched.clone() });
        let result = run(&config, input).await;
        (result, touched.load(Ordering::SeqCst))
    }

    #[tokio::test]
    async fn test_missing_credentials_file_is_fatal_before_reading() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");

        let (result, touched) = run_watched(&["-c", missing.to_str().unwrap()]).await;

        assert!(result.unwrap_err().to_string().contains("Configuration error"));
        assert!(!touched);
    }

    #[tokio::test]
    async fn test_invalid_player_is_fatal_before_reading() {
        let file = tempfile::NamedTempFile::new().unwrap();

        let (result, touched) = run_watched(&["-c", file.path().to_str().unwrap(), "--player", "mpv 'oops"]).await;

        assert!(result.unwrap_err().to_string().contains("invalid player command"));
        assert!(!touched);
    }

    #[tokio::test]
    async fn test_unloadable_credentials_are_fatal_before_reading() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "{}").unwrap();

        let (result, touched) = run_watched(&["-c", file.path().to_str().unwrap()]).await;

        assert!(result.unwrap_err().to_string().contains("Failed to initialize text-to-speech client"));
        assert!(!touched);
    }
}
