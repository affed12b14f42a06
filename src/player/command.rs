//! External player process launcher.
//!
//! The configured command line is split once at startup. Every utterance starts
//! a fresh process reading encoded audio from its stdin.

use std::fmt;
use std::io;
use std::process::{ExitStatus, Stdio};

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

/// Trailing argument telling the player to read audio from stdin.
pub const STDIN_MARKER: &str = "-";

/// Errors raised while parsing the player command line.
#[derive(Debug, Error)]
pub enum PlayerCommandError {
    #[error("invalid player command '{command}': {source}")]
    Syntax { command: String, source: shell_words::ParseError },

    #[error("player command is empty")]
    Empty,
}

/// Errors raised while playing one audio buffer.
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("failed to start player command '{command}': {source}")]
    Spawn { command: String, source: io::Error },

    #[error("failed to get stdin of player command '{command}'")]
    Stdin { command: String },

    #[error("failed to write to stdin of player command '{command}': {source}")]
    Write { command: String, source: io::Error },

    #[error("stdin writer of player command '{command}' panicked")]
    Writer { command: String },

    #[error("failed to wait for player command '{command}': {source}")]
    Wait { command: String, source: io::Error },

    #[error("player command '{command}' exited with {status}{}", write_failure(.write_error))]
    Exit { command: String, status: ExitStatus, write_error: Option<io::Error> },
}

/// Describe a write error that accompanied an unsuccessful exit.
fn write_failure(write_error: &Option<io::Error>) -> String {
    match write_error {
        Some(e) => format!(" (failed to write to stdin: {})", e),
        None => String::new(),
    }
}

/// Parsed player command line with the stdin marker appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerCommand {
    raw: String,       // Command line as configured
    program: String,   // Executable name or path
    args: Vec<String>, // Arguments, ending with the stdin marker
}

impl PlayerCommand {
    /// Parse a player command line using POSIX shell word splitting.
    ///
    /// # Arguments
    /// * `command` - Command line, e.g. `mpv --no-video`
    ///
    /// # Returns
    /// A `PlayerCommand` whose arguments end with `-`.
    ///
    /// # Errors
    /// Returns an error for unbalanced quotes, a dangling escape, or an empty command.
    pub fn parse(command: &str) -> Result<Self, PlayerCommandError> {
        let mut words = shell_words::split(command).map_err(|source| PlayerCommandError::Syntax { command: command.to_string(), source })?;

        if words.is_empty() {
            return Err(PlayerCommandError::Empty);
        }

        let program = words.remove(0);
        words.push(STDIN_MARKER.to_string());

        Ok(Self { raw: command.to_string(), program, args: words })
    }

    /// Executable that will be started.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments passed to the executable (including the stdin marker).
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Start the player, feed it `audio` and wait for it to exit.
    ///
    /// The audio is written on a separate task so a player that does not read its
    /// whole input up front cannot deadlock against the exit wait. The stdin handle
    /// is closed once the write finishes so the player sees end-of-input.
    ///
    /// # Errors
    /// Returns a `PlaybackError` if the process cannot be started, the write fails,
    /// or the process exits unsuccessfully.
    pub async fn play(&self, audio: Vec<u8>) -> Result<(), PlaybackError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| PlaybackError::Spawn { command: self.raw.clone(), source })?;

        let Some(mut stdin) = child.stdin.take() else {
            // Reap the process before reporting
            if let Err(e) = child.wait().await {
                warn!("Failed to wait for player command '{}': {}", self.raw, e);
            }
            return Err(PlaybackError::Stdin { command: self.raw.clone() });
        };

        let len = audio.len();
        let writer = tokio::spawn(async move {
            let result = match stdin.write_all(&audio).await {
                Ok(()) => stdin.shutdown().await,
                Err(e) => Err(e),
            };
            drop(stdin);
            result
        });

        let status = child.wait().await;
        let written = writer.await;

        let status = status.map_err(|source| PlaybackError::Wait { command: self.raw.clone(), source })?;

        if !status.success() {
            let write_error = match written {
                Ok(Err(e)) => Some(e),
                _ => None,
            };
            return Err(PlaybackError::Exit { command: self.raw.clone(), status, write_error });
        }

        match written {
            Ok(Ok(())) => {
                debug!("Wrote {} bytes to player", len);
                Ok(())
            }
            Ok(Err(source)) => Err(PlaybackError::Write { command: self.raw.clone(), source }),
            Err(_) => Err(PlaybackError::Writer { command: self.raw.clone() }),
        }
    }
}

impl fmt::Display for PlayerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_word() {
        let command = PlayerCommand::parse("mpv").unwrap();
        assert_eq!(command.program(), "mpv");
        assert_eq!(command.args(), ["-"]);
    }

    #[test]
    fn test_parse_with_arguments() {
        let command = PlayerCommand::parse("aplay --quiet").unwrap();
        assert_eq!(command.program(), "aplay");
        assert_eq!(command.args(), ["--quiet", "-"]);
    }

    #[test]
    fn test_parse_quoting_and_escapes() {
        let command = PlayerCommand::parse(r#"'/opt/my player/bin' --title "hello world" a\ b"#).unwrap();
        assert_eq!(command.program(), "/opt/my player/bin");
        assert_eq!(command.args(), ["--title", "hello world", "a b", "-"]);
    }

    #[test]
    fn test_parse_unbalanced_quote() {
        let err = PlayerCommand::parse("mpv 'oops").unwrap_err();
        assert!(matches!(err, PlayerCommandError::Syntax { .. }));
        assert!(err.to_string().contains("mpv 'oops"));
    }

    #[test]
    fn test_parse_empty() {
        assert!(matches!(PlayerCommand::parse(""), Err(PlayerCommandError::Empty)));
        assert!(matches!(PlayerCommand::parse("   "), Err(PlayerCommandError::Empty)));
    }

    #[test]
    fn test_display_is_configured_command() {
        let command = PlayerCommand::parse("mpv  --really-quiet").unwrap();
        assert_eq!(command.to_string(), "mpv  --really-quiet");
    }

    #[cfg(unix)]
    mod process {
        use crate::player::command::{PlaybackError, PlayerCommand};

        fn capture_command(path: &std::path::Path) -> PlayerCommand {
            // sh receives the trailing "-" as $0
            PlayerCommand::parse(&format!("sh -c 'cat > \"{}\"'", path.display())).unwrap()
        }

        #[tokio::test]
        async fn test_play_writes_full_buffer() {
            let dir = tempfile::tempdir().unwrap();
            let out = dir.path().join("audio.ogg");
            let command = capture_command(&out);

            command.play(b"OggS-fake-audio".to_vec()).await.unwrap();

            assert_eq!(std::fs::read(&out).unwrap(), b"OggS-fake-audio");
        }

        #[tokio::test]
        async fn test_play_large_buffer_does_not_deadlock() {
            let dir = tempfile::tempdir().unwrap();
            let out = dir.path().join("audio.ogg");
            let command = capture_command(&out);
            let audio: Vec<u8> = (0..4 * 1024 * 1024).map(|i| (i % 251) as u8).collect();

            command.play(audio.clone()).await.unwrap();

            assert_eq!(std::fs::read(&out).unwrap(), audio);
        }

        #[tokio::test]
        async fn test_play_passes_stdin_marker() {
            let dir = tempfile::tempdir().unwrap();
            let out = dir.path().join("args.txt");
            let command = PlayerCommand::parse(&format!("sh -c 'echo \"$0\" > \"{}\"; cat > /dev/null'", out.display())).unwrap();

            command.play(vec![1, 2, 3]).await.unwrap();

            assert_eq!(std::fs::read_to_string(&out).unwrap(), "-\n");
        }

        #[tokio::test]
        async fn test_play_nonzero_exit() {
            let command = PlayerCommand::parse("false").unwrap();
            let err = command.play(vec![0; 16]).await.unwrap_err();
            assert!(matches!(err, PlaybackError::Exit { .. }));
            assert!(err.to_string().contains("'false'"));
        }

        #[tokio::test]
        async fn test_play_nonzero_exit_keeps_write_error() {
            let command = PlayerCommand::parse("sh -c 'exit 3'").unwrap();
            let err = command.play(vec![0; 4 * 1024 * 1024]).await.unwrap_err();

            match &err {
                PlaybackError::Exit { status, write_error: Some(e), .. } => {
                    assert_eq!(status.code(), Some(3));
                    assert_eq!(e.kind(), std::io::ErrorKind::BrokenPipe);
                }
                other => panic!("unexpected error: {:?}", other),
            }

            let message = err.to_string();
            assert!(message.contains("sh -c 'exit 3'"));
            assert!(message.contains("failed to write to stdin"));
        }

        #[tokio::test]
        async fn test_play_missing_program() {
            let command = PlayerCommand::parse("/nonexistent/cloud-say-player --flag").unwrap();
            let err = command.play(vec![0; 16]).await.unwrap_err();
            assert!(matches!(err, PlaybackError::Spawn { .. }));
        }

        #[tokio::test]
        async fn test_play_player_ignores_input() {
            let command = PlayerCommand::parse("sh -c 'exit 0'").unwrap();
            let err = command.play(vec![0; 4 * 1024 * 1024]).await.unwrap_err();
            assert!(matches!(err, PlaybackError::Write { .. }));
        }
    }
}
