//! Player module for handing synthesized audio to an external media player.

mod command;

pub use command::{PlaybackError, PlayerCommand, PlayerCommandError};
