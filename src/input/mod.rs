//! Input module providing utterances one line at a time.

mod reader;

pub use reader::LineReader;
