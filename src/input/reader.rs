//! Line reader over an async byte stream (stdin in production).

use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Reads newline-delimited utterances without a line length limit.
///
/// A trailing `\r` is stripped so CRLF input behaves like LF input, and invalid
/// UTF-8 is replaced rather than treated as a read error.
pub struct LineReader<R> {
    reader: R,    // Underlying buffered stream
    buf: Vec<u8>, // Reused line buffer
}

impl<R: AsyncBufRead + Unpin> LineReader<R> {
    /// Create a new line reader.
    pub fn new(reader: R) -> Self {
        Self { reader, buf: Vec::new() }
    }

    /// Read the next line.
    ///
    /// # Returns
    /// `Ok(Some(line))` for every line, including blank ones, and `Ok(None)` at end of input.
    ///
    /// # Errors
    /// Returns the underlying I/O error if the stream cannot be read.
    pub async fn next_line(&mut self) -> io::Result<Option<String>> {
        self.buf.clear();

        if self.reader.read_until(b'\n', &mut self.buf).await? == 0 {
            return Ok(None);
        }

        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
            if self.buf.last() == Some(&b'\r') {
                self.buf.pop();
            }
        }

        Ok(Some(String::from_utf8_lossy(&self.buf).into_owned()))
    }
}
