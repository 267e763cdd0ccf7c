//! Output sinks.
//!
//! Rendering writes through two distinct paths: display text (literals and
//! `echo`) and raw values (`dump`, which bypasses display conversion). Sinks
//! never fail the render; the stream adapter records I/O errors for the
//! caller to inspect afterwards.

use crate::value::Value;
use std::io;

/// Sink receiving rendered output.
pub trait Output {
    /// Write display text (the literal/`echo` path).
    fn write_text(&mut self, text: &str);

    /// Write a value's raw representation (the `dump` path).
    fn write_value(&mut self, value: &Value);
}

/// In-memory sink accumulating a string.
#[derive(Default)]
pub struct StringOutput {
    buffer: String,
}

impl StringOutput {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow the accumulated output.
    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    /// Consume the sink, returning the accumulated output.
    pub fn into_string(self) -> String {
        self.buffer
    }
}

impl Output for StringOutput {
    fn write_text(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    fn write_value(&mut self, value: &Value) {
        use std::fmt::Write;
        let _ = write!(self.buffer, "{:?}", value);
    }
}

/// Sink writing to an [`io::Write`] stream.
///
/// I/O errors do not interrupt rendering; the first error is kept and
/// subsequent writes become no-ops.
pub struct StreamOutput<W: io::Write> {
    writer: W,
    error: Option<io::Error>,
}

impl<W: io::Write> StreamOutput<W> {
    /// Wrap a writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            error: None,
        }
    }

    /// The first I/O error hit while writing, if any.
    pub fn error(&self) -> Option<&io::Error> {
        self.error.as_ref()
    }

    /// Unwrap the inner writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_bytes(&mut self, bytes: &[u8]) {
        if self.error.is_none() {
            if let Err(error) = self.writer.write_all(bytes) {
                self.error = Some(error);
            }
        }
    }
}

impl<W: io::Write> Output for StreamOutput<W> {
    fn write_text(&mut self, text: &str) {
        self.write_bytes(text.as_bytes());
    }

    fn write_value(&mut self, value: &Value) {
        self.write_bytes(format!("{:?}", value).as_bytes());
    }
}
