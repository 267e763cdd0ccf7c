//! Engine settings.

use crate::trim::{trim_first_and_last_blank_lines, Trimmer};

/// Parser and compiler configuration.
///
/// Delimiters are arbitrary non-empty strings; the defaults give the
/// `{command}` / `{if c: a |else: b}` surface syntax.
#[derive(Clone)]
pub struct Settings {
    /// Sequence opening a code block.
    pub block_begin: String,
    /// Sequence separating the sections of a block (`elif`, `else`, `empty`).
    pub block_continue: String,
    /// Sequence closing a code block.
    pub block_end: String,
    /// Trimmer applied to every literal at compile time.
    pub trimmer: Trimmer,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            block_begin: "{".to_string(),
            block_continue: "|".to_string(),
            block_end: "}".to_string(),
            trimmer: trim_first_and_last_blank_lines,
        }
    }
}

impl Settings {
    /// Default delimiters with a different trimmer.
    pub fn with_trimmer(trimmer: Trimmer) -> Self {
        Self {
            trimmer,
            ..Self::default()
        }
    }
}
