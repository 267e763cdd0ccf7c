//! Error types for the two failure surfaces of the engine.
//!
//! Parsing is the only construction-time failure mode; rendering has none.
//! Callables invoked during rendering report failure with [`RenderFault`],
//! which the compiled unit contains and converts to the void value.

use std::fmt;

/// Template parse error.
#[derive(Debug, Clone)]
pub struct ParseError {
    /// Error message.
    pub message: String,
    /// Line number (1-indexed).
    pub line: u32,
    /// Column number (1-indexed).
    pub column: u32,
}

impl ParseError {
    /// Create a new parse error.
    pub fn new(message: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            message: message.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.column, self.message)
    }
}

impl std::error::Error for ParseError {}

/// Failure reported by a callable value during rendering.
///
/// A fault never escapes a render call: the interpreter replaces the failing
/// invocation's result with void and keeps going.
#[derive(Debug, Clone)]
pub struct RenderFault {
    /// Description of the failure.
    pub message: String,
}

impl RenderFault {
    /// Create a new fault.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for RenderFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for RenderFault {}
