//! Construct-once, render-many documents.
//!
//! A [`Document`] parses and compiles its template exactly once; every
//! render afterwards only executes the frozen chunk. Documents are immutable
//! and may be rendered from any number of threads concurrently, provided
//! each call supplies its own scope and output instances.

use crate::interpreter;
use weft_compiler::{Chunk, Compiler};
use weft_core::{Output, ParseError, Scope, StringOutput, Value};
use weft_parser::Settings;

/// A compiled template.
#[derive(Debug)]
pub struct Document {
    root: Chunk,
}

impl Document {
    /// Parse and compile template source.
    ///
    /// Fails only when the source does not parse; compilation of a
    /// well-formed AST defines no failure modes.
    pub fn new(source: &str, settings: &Settings) -> Result<Self, ParseError> {
        let root_command = weft_parser::parse(source, settings)?;
        let root = Compiler::compile(&root_command, settings.trimmer);
        Ok(Self { root })
    }

    /// Parse and compile with default settings.
    pub fn with_defaults(source: &str) -> Result<Self, ParseError> {
        Self::new(source, &Settings::default())
    }

    /// Render against a scope and output sink.
    ///
    /// Never fails: recoverable conditions render as void and the result is
    /// the argument of an executed `return`, or void.
    pub fn render(&self, scope: &mut dyn Scope, output: &mut dyn Output) -> Value {
        interpreter::execute(&self.root, scope, output)
    }

    /// Render into a fresh string, returning the result value and output.
    pub fn render_to_string(&self, scope: &mut dyn Scope) -> (Value, String) {
        let mut output = StringOutput::new();
        let result = self.render(scope, &mut output);
        (result, output.into_string())
    }

    /// The document's compiled root chunk.
    pub fn chunk(&self) -> &Chunk {
        &self.root
    }
}
