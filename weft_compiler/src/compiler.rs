//! AST to bytecode compiler.
//!
//! The compiler reads the command tree once, top to bottom, and emits
//! instructions through a [`ChunkBuilder`]. Expressions compile to code that
//! leaves exactly one value on the operand stack; commands compile to code
//! with output/scope effects and no stack residue.
//!
//! Compilation defines no failure modes: every recoverable render-time
//! condition (undefined symbol, missing key, non-callable target, failing
//! callable) is compiled down to a void-producing path, and a well-formed
//! AST always lowers.

use crate::builder::ChunkBuilder;
use crate::chunk::{Chunk, CompiledFunction};
use std::sync::Arc;
use weft_parser::ast::{Branch, Command, Expression};
use weft_parser::trim::Trimmer;

/// Bytecode compiler for one chunk.
pub struct Compiler {
    builder: ChunkBuilder,
    trimmer: Trimmer,
}

impl Compiler {
    /// Compile a template's root command into an executable chunk.
    pub fn compile(root: &Command, trimmer: Trimmer) -> Chunk {
        let chunk = Self::compile_chunk("<template>", root, trimmer);
        log::trace!(
            "compiled {}: {} instructions, {} strings, {} values, {} functions",
            chunk.name,
            chunk.instructions.len(),
            chunk.strings.len(),
            chunk.values.len(),
            chunk.functions.len(),
        );
        chunk
    }

    fn compile_chunk(name: impl Into<Arc<str>>, root: &Command, trimmer: Trimmer) -> Chunk {
        let mut compiler = Compiler {
            builder: ChunkBuilder::new(name),
            trimmer,
        };

        compiler.compile_command(root);

        // Falling through the final command yields void.
        compiler.builder.emit_load_void();
        compiler.builder.emit_return();

        compiler.builder.finish()
    }

    // =========================================================================
    // Commands
    // =========================================================================

    fn compile_command(&mut self, command: &Command) {
        match command {
            Command::Composite { body, next } => {
                self.compile_command(body);
                self.compile_command(next);
            }

            Command::Literal { text } => {
                // Trimming happens once here, not per render.
                let trimmed = (self.trimmer)(text);
                if !trimmed.is_empty() {
                    let index = self.builder.intern_string(&trimmed);
                    self.builder.emit_text(index);
                }
            }

            Command::Echo { source } => {
                self.compile_expression(source);
                self.builder.emit_value();
            }

            Command::Dump { source } => {
                self.compile_expression(source);
                self.builder.emit_dump();
            }

            Command::Return { source } => {
                self.compile_expression(source);
                self.builder.emit_return();
            }

            Command::AssignValue { name, source } => {
                self.compile_expression(source);
                let index = self.builder.intern_string(name);
                self.builder.emit_store_symbol(index);
            }

            Command::AssignFunction {
                name,
                parameters,
                body,
            } => {
                let function = CompiledFunction {
                    name: name.clone(),
                    parameters: parameters.clone(),
                    chunk: Arc::new(Self::compile_chunk(name.clone(), body, self.trimmer)),
                };
                let function_index = self.builder.add_function(function);
                self.builder.emit_make_function(function_index);
                let index = self.builder.intern_string(name);
                self.builder.emit_store_symbol(index);
            }

            Command::If { branches, fallback } => self.compile_if(branches, fallback.as_deref()),

            Command::For {
                key,
                value,
                source,
                body,
                empty,
            } => self.compile_for(key, value.as_deref(), source, body, empty.as_deref()),

            Command::While { condition, body } => {
                let head = self.builder.create_label();
                let end = self.builder.create_label();

                self.builder.bind_label(head);
                self.compile_expression(condition);
                self.builder.emit_jump_if_false(end);
                self.compile_command(body);
                self.builder.emit_jump(head);
                self.builder.bind_label(end);
            }
        }
    }

    fn compile_if(&mut self, branches: &[Branch], fallback: Option<&Command>) {
        let end = self.builder.create_label();

        for branch in branches {
            let next = self.builder.create_label();

            self.compile_expression(&branch.condition);
            self.builder.emit_jump_if_false(next);
            self.compile_command(&branch.body);
            self.builder.emit_jump(end);
            self.builder.bind_label(next);
        }

        if let Some(fallback) = fallback {
            self.compile_command(fallback);
        }

        self.builder.bind_label(end);
    }

    fn compile_for(
        &mut self,
        key: &str,
        value: Option<&str>,
        source: &Expression,
        body: &Command,
        empty: Option<&Command>,
    ) {
        let head = self.builder.create_label();
        let done = self.builder.create_label();
        let empty_label = self.builder.create_label();
        let end = self.builder.create_label();

        let key_index = self.builder.intern_string(key);
        let value_index = value.map(|value| self.builder.intern_string(value));

        self.compile_expression(source);
        self.builder.emit_iter_init(empty_label);

        self.builder.bind_label(head);
        self.builder.emit_iter_next(done);

        // Each iteration binds loop variables in a fresh frame.
        self.builder.emit_enter_scope();
        match value_index {
            Some(value_index) => {
                self.builder.emit_bind_symbol(value_index);
                self.builder.emit_bind_symbol(key_index);
            }
            None => {
                self.builder.emit_pop();
                self.builder.emit_bind_symbol(key_index);
            }
        }
        self.compile_command(body);
        self.builder.emit_leave_scope();
        self.builder.emit_jump(head);

        self.builder.bind_label(done);
        self.builder.emit_jump(end);

        self.builder.bind_label(empty_label);
        if let Some(empty) = empty {
            self.compile_command(empty);
        }

        self.builder.bind_label(end);
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn compile_expression(&mut self, expression: &Expression) {
        match expression {
            Expression::Constant(value) => {
                let index = self.builder.intern_value(value.clone());
                self.builder.emit_load_const(index);
            }

            Expression::Symbol(name) => {
                let index = self.builder.intern_string(name);
                self.builder.emit_load_symbol(index);
            }

            Expression::Access { source, subscript } => {
                self.compile_expression(source);
                self.compile_expression(subscript);
                self.builder.emit_get_field();
            }

            Expression::Invoke { source, arguments } => {
                let skip = self.builder.create_label();

                self.compile_expression(source);
                // A non-callable target skips argument evaluation entirely.
                self.builder.emit_begin_call(skip);
                for argument in arguments.iter() {
                    self.compile_expression(argument);
                }
                self.builder.emit_call(arguments.len() as u32);
                self.builder.bind_label(skip);
            }

            Expression::Map { elements } => {
                for (key, value) in elements.iter() {
                    self.compile_expression(key);
                    self.compile_expression(value);
                }
                self.builder.emit_make_map(elements.len() as u32);
            }

            Expression::Void => self.builder.emit_load_void(),
        }
    }
}
