//! # Weft Compiler
//!
//! Lowers the template AST into compact bytecode executed by `weft_vm`.
//! Compilation happens once per document:
//!
//! 1. **Allocation**: literal strings and values are interned into the
//!    constant pool ([`Allocator`]) and referenced by index.
//! 2. **Emission**: [`Compiler`] walks the command tree, emitting
//!    instructions through a [`ChunkBuilder`] (labels, forward references).
//! 3. **Freezing**: `finish()` patches jumps and produces an immutable
//!    [`Chunk`] shared by every future render.

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

pub mod allocator;
pub mod builder;
pub mod chunk;
pub mod compiler;

pub use allocator::Allocator;
pub use builder::{ChunkBuilder, Label};
pub use chunk::{disassemble, Chunk, CompiledFunction, Instruction, Opcode};
pub use compiler::Compiler;
