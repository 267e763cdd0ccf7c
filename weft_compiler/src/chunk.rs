//! Compiled chunk representation.
//!
//! A [`Chunk`] is the executable artifact of compilation: the instruction
//! stream plus the frozen constant pools and any nested function bodies.
//! Chunks are immutable once built and can be shared across threads.

use std::fmt;
use std::sync::Arc;
use weft_core::Value;

/// Bytecode operation.
///
/// The machine is stack-based: expressions leave exactly one value on the
/// operand stack, commands leave none. `operand` meanings are listed per
/// opcode; unused operands are zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    /// Push `values[operand]`.
    LoadConst,
    /// Push the void value.
    LoadVoid,
    /// Push the value bound to `strings[operand]`, or void when unbound.
    LoadSymbol,
    /// Pop subscript then source; push the looked-up field, or void.
    GetField,
    /// Pop `2 * operand` values and push a map built from the pairs.
    MakeMap,
    /// Push a callable for `functions[operand]`.
    MakeFunction,
    /// Pop the call target; push it back if callable, else push void and
    /// jump to `operand`, skipping argument evaluation.
    BeginCall,
    /// Pop `operand` arguments and the callable below them; push the call
    /// result, or void when the callable fails.
    Call,
    /// Write `strings[operand]` to the output.
    EmitText,
    /// Pop a value and write its display form to the output.
    EmitValue,
    /// Pop a value and write its raw form to the output.
    EmitDump,
    /// Pop a value and rebind `strings[operand]` in the closest frame.
    StoreSymbol,
    /// Pop a value and define `strings[operand]` in the innermost frame.
    BindSymbol,
    /// Enter a child scope frame.
    EnterScope,
    /// Leave the innermost scope frame.
    LeaveScope,
    /// Pop the iteration source; start iterating its map view, or jump to
    /// `operand` when the view is empty.
    IterInit,
    /// Push the next entry's key then value, or end iteration and jump to
    /// `operand`.
    IterNext,
    /// Pop and discard the top of stack.
    Pop,
    /// Jump to `operand`.
    Jump,
    /// Pop a value; jump to `operand` when it is falsy.
    JumpIfFalse,
    /// Pop the chunk's result value and stop execution.
    Return,
}

/// A single instruction: opcode plus immediate operand.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    opcode: Opcode,
    operand: u32,
}

impl Instruction {
    /// Create an instruction with an operand.
    #[inline]
    pub fn new(opcode: Opcode, operand: u32) -> Self {
        Self { opcode, operand }
    }

    /// Create an instruction without an operand.
    #[inline]
    pub fn op(opcode: Opcode) -> Self {
        Self::new(opcode, 0)
    }

    /// The instruction's opcode.
    #[inline]
    pub fn opcode(self) -> Opcode {
        self.opcode
    }

    /// The instruction's operand.
    #[inline]
    pub fn operand(self) -> u32 {
        self.operand
    }

    /// Replace the operand (used when patching forward jumps).
    #[inline]
    pub(crate) fn with_operand(self, operand: u32) -> Self {
        Self { operand, ..self }
    }
}

impl fmt::Debug for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {}", self.opcode, self.operand)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.opcode {
            Opcode::LoadVoid
            | Opcode::GetField
            | Opcode::EmitValue
            | Opcode::EmitDump
            | Opcode::EnterScope
            | Opcode::LeaveScope
            | Opcode::Pop
            | Opcode::Return => write!(f, "{:?}", self.opcode),
            _ => write!(f, "{:?} {}", self.opcode, self.operand),
        }
    }
}

/// A compiled `set name(params) to:` body attached to its defining chunk.
#[derive(Debug, Clone)]
pub struct CompiledFunction {
    /// Function name, for diagnostics.
    pub name: Arc<str>,
    /// Parameter names bound positionally at call time.
    pub parameters: Box<[Arc<str>]>,
    /// Compiled body.
    pub chunk: Arc<Chunk>,
}

/// An immutable compiled template unit.
///
/// Contains everything a render needs: instructions, the frozen string and
/// value pools, and the compiled bodies of functions the unit defines.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Unit name (`<template>` for a document root).
    pub name: Arc<str>,
    /// Instruction stream.
    pub instructions: Box<[Instruction]>,
    /// Interned literal strings (literal text and symbol names).
    pub strings: Box<[Arc<str>]>,
    /// Interned literal values.
    pub values: Box<[Value]>,
    /// Compiled nested function bodies.
    pub functions: Box<[CompiledFunction]>,
}

/// Disassemble a chunk to a string, nested functions included.
pub fn disassemble(chunk: &Chunk) -> String {
    use std::fmt::Write;

    let mut output = String::new();
    write_chunk(&mut output, chunk, 0);

    fn write_chunk(output: &mut String, chunk: &Chunk, depth: usize) {
        let pad = "  ".repeat(depth);
        let _ = writeln!(output, "{}chunk {}:", pad, chunk.name);

        if !chunk.strings.is_empty() {
            let _ = writeln!(output, "{}  strings:", pad);
            for (i, s) in chunk.strings.iter().enumerate() {
                let _ = writeln!(output, "{}    {:4}: {:?}", pad, i, s);
            }
        }
        if !chunk.values.is_empty() {
            let _ = writeln!(output, "{}  values:", pad);
            for (i, v) in chunk.values.iter().enumerate() {
                let _ = writeln!(output, "{}    {:4}: {:?}", pad, i, v);
            }
        }

        let _ = writeln!(output, "{}  code:", pad);
        for (i, inst) in chunk.instructions.iter().enumerate() {
            let _ = writeln!(output, "{}    {:4}: {}", pad, i, inst);
        }

        for function in chunk.functions.iter() {
            let _ = writeln!(
                output,
                "{}  function {}({}):",
                pad,
                function.name,
                function.parameters.join(", ")
            );
            write_chunk(output, &function.chunk, depth + 2);
        }
    }

    output
}
