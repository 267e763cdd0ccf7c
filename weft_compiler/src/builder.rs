//! Chunk construction.
//!
//! `ChunkBuilder` provides the emission API used by the compiler: typed
//! `emit_*` helpers, labels with forward-reference patching, and access to
//! the growing constant pool. `finish()` resolves every label and freezes
//! the chunk.

use crate::allocator::Allocator;
use crate::chunk::{Chunk, CompiledFunction, Instruction, Opcode};
use rustc_hash::FxHashMap;
use std::sync::Arc;
use weft_core::Value;

/// A jump target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Label(u32);

/// A jump emitted before its target was bound.
#[derive(Debug)]
struct ForwardRef {
    /// Instruction index containing the jump.
    instruction_index: usize,
    /// The label being jumped to.
    label: Label,
}

/// Builder for compiled chunks.
pub struct ChunkBuilder {
    name: Arc<str>,
    instructions: Vec<Instruction>,
    allocator: Allocator,
    functions: Vec<CompiledFunction>,
    next_label: u32,
    labels: FxHashMap<Label, usize>,
    forward_refs: Vec<ForwardRef>,
}

impl ChunkBuilder {
    /// Create a builder for a named chunk.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            instructions: Vec::new(),
            allocator: Allocator::new(),
            functions: Vec::new(),
            next_label: 0,
            labels: FxHashMap::default(),
            forward_refs: Vec::new(),
        }
    }

    // =========================================================================
    // Constant Pool
    // =========================================================================

    /// Intern a literal string.
    pub fn intern_string(&mut self, literal: &str) -> u32 {
        self.allocator.alloc_string(literal)
    }

    /// Intern a literal value.
    pub fn intern_value(&mut self, literal: Value) -> u32 {
        self.allocator.alloc_value(literal)
    }

    /// Attach a compiled function body, returning its index.
    pub fn add_function(&mut self, function: CompiledFunction) -> u32 {
        let index = self.functions.len() as u32;
        self.functions.push(function);
        index
    }

    /// Number of emitted instructions so far.
    pub fn instruction_count(&self) -> usize {
        self.instructions.len()
    }

    // =========================================================================
    // Labels
    // =========================================================================

    /// Create a new label for a jump target.
    pub fn create_label(&mut self) -> Label {
        let label = Label(self.next_label);
        self.next_label += 1;
        label
    }

    /// Mark the current position as the target for a label.
    pub fn bind_label(&mut self, label: Label) {
        self.labels.insert(label, self.instructions.len());
    }

    // =========================================================================
    // Emission
    // =========================================================================

    #[inline]
    fn emit(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    fn emit_jump_to(&mut self, opcode: Opcode, label: Label) {
        let instruction_index = self.instructions.len();
        self.emit(Instruction::op(opcode));
        self.forward_refs.push(ForwardRef {
            instruction_index,
            label,
        });
    }

    /// Push an interned value.
    pub fn emit_load_const(&mut self, index: u32) {
        self.emit(Instruction::new(Opcode::LoadConst, index));
    }

    /// Push the void value.
    pub fn emit_load_void(&mut self) {
        self.emit(Instruction::op(Opcode::LoadVoid));
    }

    /// Push a scope lookup result.
    pub fn emit_load_symbol(&mut self, index: u32) {
        self.emit(Instruction::new(Opcode::LoadSymbol, index));
    }

    /// Pop subscript and source, push the field lookup result.
    pub fn emit_get_field(&mut self) {
        self.emit(Instruction::op(Opcode::GetField));
    }

    /// Pop `count` key/value pairs, push a map.
    pub fn emit_make_map(&mut self, count: u32) {
        self.emit(Instruction::new(Opcode::MakeMap, count));
    }

    /// Push a callable for an attached function body.
    pub fn emit_make_function(&mut self, index: u32) {
        self.emit(Instruction::new(Opcode::MakeFunction, index));
    }

    /// Pop the call target; jump to `skip` with void pushed when it is not
    /// callable.
    pub fn emit_begin_call(&mut self, skip: Label) {
        self.emit_jump_to(Opcode::BeginCall, skip);
    }

    /// Pop arguments and callable, push the invocation result.
    pub fn emit_call(&mut self, argument_count: u32) {
        self.emit(Instruction::new(Opcode::Call, argument_count));
    }

    /// Write an interned string to the output.
    pub fn emit_text(&mut self, index: u32) {
        self.emit(Instruction::new(Opcode::EmitText, index));
    }

    /// Pop a value, write its display form.
    pub fn emit_value(&mut self) {
        self.emit(Instruction::op(Opcode::EmitValue));
    }

    /// Pop a value, write its raw form.
    pub fn emit_dump(&mut self) {
        self.emit(Instruction::op(Opcode::EmitDump));
    }

    /// Pop a value, rebind a symbol in the closest holding frame.
    pub fn emit_store_symbol(&mut self, index: u32) {
        self.emit(Instruction::new(Opcode::StoreSymbol, index));
    }

    /// Pop a value, define a symbol in the innermost frame.
    pub fn emit_bind_symbol(&mut self, index: u32) {
        self.emit(Instruction::new(Opcode::BindSymbol, index));
    }

    /// Enter a child scope frame.
    pub fn emit_enter_scope(&mut self) {
        self.emit(Instruction::op(Opcode::EnterScope));
    }

    /// Leave the innermost scope frame.
    pub fn emit_leave_scope(&mut self) {
        self.emit(Instruction::op(Opcode::LeaveScope));
    }

    /// Pop the iteration source, jumping to `empty` when there is nothing to
    /// iterate.
    pub fn emit_iter_init(&mut self, empty: Label) {
        self.emit_jump_to(Opcode::IterInit, empty);
    }

    /// Advance the innermost iteration, jumping to `done` when exhausted.
    pub fn emit_iter_next(&mut self, done: Label) {
        self.emit_jump_to(Opcode::IterNext, done);
    }

    /// Pop and discard the top of stack.
    pub fn emit_pop(&mut self) {
        self.emit(Instruction::op(Opcode::Pop));
    }

    /// Unconditional jump.
    pub fn emit_jump(&mut self, label: Label) {
        self.emit_jump_to(Opcode::Jump, label);
    }

    /// Pop a value, jump when it is falsy.
    pub fn emit_jump_if_false(&mut self, label: Label) {
        self.emit_jump_to(Opcode::JumpIfFalse, label);
    }

    /// Pop the result value and stop execution.
    pub fn emit_return(&mut self) {
        self.emit(Instruction::op(Opcode::Return));
    }

    // =========================================================================
    // Finalization
    // =========================================================================

    /// Patch forward references and freeze the chunk.
    pub fn finish(mut self) -> Chunk {
        for forward in self.forward_refs {
            let target = self.labels.get(&forward.label).expect("unbound label");
            let old = self.instructions[forward.instruction_index];
            self.instructions[forward.instruction_index] = old.with_operand(*target as u32);
        }

        let (strings, values) = self.allocator.freeze();

        Chunk {
            name: self.name,
            instructions: self.instructions.into_boxed_slice(),
            strings,
            values,
            functions: self.functions.into_boxed_slice(),
        }
    }
}
