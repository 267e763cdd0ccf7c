//! Bytecode interpreter.
//!
//! One dispatch loop executes a chunk against a caller-supplied scope and
//! output sink. The interpreter holds no state between calls; everything
//! lives on a per-call operand stack and iterator stack, so one chunk can be
//! executed from any number of threads at once.
//!
//! Execution never fails: undefined symbols, missing keys, non-callable
//! targets and failing callables all resolve to the void value. The only
//! exit paths are the `Return` opcode and falling off the end of the
//! instruction stream (which yields void).

use crate::function::TemplateFunction;
use smallvec::SmallVec;
use std::sync::Arc;
use weft_compiler::{Chunk, Opcode};
use weft_core::{Function, MapValue, Output, Scope, Value};

/// In-flight iteration over a map view's entries.
struct FieldIter {
    map: MapValue,
    index: usize,
}

/// Execute a compiled chunk.
///
/// The returned value is the argument of an executed `Return`, or void when
/// execution fell through the final command.
pub fn execute(chunk: &Chunk, scope: &mut dyn Scope, output: &mut dyn Output) -> Value {
    let mut stack: SmallVec<[Value; 16]> = SmallVec::new();
    let mut iterators: Vec<FieldIter> = Vec::new();
    // Scope frames entered by loop bodies and not yet left; unwound on
    // `Return` so the caller gets its scope back at the depth it gave us.
    let mut entered_frames = 0usize;
    let mut pc = 0usize;

    while let Some(instruction) = chunk.instructions.get(pc) {
        pc += 1;

        match instruction.opcode() {
            Opcode::LoadConst => {
                stack.push(chunk.values[instruction.operand() as usize].clone());
            }

            Opcode::LoadVoid => stack.push(Value::Void),

            Opcode::LoadSymbol => {
                let name = &chunk.strings[instruction.operand() as usize];
                stack.push(scope.get(name).unwrap_or(Value::Void));
            }

            Opcode::GetField => {
                let subscript = pop(&mut stack);
                let source = pop(&mut stack);
                stack.push(source.field(&subscript).unwrap_or(Value::Void));
            }

            Opcode::MakeMap => {
                let count = instruction.operand() as usize;
                let mut pairs = vec![(Value::Void, Value::Void); count];
                for slot in pairs.iter_mut().rev() {
                    slot.1 = pop(&mut stack);
                    slot.0 = pop(&mut stack);
                }
                stack.push(Value::Map(MapValue::from_pairs(pairs)));
            }

            Opcode::MakeFunction => {
                let function = &chunk.functions[instruction.operand() as usize];
                stack.push(Value::Function(Arc::new(TemplateFunction::new(
                    function.clone(),
                ))));
            }

            Opcode::BeginCall => {
                let target = pop(&mut stack);
                if target.as_function().is_some() {
                    stack.push(target);
                } else {
                    stack.push(Value::Void);
                    pc = instruction.operand() as usize;
                }
            }

            Opcode::Call => {
                let count = instruction.operand() as usize;
                let mut arguments: SmallVec<[Value; 8]> = SmallVec::new();
                arguments.resize(count, Value::Void);
                for slot in arguments.iter_mut().rev() {
                    *slot = pop(&mut stack);
                }
                let target = pop(&mut stack);

                let result = match target.as_function() {
                    Some(function) => match function.execute(&arguments, scope, output) {
                        Ok(value) => value,
                        Err(fault) => {
                            // Containment boundary: a failing callable must
                            // not abort the surrounding render.
                            log::debug!(
                                "function '{}' failed, substituting void: {}",
                                function.name(),
                                fault
                            );
                            Value::Void
                        }
                    },
                    None => Value::Void,
                };
                stack.push(result);
            }

            Opcode::EmitText => {
                output.write_text(&chunk.strings[instruction.operand() as usize]);
            }

            Opcode::EmitValue => {
                let value = pop(&mut stack);
                output.write_text(&value.to_display());
            }

            Opcode::EmitDump => {
                let value = pop(&mut stack);
                output.write_value(&value);
            }

            Opcode::StoreSymbol => {
                let value = pop(&mut stack);
                scope.set(&chunk.strings[instruction.operand() as usize], value);
            }

            Opcode::BindSymbol => {
                let value = pop(&mut stack);
                scope.define(&chunk.strings[instruction.operand() as usize], value);
            }

            Opcode::EnterScope => {
                scope.enter();
                entered_frames += 1;
            }

            Opcode::LeaveScope => {
                scope.leave();
                entered_frames -= 1;
            }

            Opcode::IterInit => {
                let source = pop(&mut stack);
                match source.fields() {
                    Some(map) if !map.is_empty() => iterators.push(FieldIter {
                        map: map.clone(),
                        index: 0,
                    }),
                    _ => pc = instruction.operand() as usize,
                }
            }

            Opcode::IterNext => {
                let iterator = iterators.last_mut().expect("iterator stack underflow");
                match iterator.map.pair(iterator.index) {
                    Some((key, value)) => {
                        iterator.index += 1;
                        stack.push(key);
                        stack.push(value);
                    }
                    None => {
                        iterators.pop();
                        pc = instruction.operand() as usize;
                    }
                }
            }

            Opcode::Pop => {
                pop(&mut stack);
            }

            Opcode::Jump => pc = instruction.operand() as usize,

            Opcode::JumpIfFalse => {
                let value = pop(&mut stack);
                if !value.is_truthy() {
                    pc = instruction.operand() as usize;
                }
            }

            Opcode::Return => {
                let result = pop(&mut stack);
                for _ in 0..entered_frames {
                    scope.leave();
                }
                return result;
            }
        }
    }

    Value::Void
}

#[inline]
fn pop(stack: &mut SmallVec<[Value; 16]>) -> Value {
    stack.pop().expect("operand stack underflow")
}
