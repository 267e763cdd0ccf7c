//! Callables backed by compiled template code.

use crate::interpreter;
use weft_compiler::CompiledFunction;
use weft_core::{Function, Output, RenderFault, Scope, Value};

/// A function defined by `set name(params) to:` inside a template.
///
/// Invocation runs the compiled body against a child frame of the calling
/// scope. Arity mismatches degrade gracefully: missing trailing parameters
/// bind to void and extra trailing arguments are ignored.
pub struct TemplateFunction {
    inner: CompiledFunction,
}

impl TemplateFunction {
    /// Wrap a compiled function body.
    pub fn new(inner: CompiledFunction) -> Self {
        Self { inner }
    }
}

impl Function for TemplateFunction {
    fn execute(
        &self,
        arguments: &[Value],
        scope: &mut dyn Scope,
        output: &mut dyn Output,
    ) -> Result<Value, RenderFault> {
        scope.enter();
        for (position, parameter) in self.inner.parameters.iter().enumerate() {
            let value = arguments.get(position).cloned().unwrap_or(Value::Void);
            scope.define(parameter, value);
        }

        let result = interpreter::execute(&self.inner.chunk, scope, output);
        scope.leave();

        Ok(result)
    }

    fn name(&self) -> &str {
        &self.inner.name
    }
}
