//! Callable values.
//!
//! Functions are the only extension point a template can call back into: a
//! value with a callable view is invoked with the evaluated arguments, the
//! current scope and the output sink. Failure is reported with
//! [`RenderFault`] and contained by the caller — it never aborts a render.

use crate::error::RenderFault;
use crate::output::Output;
use crate::scope::Scope;
use crate::value::Value;
use std::sync::Arc;

/// The callable view of a value.
pub trait Function: Send + Sync {
    /// Invoke the function.
    fn execute(
        &self,
        arguments: &[Value],
        scope: &mut dyn Scope,
        output: &mut dyn Output,
    ) -> Result<Value, RenderFault>;

    /// Name used in diagnostic output.
    fn name(&self) -> &str {
        "<anonymous>"
    }
}

type NativeBody =
    dyn Fn(&[Value], &mut dyn Scope, &mut dyn Output) -> Result<Value, RenderFault> + Send + Sync;

/// A host-provided function wrapping a Rust closure.
pub struct NativeFunction {
    name: Arc<str>,
    body: Box<NativeBody>,
}

impl NativeFunction {
    /// Wrap a closure with access to the full invocation context.
    pub fn new(
        name: impl Into<Arc<str>>,
        body: impl Fn(&[Value], &mut dyn Scope, &mut dyn Output) -> Result<Value, RenderFault>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            body: Box::new(body),
        }
    }

    /// Wrap a closure over the argument list alone.
    pub fn simple(
        name: impl Into<Arc<str>>,
        body: impl Fn(&[Value]) -> Result<Value, RenderFault> + Send + Sync + 'static,
    ) -> Self {
        Self::new(name, move |arguments, _, _| body(arguments))
    }
}

impl Function for NativeFunction {
    fn execute(
        &self,
        arguments: &[Value],
        scope: &mut dyn Scope,
        output: &mut dyn Output,
    ) -> Result<Value, RenderFault> {
        (self.body)(arguments, scope, output)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::StringOutput;
    use crate::scope::SimpleScope;

    #[test]
    fn test_native_function() {
        let double = NativeFunction::simple("double", |arguments| {
            match arguments.first() {
                Some(Value::Number(n)) => Ok(Value::number(n * 2.0)),
                _ => Err(RenderFault::new("expected a number")),
            }
        });

        let mut scope = SimpleScope::new();
        let mut output = StringOutput::new();

        let result = double
            .execute(&[Value::number(21.0)], &mut scope, &mut output)
            .unwrap();
        assert_eq!(result, Value::number(42.0));

        assert!(double.execute(&[], &mut scope, &mut output).is_err());
    }
}
