//! Abstract syntax tree for templates.
//!
//! A parsed template is a single [`Command`] tree; statement sequences are
//! represented as right-leaning [`Command::Composite`] chains. The tree is
//! immutable — the compiler reads it once, top to bottom, and does not
//! retain it.

use std::sync::Arc;
use weft_core::Value;

/// A statement node: produces output and/or mutates scope.
#[derive(Debug, Clone)]
pub enum Command {
    /// Bind a compiled function to a symbol.
    AssignFunction {
        /// Target symbol.
        name: Arc<str>,
        /// Parameter names, in declaration order.
        parameters: Box<[Arc<str>]>,
        /// Function body.
        body: Box<Command>,
    },
    /// Bind the result of an expression to a symbol.
    AssignValue {
        /// Target symbol.
        name: Arc<str>,
        /// Bound expression.
        source: Expression,
    },
    /// Two commands in sequence.
    Composite {
        /// First command.
        body: Box<Command>,
        /// Second command.
        next: Box<Command>,
    },
    /// Write an expression's raw representation to the output.
    Dump {
        /// Dumped expression.
        source: Expression,
    },
    /// Write an expression's display form to the output.
    Echo {
        /// Echoed expression.
        source: Expression,
    },
    /// Iterate a map's entries.
    For {
        /// Symbol bound to each entry's key.
        key: Arc<str>,
        /// Symbol bound to each entry's value, if requested.
        value: Option<Arc<str>>,
        /// Iterated expression.
        source: Expression,
        /// Per-entry body.
        body: Box<Command>,
        /// Body executed instead of the loop when the map view is empty.
        empty: Option<Box<Command>>,
    },
    /// Conditional branches with an optional fallback.
    If {
        /// Branches tried in order; the first truthy condition wins.
        branches: Box<[Branch]>,
        /// Body executed when no branch matches.
        fallback: Option<Box<Command>>,
    },
    /// Raw template text.
    Literal {
        /// Text as it appeared in the source, before trimming.
        text: Arc<str>,
    },
    /// Stop rendering with a result value.
    Return {
        /// Result expression.
        source: Expression,
    },
    /// Pre-condition loop.
    While {
        /// Loop condition.
        condition: Expression,
        /// Loop body.
        body: Box<Command>,
    },
}

/// One `if`/`elif` arm.
#[derive(Debug, Clone)]
pub struct Branch {
    /// Branch condition.
    pub condition: Expression,
    /// Branch body.
    pub body: Command,
}

/// A value-producing node.
#[derive(Debug, Clone)]
pub enum Expression {
    /// Subscript lookup in the source's map view.
    Access {
        /// Looked-up expression.
        source: Box<Expression>,
        /// Key expression.
        subscript: Box<Expression>,
    },
    /// Literal value.
    Constant(Value),
    /// Function invocation.
    Invoke {
        /// Call target.
        source: Box<Expression>,
        /// Arguments, evaluated left to right.
        arguments: Box<[Expression]>,
    },
    /// Map construction.
    Map {
        /// Key/value pairs, evaluated in declaration order.
        elements: Box<[(Expression, Expression)]>,
    },
    /// Scope lookup.
    Symbol(Arc<str>),
    /// The void value.
    Void,
}

impl Command {
    /// Chain commands into a right-leaning composite.
    pub fn sequence(commands: Vec<Command>) -> Command {
        let mut result: Option<Command> = None;
        for command in commands.into_iter().rev() {
            result = Some(match result {
                Some(next) => Command::Composite {
                    body: Box::new(command),
                    next: Box::new(next),
                },
                None => command,
            });
        }
        result.unwrap_or(Command::Literal { text: "".into() })
    }
}
