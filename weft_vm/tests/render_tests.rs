//! End-to-end rendering tests.

use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;
use weft_compiler::Compiler;
use weft_core::{NativeFunction, RenderFault, Scope, SimpleScope, StringOutput, Value};
use weft_parser::ast::{Branch, Command, Expression};
use weft_parser::trim::trim_nothing;
use weft_vm::{execute, Document};

fn render_source(source: &str, scope: &mut SimpleScope) -> (Value, String) {
    Document::with_defaults(source)
        .expect("parse failed")
        .render_to_string(scope)
}

fn counting_function(name: &str) -> (Value, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let recorder = calls.clone();
    let function = NativeFunction::simple(name.to_string(), move |_| {
        recorder.fetch_add(1, Ordering::SeqCst);
        Ok(Value::Void)
    });
    (Value::function(function), calls)
}

// =============================================================================
// AST-Level Contracts
// =============================================================================

#[test]
fn test_literal_echo_concatenation() {
    let root = Command::Composite {
        body: Box::new(Command::Literal { text: "Hi ".into() }),
        next: Box::new(Command::Echo {
            source: Expression::Symbol("name".into()),
        }),
    };
    let chunk = Compiler::compile(&root, trim_nothing);

    let mut scope = SimpleScope::new();
    scope.set("name", Value::string("Ann"));
    let mut output = StringOutput::new();

    let result = execute(&chunk, &mut scope, &mut output);
    assert!(result.is_void());
    assert_eq!(output.as_str(), "Hi Ann");
}

#[test]
fn test_return_constant() {
    let root = Command::Return {
        source: Expression::Constant(Value::number(42.0)),
    };
    let chunk = Compiler::compile(&root, trim_nothing);

    let mut scope = SimpleScope::new();
    let mut output = StringOutput::new();

    let result = execute(&chunk, &mut scope, &mut output);
    assert_eq!(result, Value::number(42.0));
    assert_eq!(output.as_str(), "");
}

#[test]
fn test_if_false_renders_fallback() {
    let root = Command::If {
        branches: Box::new([Branch {
            condition: Expression::Constant(Value::boolean(false)),
            body: Command::Literal { text: "A".into() },
        }]),
        fallback: Some(Box::new(Command::Literal { text: "B".into() })),
    };
    let chunk = Compiler::compile(&root, trim_nothing);

    let mut scope = SimpleScope::new();
    let mut output = StringOutput::new();

    execute(&chunk, &mut scope, &mut output);
    assert_eq!(output.as_str(), "B");
}

// =============================================================================
// Void Fallbacks
// =============================================================================

#[test]
fn test_undefined_symbol_renders_empty() {
    let mut scope = SimpleScope::new();
    let (result, output) = render_source("[{missing}]", &mut scope);
    assert!(result.is_void());
    assert_eq!(output, "[]");
}

#[test]
fn test_access_missing_key_yields_void() {
    let mut scope = SimpleScope::new();
    scope.set(
        "m",
        Value::map(vec![(Value::string("present"), Value::number(1.0))]),
    );

    let (_, output) = render_source("<{m.absent}>", &mut scope);
    assert_eq!(output, "<>");

    let (_, output) = render_source("{dump m.absent}", &mut scope);
    assert_eq!(output, "<void>");
}

#[test]
fn test_access_on_non_map_yields_void() {
    let mut scope = SimpleScope::new();
    scope.set("n", Value::number(5.0));
    let (_, output) = render_source("<{n.field}>", &mut scope);
    assert_eq!(output, "<>");
}

#[test]
fn test_invoke_non_callable_skips_arguments() {
    let (tick, calls) = counting_function("tick");
    let mut scope = SimpleScope::new();
    scope.set("tick", tick);
    scope.set("target", Value::number(1.0));

    let (result, output) = render_source("<{target(tick())}>", &mut scope);

    assert!(result.is_void());
    assert_eq!(output, "<>");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_invoke_failure_is_contained() {
    let failing = NativeFunction::simple("boom", |_| {
        Err(RenderFault::new("deliberate failure"))
    });
    let mut scope = SimpleScope::new();
    scope.set("boom", Value::function(failing));

    let (result, output) = render_source("before {boom()}after", &mut scope);

    // The render finishes normally and output written before the failing
    // call is preserved.
    assert!(result.is_void());
    assert_eq!(output, "before after");
}

#[test]
fn test_invoke_failure_does_not_stop_later_calls() {
    let failing = NativeFunction::simple("boom", |_| Err(RenderFault::new("no")));
    let (tick, calls) = counting_function("tick");
    let mut scope = SimpleScope::new();
    scope.set("boom", Value::function(failing));
    scope.set("tick", tick);

    render_source("{boom()}{tick()}", &mut scope);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

// =============================================================================
// Control Flow
// =============================================================================

#[test]
fn test_for_iterates_in_declaration_order() {
    let mut scope = SimpleScope::new();
    let (_, output) = render_source(
        "{for k, v in [\"a\": 1, \"b\": 2, \"c\": 3]:{k}={v};}",
        &mut scope,
    );
    assert_eq!(output, "a=1;b=2;c=3;");
}

#[test]
fn test_for_empty_map_runs_empty_body_once() {
    let mut scope = SimpleScope::new();
    scope.set("m", Value::map(vec![]));

    let (_, output) = render_source("{for k, v in m:X|empty:none}", &mut scope);
    assert_eq!(output, "none");

    scope.set(
        "m",
        Value::map(vec![(Value::string("k"), Value::number(1.0))]),
    );
    let (_, output) = render_source("{for k, v in m:X|empty:none}", &mut scope);
    assert_eq!(output, "X");
}

#[test]
fn test_for_over_non_map_runs_empty_body() {
    let mut scope = SimpleScope::new();
    scope.set("m", Value::number(9.0));
    let (_, output) = render_source("{for k in m:X|empty:none}", &mut scope);
    assert_eq!(output, "none");
}

#[test]
fn test_for_single_variable_binds_keys() {
    let mut scope = SimpleScope::new();
    let (_, output) = render_source("{for k in [\"x\": 1, \"y\": 2]:{k}}", &mut scope);
    assert_eq!(output, "xy");
}

#[test]
fn test_loop_variables_do_not_leak() {
    let mut scope = SimpleScope::new();
    let (_, output) = render_source("{for k in [\"a\": 1]:{k}}<{k}>", &mut scope);
    assert_eq!(output, "a<>");
    assert_eq!(scope.depth(), 1);
}

#[test]
fn test_while_loop() {
    let remaining = Arc::new(AtomicI64::new(3));
    let counter = remaining.clone();
    let next = NativeFunction::simple("next", move |_| {
        Ok(Value::boolean(counter.fetch_sub(1, Ordering::SeqCst) > 0))
    });

    let mut scope = SimpleScope::new();
    scope.set("next", Value::function(next));

    let (_, output) = render_source("{while next():x}", &mut scope);
    assert_eq!(output, "xxx");
}

#[test]
fn test_return_short_circuits_composite() {
    let (tick, calls) = counting_function("tick");
    let mut scope = SimpleScope::new();
    scope.set("tick", tick);

    let (result, output) = render_source("A{return 1}{tick()}B", &mut scope);

    assert_eq!(result, Value::number(1.0));
    assert_eq!(output, "A");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_return_inside_loop_restores_scope_depth() {
    let mut scope = SimpleScope::new();
    let (result, output) = render_source("{for k in [\"a\": 7]:{return k}}tail", &mut scope);
    assert_eq!(result, Value::string("a"));
    assert_eq!(output, "");
    assert_eq!(scope.depth(), 1);
}

// =============================================================================
// Assignment and Functions
// =============================================================================

#[test]
fn test_set_value() {
    let mut scope = SimpleScope::new();
    let (_, output) = render_source("{set x to 41}{x}", &mut scope);
    assert_eq!(output, "41");
    assert_eq!(scope.get("x"), Some(Value::number(41.0)));
}

#[test]
fn test_set_rebinds_through_loop_frame() {
    let mut scope = SimpleScope::new();
    let (_, output) = render_source(
        "{set x to 1}{for k in [\"a\": 0]:{set x to 2}}{x}",
        &mut scope,
    );
    assert_eq!(output, "2");
}

#[test]
fn test_template_function_definition_and_call() {
    let mut scope = SimpleScope::new();
    let (_, output) = render_source("{set greet(name) to:Hi {name}}{greet(\"Ann\")}", &mut scope);
    assert_eq!(output, "Hi Ann");
}

#[test]
fn test_template_function_return_value() {
    let mut scope = SimpleScope::new();
    let (_, output) = render_source("{set id(x) to:{return x}}{id(5)}", &mut scope);
    assert_eq!(output, "5");
}

#[test]
fn test_function_arity_tolerance() {
    let mut scope = SimpleScope::new();

    // Missing trailing parameter binds to void.
    let (_, output) = render_source("{set f(a, b) to:{a}-{b}}{f(1)}", &mut scope);
    assert_eq!(output, "1-");

    // Extra trailing arguments are ignored.
    let (_, output) = render_source("{set f(a, b) to:{a}-{b}}{f(1, 2, 3)}", &mut scope);
    assert_eq!(output, "1-2");
}

#[test]
fn test_function_parameters_shadow_outer_bindings() {
    let mut scope = SimpleScope::new();
    let (_, output) = render_source(
        "{set x to \"outer\"}{set f(x) to:{x}}{f(\"inner\")}{x}",
        &mut scope,
    );
    assert_eq!(output, "innerouter");
}

// =============================================================================
// Output Paths
// =============================================================================

#[test]
fn test_dump_bypasses_display_conversion() {
    let mut scope = SimpleScope::new();
    let (_, echoed) = render_source("{\"s\"}", &mut scope);
    let (_, dumped) = render_source("{dump \"s\"}", &mut scope);
    assert_eq!(echoed, "s");
    assert_eq!(dumped, "\"s\"");
}

#[test]
fn test_map_literal_evaluation_order() {
    let order = Arc::new(std::sync::Mutex::new(String::new()));
    let recorder = order.clone();
    let note = NativeFunction::simple("note", move |arguments| {
        let mut order = recorder.lock().unwrap();
        order.push_str(&arguments[0].to_display());
        Ok(arguments[0].clone())
    });

    let mut scope = SimpleScope::new();
    scope.set("note", Value::function(note));

    render_source("{dump [note(\"k1\"): note(\"v1\"), note(\"k2\"): note(\"v2\")]}", &mut scope);
    assert_eq!(&*order.lock().unwrap(), "k1v1k2v2");
}

// =============================================================================
// Documents
// =============================================================================

#[test]
fn test_round_trip_determinism() {
    let source = "{set x to 2}{if x:{x} wins|else:none}{for k in [\"a\": 1]:{k}}";

    let first = Document::with_defaults(source).expect("parse failed");
    let second = Document::with_defaults(source).expect("parse failed");

    let mut scope_a = SimpleScope::new();
    let mut scope_b = SimpleScope::new();

    assert_eq!(
        first.render_to_string(&mut scope_a).1,
        second.render_to_string(&mut scope_b).1
    );
}

#[test]
fn test_parse_error_surfaces_from_construction() {
    let error = Document::with_defaults("{if : x}").unwrap_err();
    assert!(error.message.contains("expected expression"));
}

#[test]
fn test_concurrent_rendering() {
    let document =
        Document::with_defaults("{for k, v in [\"a\": 1, \"b\": 2]:{k}={v};}").expect("parse");
    let document = &document;

    std::thread::scope(|threads| {
        for _ in 0..4 {
            threads.spawn(move || {
                for _ in 0..100 {
                    let mut scope = SimpleScope::new();
                    let (result, output) = document.render_to_string(&mut scope);
                    assert!(result.is_void());
                    assert_eq!(output, "a=1;b=2;");
                }
            });
        }
    });
}
