//! weft: render template files from the command line.
//!
//! Swallowed render faults are logged through the `log` facade; run with
//! `RUST_LOG=debug` to see them.

mod args;

use args::{Mode, RenderArgs};
use std::io;
use std::process::ExitCode;
use weft_core::{Scope, SimpleScope, StreamOutput, Value};
use weft_vm::Document;

/// Successful run.
const EXIT_SUCCESS: u8 = 0;
/// Template could not be read or parsed, or output failed.
const EXIT_ERROR: u8 = 1;
/// Command-line usage error.
const EXIT_USAGE_ERROR: u8 = 2;

fn main() -> ExitCode {
    env_logger::init();

    match args::parse(std::env::args().skip(1)) {
        Ok(Mode::Render(render)) => run(&render),
        Ok(Mode::PrintVersion) => {
            println!("weft {}", weft_core::VERSION);
            ExitCode::from(EXIT_SUCCESS)
        }
        Ok(Mode::PrintHelp) => {
            print!("{}", args::USAGE);
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(message) => {
            eprintln!("weft: {}", message);
            eprint!("{}", args::USAGE);
            ExitCode::from(EXIT_USAGE_ERROR)
        }
    }
}

fn run(render: &RenderArgs) -> ExitCode {
    let path = render.template.display();

    let source = match std::fs::read_to_string(&render.template) {
        Ok(source) => source,
        Err(error) => {
            eprintln!("weft: {}: {}", path, error);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let document = match Document::with_defaults(&source) {
        Ok(document) => document,
        Err(error) => {
            eprintln!("weft: {}:{}", path, error);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    if render.dump_chunk {
        print!("{}", weft_compiler::disassemble(document.chunk()));
        return ExitCode::from(EXIT_SUCCESS);
    }

    let mut scope = SimpleScope::new();
    for (name, raw) in &render.bindings {
        scope.set(name, parse_binding(raw));
    }

    let mut output = StreamOutput::new(io::stdout().lock());
    document.render(&mut scope, &mut output);

    match output.error() {
        Some(error) => {
            eprintln!("weft: write failed: {}", error);
            ExitCode::from(EXIT_ERROR)
        }
        None => ExitCode::from(EXIT_SUCCESS),
    }
}

/// Interpret a binding value: booleans and numbers when they look like one,
/// strings otherwise.
fn parse_binding(raw: &str) -> Value {
    match raw {
        "true" => Value::boolean(true),
        "false" => Value::boolean(false),
        _ => match raw.parse::<f64>() {
            Ok(number) => Value::number(number),
            Err(_) => Value::string(raw),
        },
    }
}
