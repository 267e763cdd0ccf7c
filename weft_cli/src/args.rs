//! Command-line argument parsing.
//!
//! Hand-rolled for zero-overhead startup; the surface is small enough that a
//! parser dependency would cost more than it saves.

use std::path::PathBuf;

/// What the binary should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Render a template file to stdout.
    Render(RenderArgs),
    /// Print version and exit: `weft -V` or `weft --version`.
    PrintVersion,
    /// Print help and exit: `weft -h` or `weft --help`.
    PrintHelp,
}

/// Arguments for a render run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderArgs {
    /// Template file to render.
    pub template: PathBuf,
    /// `name=value` scope bindings, in argument order.
    pub bindings: Vec<(String, String)>,
    /// `-d`: print the compiled chunk instead of rendering.
    pub dump_chunk: bool,
}

/// Usage text printed for `-h` and on usage errors.
pub const USAGE: &str = "\
usage: weft [options] <template> [name=value]...

options:
  -d, --dump-chunk   print the compiled chunk instead of rendering
  -V, --version      print version and exit
  -h, --help         print this help and exit

bindings:
  name=value pairs populate the render scope; values parse as booleans or
  numbers when they look like one, and as strings otherwise.
";

/// Parse command-line arguments (without the program name).
pub fn parse(args: impl Iterator<Item = String>) -> Result<Mode, String> {
    let mut template: Option<PathBuf> = None;
    let mut bindings = Vec::new();
    let mut dump_chunk = false;

    for arg in args {
        match arg.as_str() {
            "-h" | "--help" => return Ok(Mode::PrintHelp),
            "-V" | "--version" => return Ok(Mode::PrintVersion),
            "-d" | "--dump-chunk" => dump_chunk = true,
            _ if arg.starts_with('-') && template.is_none() => {
                return Err(format!("unknown option '{}'", arg));
            }
            _ => {
                if template.is_none() {
                    template = Some(PathBuf::from(arg));
                } else if let Some((name, value)) = arg.split_once('=') {
                    bindings.push((name.to_string(), value.to_string()));
                } else {
                    return Err(format!("expected name=value binding, found '{}'", arg));
                }
            }
        }
    }

    match template {
        Some(template) => Ok(Mode::Render(RenderArgs {
            template,
            bindings,
            dump_chunk,
        })),
        None => Err("missing template file".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_strs(args: &[&str]) -> Result<Mode, String> {
        parse(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_render_with_bindings() {
        let mode = parse_strs(&["page.weft", "name=Ann", "count=3"]).unwrap();
        let Mode::Render(args) = mode else {
            panic!("expected render mode");
        };
        assert_eq!(args.template, PathBuf::from("page.weft"));
        assert_eq!(args.bindings.len(), 2);
        assert!(!args.dump_chunk);
    }

    #[test]
    fn test_flags() {
        assert_eq!(parse_strs(&["--version"]).unwrap(), Mode::PrintVersion);
        assert_eq!(parse_strs(&["-h"]).unwrap(), Mode::PrintHelp);

        let Mode::Render(args) = parse_strs(&["-d", "page.weft"]).unwrap() else {
            panic!("expected render mode");
        };
        assert!(args.dump_chunk);
    }

    #[test]
    fn test_usage_errors() {
        assert!(parse_strs(&[]).is_err());
        assert!(parse_strs(&["--bogus", "page.weft"]).is_err());
        assert!(parse_strs(&["page.weft", "not-a-binding"]).is_err());
    }
}
