//! Loading source text into an interpreter
//!
//! Each top-level form is evaluated in turn. An error result is printed and
//! loading carries on with the next form; only a parse error aborts, since
//! nothing can be evaluated from unbalanced input.

use std::fs;
use std::path::Path;

use lispy::{Environment, Interpreter, Value, evaluate};
use tracing::debug;

/// Read the file at `path` and evaluate its forms in `env`.
///
/// Returns the symbol `ok`, the parse error, or an error when the file
/// cannot be read.
pub fn load_file(interp: &mut Interpreter, env: &Environment, path: &Path) -> Value {
    match fs::read_to_string(path) {
        Ok(source) => {
            debug!(path = %path.display(), bytes = source.len(), "loading file");
            load_source(interp, env, &source)
        }
        Err(e) => {
            debug!(path = %path.display(), error = %e, "could not read file");
            Value::error(format!("Could not open file {}", path.display()))
        }
    }
}

/// Evaluate every form of `source` in `env`.
///
/// Stops early, releasing the forms not yet run, once a form halts the
/// interpreter.
pub fn load_source(interp: &mut Interpreter, env: &Environment, source: &str) -> Value {
    let mut forms = match interp.parse(source) {
        Value::SExpr(forms) => forms,
        error => return error,
    };

    let mut pending = forms.drain(..);
    for form in pending.by_ref() {
        let result = evaluate(interp, env, form);
        if result.is_error() {
            println!("{result}");
        }
        interp.pool_mut().release(result);
        if interp.is_halted() {
            debug!("interpreter halted while loading");
            break;
        }
    }
    for skipped in pending {
        interp.pool_mut().release(skipped);
    }
    interp.pool_mut().release_cells(forms);

    Value::symbol("ok")
}
