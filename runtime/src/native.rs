//! Native function utilities and helpers
//!
//! Builtins do their argument checking and extraction through these helpers
//! and report failures as `Result<_, String>`; [`guard`] turns the outcome
//! into the `Value` the evaluator expects.

use lispy::{FileHandle, Interpreter, Symbol, Value};

/// Run a builtin body over its owned argument list.
///
/// The body takes what it needs out of `args`; whatever is left afterwards
/// goes back to the pool. An `Err` becomes an `Error` value.
pub fn guard<F>(interp: &mut Interpreter, mut args: Vec<Value>, body: F) -> Value
where
    F: FnOnce(&mut Interpreter, &mut Vec<Value>) -> Result<Value, String>,
{
    let result = body(interp, &mut args);
    interp.pool_mut().release_cells(args);
    result.unwrap_or_else(Value::Error)
}

// ============================================================================
// Argument Checking Helpers
// ============================================================================

/// Check that the number of arguments is exactly `expected`
pub fn check_arity(name: &str, args: &[Value], expected: usize) -> Result<(), String> {
    if args.len() != expected {
        return Err(format!(
            "Function '{name}' passed incorrect number of arguments. Got {}, Expected {expected}.",
            args.len()
        ));
    }
    Ok(())
}

/// Check that there is at least one argument
pub fn check_not_nullary(name: &str, args: &[Value]) -> Result<(), String> {
    if args.is_empty() {
        return Err(format!("Function '{name}' passed too few arguments!"));
    }
    Ok(())
}

/// Check the type of argument `index` against the accepted type names
pub fn check_type(
    name: &str,
    args: &[Value],
    index: usize,
    expected: &[&str],
) -> Result<(), String> {
    let got = args.get(index).map_or("nothing", Value::type_name);
    if expected.contains(&got) {
        return Ok(());
    }
    Err(format!(
        "Function '{name}' passed incorrect type for argument {index}. Got {got}, Expected {}.",
        expected.join(" or ")
    ))
}

/// Check every argument against the accepted type names
pub fn check_all(name: &str, args: &[Value], expected: &[&str]) -> Result<(), String> {
    (0..args.len()).try_for_each(|index| check_type(name, args, index, expected))
}

/// Check that list argument `index` has at least one element
pub fn check_not_empty(name: &str, args: &[Value], index: usize) -> Result<(), String> {
    match args.get(index).and_then(Value::cells) {
        Some([]) => Err(format!("Function '{name}' passed {{}} for argument {index}.")),
        _ => Ok(()),
    }
}

// ============================================================================
// Value Extraction Helpers
// ============================================================================

/// Move argument `index` out of the list, leaving `()` in its place
pub fn take(args: &mut [Value], index: usize) -> Value {
    std::mem::take(&mut args[index])
}

/// Move the cells out of a list argument
pub fn take_cells(args: &mut [Value], index: usize) -> Result<Vec<Value>, String> {
    match take(args, index) {
        Value::QExpr(cells) | Value::SExpr(cells) => Ok(cells),
        other => Err(format!("Expected Q-Expression, got {}", other.type_name())),
    }
}

/// Move the text out of a string argument
pub fn take_string(args: &mut [Value], index: usize) -> Result<String, String> {
    match take(args, index) {
        Value::Str(s) => Ok(s),
        other => Err(format!("Expected String, got {}", other.type_name())),
    }
}

/// Extract an integer from a Value
pub fn extract_int(value: &Value) -> Result<i64, String> {
    match value {
        Value::Number(n) => Ok(*n),
        _ => Err(format!("Expected Number, got {}", value.type_name())),
    }
}

/// Extract a string slice from a Value
pub fn extract_str(value: &Value) -> Result<&str, String> {
    match value {
        Value::Str(s) => Ok(s),
        _ => Err(format!("Expected String, got {}", value.type_name())),
    }
}

/// Extract a file handle from a Value
pub fn extract_file(value: &Value) -> Result<&FileHandle, String> {
    match value {
        Value::File(handle) => Ok(handle),
        _ => Err(format!("Expected File, got {}", value.type_name())),
    }
}

/// Extract the symbols of a formals or names list.
///
/// `describe` renders the error for the first cell that is not a symbol.
pub fn extract_symbols(
    cells: &[Value],
    describe: impl Fn(&Value) -> String,
) -> Result<Vec<Symbol>, String> {
    cells
        .iter()
        .map(|cell| match cell {
            Value::Symbol(sym) => Ok(*sym),
            other => Err(describe(other)),
        })
        .collect()
}
