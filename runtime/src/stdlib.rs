//! Standard library native functions
//!
//! This module provides the builtins bound in the root environment of every
//! lispy interpreter: list manipulation, variables, closures, arithmetic,
//! comparison, logic and a little console I/O. File handles live in
//! [`crate::file`].

use std::io::{self, Write};
use std::path::Path;

use lispy::{BuiltinKind, Environment, Interpreter, Numeric, Value, conditional, evaluate};
use tracing::debug;
use unicode_segmentation::UnicodeSegmentation;

use crate::file;
use crate::loader::load_file;
use crate::native::{
    check_all, check_arity, check_not_empty, check_not_nullary, check_type, extract_symbols, guard,
    take, take_cells, take_string,
};

const QEXPR: &str = "Q-Expression";
const STRING: &str = "String";

// ============================================================================
// List Operations
// ============================================================================

/// Collect the arguments into a Q-Expression
/// Usage: (list 1 2 3) => {1 2 3}
pub fn list(_: &mut Interpreter, _: &Environment, args: Vec<Value>) -> Value {
    Value::QExpr(args)
}

/// First element of a list, or first character of a string
/// Usage: (head {1 2 3}) => {1}, (head "abc") => "a"
pub fn head(interp: &mut Interpreter, _: &Environment, args: Vec<Value>) -> Value {
    guard(interp, args, |interp, args| {
        check_arity("head", args, 1)?;
        check_type("head", args, 0, &[QEXPR, STRING])?;

        if let Value::Str(s) = &args[0] {
            let first = s
                .graphemes(true)
                .next()
                .ok_or("Function 'head' passed empty string!")?;
            return Ok(Value::string(first));
        }

        check_not_empty("head", args, 0)?;
        let mut cells = take_cells(args, 0)?;
        for rest in cells.drain(1..) {
            interp.pool_mut().release(rest);
        }
        Ok(Value::QExpr(cells))
    })
}

/// Everything after the first element or character
/// Usage: (tail {1 2 3}) => {2 3}, (tail "abc") => "bc"
pub fn tail(interp: &mut Interpreter, _: &Environment, args: Vec<Value>) -> Value {
    guard(interp, args, |interp, args| {
        check_arity("tail", args, 1)?;
        check_type("tail", args, 0, &[QEXPR, STRING])?;

        if let Value::Str(s) = &args[0] {
            if s.is_empty() {
                return Err("Function 'tail' passed empty string!".to_string());
            }
            let start = s.grapheme_indices(true).nth(1).map_or(s.len(), |(i, _)| i);
            return Ok(Value::string(&s[start..]));
        }

        check_not_empty("tail", args, 0)?;
        let mut cells = take_cells(args, 0)?;
        let first = cells.remove(0);
        interp.pool_mut().release(first);
        Ok(Value::QExpr(cells))
    })
}

/// All but the last element
/// Usage: (init {1 2 3}) => {1 2}
pub fn init(interp: &mut Interpreter, _: &Environment, args: Vec<Value>) -> Value {
    guard(interp, args, |interp, args| {
        check_arity("init", args, 1)?;
        check_type("init", args, 0, &[QEXPR])?;
        check_not_empty("init", args, 0)?;
        let mut cells = take_cells(args, 0)?;
        if let Some(last) = cells.pop() {
            interp.pool_mut().release(last);
        }
        Ok(Value::QExpr(cells))
    })
}

/// Prepend a value to a list
/// Usage: (cons 1 {2 3}) => {1 2 3}
pub fn cons(interp: &mut Interpreter, _: &Environment, args: Vec<Value>) -> Value {
    guard(interp, args, |_, args| {
        check_arity("cons", args, 2)?;
        check_type("cons", args, 1, &[QEXPR])?;
        let value = take(args, 0);
        let mut cells = take_cells(args, 1)?;
        cells.insert(0, value);
        Ok(Value::QExpr(cells))
    })
}

/// Number of elements in a list, or of characters in a string
/// Usage: (len {1 2 3}) => 3
pub fn len(interp: &mut Interpreter, _: &Environment, args: Vec<Value>) -> Value {
    guard(interp, args, |_, args| {
        check_arity("len", args, 1)?;
        check_type("len", args, 0, &[QEXPR, STRING])?;
        let count = match &args[0] {
            Value::Str(s) => s.graphemes(true).count(),
            other => other.cells().map_or(0, <[Value]>::len),
        };
        i64::try_from(count)
            .map(Value::Number)
            .map_err(|_| "Function 'len' result does not fit a Number.".to_string())
    })
}

/// Concatenate lists, or concatenate strings. Kinds cannot be mixed.
/// Usage: (join {1} {2 3}) => {1 2 3}, (join "ab" "c") => "abc"
pub fn join(interp: &mut Interpreter, _: &Environment, args: Vec<Value>) -> Value {
    guard(interp, args, |interp, args| {
        check_all("join", args, &[QEXPR, STRING])?;
        check_not_nullary("join", args)?;

        let mixed = || "Function 'join' passed mixed types!".to_string();
        match take(args, 0) {
            Value::Str(mut joined) => {
                for i in 1..args.len() {
                    joined.push_str(extract_text(&args[i]).ok_or_else(mixed)?);
                }
                Ok(Value::Str(joined))
            }
            Value::QExpr(mut joined) => {
                for i in 1..args.len() {
                    let mut cells = take_cells(args, i).map_err(|_| mixed())?;
                    joined.append(&mut cells);
                    interp.pool_mut().release_cells(cells);
                }
                Ok(Value::QExpr(joined))
            }
            other => Err(format!(
                "Function 'join' passed incorrect type for argument 0. Got {}, Expected Q-Expression or String.",
                other.type_name()
            )),
        }
    })
}

fn extract_text(value: &Value) -> Option<&str> {
    match value {
        Value::Str(s) => Some(s),
        _ => None,
    }
}

/// Evaluate a Q-Expression as code
/// Usage: (eval {+ 1 2}) => 3
pub fn eval(interp: &mut Interpreter, env: &Environment, args: Vec<Value>) -> Value {
    guard(interp, args, |interp, args| {
        check_arity("eval", args, 1)?;
        check_type("eval", args, 0, &[QEXPR])?;
        let code = take(args, 0).into_sexpr();
        Ok(evaluate(interp, env, code))
    })
}

// ============================================================================
// Variables and Functions
// ============================================================================

/// Bind each symbol of the first argument to the matching value.
/// `global` binds in the root, otherwise in the calling scope.
fn define(
    interp: &mut Interpreter,
    env: &Environment,
    args: Vec<Value>,
    name: &str,
    global: bool,
) -> Value {
    guard(interp, args, |interp, args| {
        check_not_nullary(name, args)?;
        check_type(name, args, 0, &[QEXPR])?;
        let syms = extract_symbols(args[0].cells().unwrap_or_default(), |other| {
            format!(
                "Function '{name}' cannot define non-symbol. Got {}, Expected Symbol.",
                other.type_name()
            )
        })?;

        let values = args.len() - 1;
        if syms.len() != values {
            return Err(format!(
                "Function '{name}' passed too many arguments for symbols. Got {}, Expected {values}.",
                syms.len()
            ));
        }

        for (sym, value) in syms.into_iter().zip(args.drain(1..)) {
            let old = if global {
                env.def(sym, value)
            } else {
                env.put(sym, value)
            };
            if let Some(old) = old {
                interp.pool_mut().release(old);
            }
        }
        Ok(Value::default())
    })
}

/// Define in the root environment
/// Usage: (def {x y} 1 2)
pub fn def(interp: &mut Interpreter, env: &Environment, args: Vec<Value>) -> Value {
    define(interp, env, args, "def", true)
}

/// Assign in the current scope
/// Usage: (= {x} 1)
pub fn put(interp: &mut Interpreter, env: &Environment, args: Vec<Value>) -> Value {
    define(interp, env, args, "=", false)
}

/// Build a closure from formals and a body
/// Usage: (\ {x y} {+ x y})
pub fn lambda(interp: &mut Interpreter, _: &Environment, args: Vec<Value>) -> Value {
    guard(interp, args, |_, args| {
        check_arity("\\", args, 2)?;
        check_type("\\", args, 0, &[QEXPR])?;
        check_type("\\", args, 1, &[QEXPR])?;
        let formals = extract_symbols(args[0].cells().unwrap_or_default(), |other| {
            format!(
                "Cannot define non-symbol. Got {}, Expected Symbol.",
                other.type_name()
            )
        })?;
        let body = take_cells(args, 1)?;
        Ok(Value::lambda(formals, body))
    })
}

/// Define a named closure in the root
/// Usage: (fun {add x y} {+ x y})
pub fn fun(interp: &mut Interpreter, env: &Environment, args: Vec<Value>) -> Value {
    guard(interp, args, |interp, args| {
        check_arity("fun", args, 2)?;
        check_type("fun", args, 0, &[QEXPR])?;
        check_type("fun", args, 1, &[QEXPR])?;
        check_not_empty("fun", args, 0)?;
        let syms = extract_symbols(args[0].cells().unwrap_or_default(), |other| {
            format!(
                "Function 'fun' cannot define non-symbol. Got {}, Expected Symbol.",
                other.type_name()
            )
        })?;

        let Some((name, formals)) = syms.split_first() else {
            return Err("Function 'fun' passed {} for argument 0.".to_string());
        };
        let body = take_cells(args, 1)?;
        if let Some(old) = env.def(*name, Value::lambda(formals.to_vec(), body)) {
            interp.pool_mut().release(old);
        }
        Ok(Value::default())
    })
}

// ============================================================================
// Arithmetic Operations
// ============================================================================

/// Check that every argument is numeric and convert them
fn numbers(name: &str, args: &[Value]) -> Result<Vec<Numeric>, String> {
    args.iter()
        .enumerate()
        .map(|(i, arg)| {
            Numeric::from_value(arg).ok_or_else(|| {
                format!(
                    "Function '{name}' passed incorrect type for argument {i}. Got {}, Expected Number.",
                    arg.type_name()
                )
            })
        })
        .collect()
}

type NumericOp = fn(&Numeric, &Numeric) -> Result<Numeric, String>;

/// Fold `op` left to right. A single argument to `-` is negated.
fn arithmetic(interp: &mut Interpreter, args: Vec<Value>, name: &str, op: NumericOp) -> Value {
    guard(interp, args, |_, args| {
        let nums = numbers(name, args)?;
        let (first, rest) = nums
            .split_first()
            .ok_or_else(|| format!("Function '{name}' passed too few arguments!"))?;

        if rest.is_empty() && matches!(name, "-" | "sub") {
            return first.neg().map(Numeric::into_value);
        }
        rest.iter()
            .try_fold(*first, |acc, n| op(&acc, n))
            .map(Numeric::into_value)
    })
}

pub fn add(interp: &mut Interpreter, _: &Environment, args: Vec<Value>) -> Value {
    arithmetic(interp, args, "+", Numeric::add)
}

pub fn sub(interp: &mut Interpreter, _: &Environment, args: Vec<Value>) -> Value {
    arithmetic(interp, args, "-", Numeric::sub)
}

pub fn mul(interp: &mut Interpreter, _: &Environment, args: Vec<Value>) -> Value {
    arithmetic(interp, args, "*", Numeric::mul)
}

pub fn div(interp: &mut Interpreter, _: &Environment, args: Vec<Value>) -> Value {
    arithmetic(interp, args, "/", Numeric::div)
}

pub fn rem(interp: &mut Interpreter, _: &Environment, args: Vec<Value>) -> Value {
    arithmetic(interp, args, "%", Numeric::rem)
}

// Word aliases report their own name in errors

fn add_word(interp: &mut Interpreter, _: &Environment, args: Vec<Value>) -> Value {
    arithmetic(interp, args, "add", Numeric::add)
}

fn sub_word(interp: &mut Interpreter, _: &Environment, args: Vec<Value>) -> Value {
    arithmetic(interp, args, "sub", Numeric::sub)
}

fn mul_word(interp: &mut Interpreter, _: &Environment, args: Vec<Value>) -> Value {
    arithmetic(interp, args, "mul", Numeric::mul)
}

fn div_word(interp: &mut Interpreter, _: &Environment, args: Vec<Value>) -> Value {
    arithmetic(interp, args, "div", Numeric::div)
}

fn rem_word(interp: &mut Interpreter, _: &Environment, args: Vec<Value>) -> Value {
    arithmetic(interp, args, "mod", Numeric::rem)
}

// ============================================================================
// Comparison Operations
// ============================================================================

fn order(
    interp: &mut Interpreter,
    args: Vec<Value>,
    name: &str,
    test: fn(&Numeric, &Numeric) -> bool,
) -> Value {
    guard(interp, args, |_, args| {
        check_arity(name, args, 2)?;
        match numbers(name, args)?.as_slice() {
            [a, b] => Ok(Value::bool(test(a, b))),
            _ => Err(format!("Function '{name}' passed too few arguments!")),
        }
    })
}

pub fn gt(interp: &mut Interpreter, _: &Environment, args: Vec<Value>) -> Value {
    order(interp, args, ">", |a, b| a > b)
}

pub fn lt(interp: &mut Interpreter, _: &Environment, args: Vec<Value>) -> Value {
    order(interp, args, "<", |a, b| a < b)
}

pub fn ge(interp: &mut Interpreter, _: &Environment, args: Vec<Value>) -> Value {
    order(interp, args, ">=", |a, b| a >= b)
}

pub fn le(interp: &mut Interpreter, _: &Environment, args: Vec<Value>) -> Value {
    order(interp, args, "<=", |a, b| a <= b)
}

/// Structural equality of any two values
pub fn eq(interp: &mut Interpreter, _: &Environment, args: Vec<Value>) -> Value {
    guard(interp, args, |_, args| {
        check_arity("==", args, 2)?;
        Ok(Value::bool(args[0] == args[1]))
    })
}

pub fn ne(interp: &mut Interpreter, _: &Environment, args: Vec<Value>) -> Value {
    guard(interp, args, |_, args| {
        check_arity("!=", args, 2)?;
        Ok(Value::bool(args[0] != args[1]))
    })
}

// ============================================================================
// Logic
// ============================================================================

pub fn and(interp: &mut Interpreter, _: &Environment, args: Vec<Value>) -> Value {
    guard(interp, args, |_, args| {
        check_arity("and", args, 2)?;
        Ok(Value::bool(args[0].is_truthy() && args[1].is_truthy()))
    })
}

pub fn or(interp: &mut Interpreter, _: &Environment, args: Vec<Value>) -> Value {
    guard(interp, args, |_, args| {
        check_arity("or", args, 2)?;
        Ok(Value::bool(args[0].is_truthy() || args[1].is_truthy()))
    })
}

pub fn not(interp: &mut Interpreter, _: &Environment, args: Vec<Value>) -> Value {
    guard(interp, args, |_, args| {
        check_arity("not", args, 1)?;
        Ok(Value::bool(!args[0].is_truthy()))
    })
}

pub fn truth(interp: &mut Interpreter, _: &Environment, args: Vec<Value>) -> Value {
    guard(interp, args, |_, args| {
        check_arity("true", args, 0)?;
        Ok(Value::bool(true))
    })
}

pub fn falsity(interp: &mut Interpreter, _: &Environment, args: Vec<Value>) -> Value {
    guard(interp, args, |_, args| {
        check_arity("false", args, 0)?;
        Ok(Value::bool(false))
    })
}

// ============================================================================
// Strings and Console I/O
// ============================================================================

fn write_line(name: &str, line: &str) -> Result<(), String> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{line}").map_err(|e| format!("{name}: I/O error: {e}"))?;
    handle.flush().map_err(|e| format!("{name}: I/O error: {e}"))
}

/// Print values in their printed form, then a newline
/// Usage: (print "a" 1) prints "a" 1
pub fn print(interp: &mut Interpreter, _: &Environment, args: Vec<Value>) -> Value {
    guard(interp, args, |_, args| {
        let line: Vec<String> = args.iter().map(Value::to_string).collect();
        write_line("print", &line.join(" "))?;
        Ok(Value::default())
    })
}

/// Like print, but strings are written raw
/// Usage: (show "a\tb") prints a<TAB>b
pub fn show(interp: &mut Interpreter, _: &Environment, args: Vec<Value>) -> Value {
    guard(interp, args, |_, args| {
        let line: Vec<String> = args
            .iter()
            .map(|arg| match arg {
                Value::Str(s) => s.clone(),
                other => other.to_string(),
            })
            .collect();
        write_line("show", &line.join(" "))?;
        Ok(Value::default())
    })
}

/// Build an error value from a message
/// Usage: (error "bad input")
pub fn error(interp: &mut Interpreter, _: &Environment, args: Vec<Value>) -> Value {
    guard(interp, args, |_, args| {
        check_arity("error", args, 1)?;
        check_type("error", args, 0, &[STRING])?;
        Ok(Value::Error(take_string(args, 0)?))
    })
}

/// Parse a string into a Q-Expression of its forms
/// Usage: (read "+ 1 2") => {+ 1 2}
pub fn read(interp: &mut Interpreter, _: &Environment, args: Vec<Value>) -> Value {
    guard(interp, args, |interp, args| {
        check_arity("read", args, 1)?;
        check_type("read", args, 0, &[STRING])?;
        let text = take_string(args, 0)?;
        Ok(interp.parse(&text).into_qexpr())
    })
}

/// Load and evaluate a source file
/// Usage: (load "lib.lspy") => ok
pub fn load(interp: &mut Interpreter, env: &Environment, args: Vec<Value>) -> Value {
    guard(interp, args, |interp, args| {
        check_arity("load", args, 1)?;
        check_type("load", args, 0, &[STRING])?;
        let path = take_string(args, 0)?;
        Ok(load_file(interp, env, Path::new(&path)))
    })
}

/// List the bindings of the current scope in definition order
pub fn printenv(interp: &mut Interpreter, env: &Environment, args: Vec<Value>) -> Value {
    guard(interp, args, |_, _| {
        for (sym, value) in env.bindings() {
            write_line("printenv", &format!("{:<10} : {value}", sym.to_string()))?;
        }
        Ok(Value::default())
    })
}

/// Ask the driver to stop after the current form
pub fn exit(interp: &mut Interpreter, _: &Environment, args: Vec<Value>) -> Value {
    guard(interp, args, |interp, _| {
        interp.halt();
        Ok(Value::default())
    })
}

// ============================================================================
// Registration
// ============================================================================

/// Register all standard library functions in the interpreter's root
pub fn register_stdlib(interp: &mut Interpreter) {
    // List operations
    interp.add_builtin("list", list);
    interp.add_builtin("head", head);
    interp.add_builtin("tail", tail);
    interp.add_builtin("init", init);
    interp.add_builtin("cons", cons);
    interp.add_builtin("len", len);
    interp.add_builtin("join", join);
    interp.add_builtin("eval", eval);

    // Variables and functions
    interp.add_builtin("def", def);
    interp.add_builtin("=", put);
    interp.add_builtin("\\", lambda);
    interp.add_builtin("fun", fun);

    // Arithmetic
    interp.add_builtin("+", add);
    interp.add_builtin("-", sub);
    interp.add_builtin("*", mul);
    interp.add_builtin("/", div);
    interp.add_builtin("%", rem);
    interp.add_builtin("add", add_word);
    interp.add_builtin("sub", sub_word);
    interp.add_builtin("mul", mul_word);
    interp.add_builtin("div", div_word);
    interp.add_builtin("mod", rem_word);

    // Comparison
    interp.add_builtin(">", gt);
    interp.add_builtin("<", lt);
    interp.add_builtin(">=", ge);
    interp.add_builtin("<=", le);
    interp.add_builtin("==", eq);
    interp.add_builtin("!=", ne);

    // Logic
    interp.add_builtin_kind("if", conditional, BuiltinKind::Conditional);
    interp.add_builtin("and", and);
    interp.add_builtin("or", or);
    interp.add_builtin("not", not);
    interp.add_builtin("true", truth);
    interp.add_builtin("false", falsity);

    // Strings and console I/O
    interp.add_builtin("print", print);
    interp.add_builtin("show", show);
    interp.add_builtin("error", error);
    interp.add_builtin("read", read);
    interp.add_builtin("load", load);
    interp.add_builtin("printenv", printenv);
    interp.add_builtin("exit", exit);

    file::register_file_builtins(interp);

    debug!(bindings = interp.root().len(), "registered standard library");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(input: &str) -> Value {
        let mut interp = Interpreter::new();
        register_stdlib(&mut interp);
        interp.eval_str(input).pop().unwrap_or_default()
    }

    #[test]
    fn test_registration_binds_core_names() {
        let mut interp = Interpreter::new();
        register_stdlib(&mut interp);
        for name in ["list", "head", "def", "\\", "if", "+", "==", "print", "fopen"] {
            assert!(
                interp.root().lookup(lispy::Symbol::new(name)).is_some(),
                "{name} is unbound"
            );
        }
    }

    #[test]
    fn test_head_of_string_is_grapheme_aware() {
        assert_eq!(run("(head \"e\u{301}x\")"), Value::string("e\u{301}"));
        assert_eq!(run("(tail \"e\u{301}x\")"), Value::string("x"));
        assert_eq!(run("(len \"e\u{301}x\")"), Value::Number(2));
    }

    #[test]
    fn test_unary_minus_negates() {
        assert_eq!(run("(- 5)"), Value::Number(-5));
        assert_eq!(run("(sub 2.5)"), Value::Decimal(-2.5));
        assert_eq!(run("(+ 5)"), Value::Number(5));
    }

    #[test]
    fn test_alias_reports_its_own_name() {
        assert_eq!(
            run("(mod 1 {})"),
            Value::error(
                "Function 'mod' passed incorrect type for argument 1. Got Q-Expression, Expected Number."
            )
        );
    }
}
