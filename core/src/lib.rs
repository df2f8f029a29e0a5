//! Core language definition for lispy
//!
//! This crate contains the value model, the symbol interner, environments,
//! the reader (lexer and parser) and the trampolined evaluator. It holds no
//! builtins of its own; the `runtime` crate registers the standard library
//! and drives the REPL.

pub mod environment;
pub mod interner;
pub mod interpreter;
pub mod language;
pub mod lexer;
pub mod numeric;
pub mod parser;
pub mod pool;

// Re-export commonly used items for convenience
pub use environment::{Environment, Scope};
pub use interner::Symbol;
pub use interpreter::{Interpreter, conditional, evaluate};
pub use language::{
    Builtin, BuiltinFn, BuiltinKind, FileHandle, Function, Lambda, Value, escape, unescape,
};
pub use numeric::Numeric;
pub use parser::parse;
pub use pool::{Pool, PoolStats};
