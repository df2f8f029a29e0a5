//! The lispy runtime
//!
//! Everything around the core evaluator that makes it a usable language:
//! the standard library of builtins, file handles, source loading, the
//! embedded prelude, and the pieces of the command-line driver (REPL,
//! configuration, diagnostics).

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod file;
pub mod loader;
pub mod native;
pub mod prelude;
pub mod repl;
pub mod stdlib;

use lispy::Interpreter;

pub use config::{Cli, Config};
pub use error::DriverError;
pub use loader::{load_file, load_source};
pub use prelude::{PRELUDE, load_prelude};
pub use stdlib::register_stdlib;

/// An interpreter with the standard library registered and, when asked,
/// the prelude loaded.
pub fn standard_interpreter(with_prelude: bool) -> Interpreter {
    let mut interp = Interpreter::new();
    register_stdlib(&mut interp);
    if with_prelude {
        load_prelude(&mut interp);
    }
    interp
}
