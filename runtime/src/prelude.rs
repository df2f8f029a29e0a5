//! The standard prelude: list utilities and control forms written in lispy
//! itself on top of the native builtins.

use lispy::{Interpreter, Value};
use tracing::debug;

use crate::loader::load_source;

pub const PRELUDE: &str = include_str!("prelude.lspy");

/// Evaluate the prelude in the root environment
pub fn load_prelude(interp: &mut Interpreter) -> Value {
    debug!("loading prelude");
    let root = interp.root().clone();
    load_source(interp, &root, PRELUDE)
}
