use std::io;
use std::path::PathBuf;

use rustyline::error::ReadlineError;

/// Failures of the host around the interpreter. Errors inside the language
/// are ordinary `Value::Error`s and never reach this type.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Line editor error: {0}")]
    Readline(#[from] ReadlineError),

    #[error("{0}")]
    Script(String),
}
