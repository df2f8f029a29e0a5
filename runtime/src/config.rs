use std::path::PathBuf;

use clap::Parser;

const HISTORY_FILE: &str = ".lispy_history";

#[derive(Parser, Debug)]
#[command(name = "lispy", version, about = "A small Lisp with Q-Expressions")]
pub struct Cli {
    /// Source files to load, in order. Without files or --eval the REPL starts
    pub files: Vec<PathBuf>,

    /// Evaluate an expression and print each result
    #[arg(short, long)]
    pub eval: Option<String>,

    /// Do not load the standard prelude
    #[arg(long)]
    pub no_prelude: bool,

    /// File the pool statistics are appended to
    #[arg(long, default_value = "memory.log")]
    pub memory_log: PathBuf,

    /// Do not write pool statistics
    #[arg(long)]
    pub no_memory_log: bool,

    /// REPL history file [default: ~/.lispy_history]
    #[arg(long)]
    pub history: Option<PathBuf>,
}

/// Resolved driver settings
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub files: Vec<PathBuf>,
    pub eval: Option<String>,
    pub prelude: bool,
    pub memory_log: Option<PathBuf>,
    pub history: Option<PathBuf>,
}

impl Config {
    /// The REPL runs only when there is nothing else to do
    pub fn interactive(&self) -> bool {
        self.files.is_empty() && self.eval.is_none()
    }
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        Config {
            files: cli.files,
            eval: cli.eval,
            prelude: !cli.no_prelude,
            memory_log: (!cli.no_memory_log).then_some(cli.memory_log),
            history: cli
                .history
                .or_else(|| dirs::home_dir().map(|home| home.join(HISTORY_FILE))),
        }
    }
}
