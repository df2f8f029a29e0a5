use std::process::ExitCode;

use clap::Parser;
use lispy::{Interpreter, Value};
use runtime::diagnostics::{init_tracing, record_pool_stats};
use runtime::repl::run_repl;
use runtime::{Cli, Config, DriverError, load_file, standard_interpreter};
use tracing::debug;

fn main() -> ExitCode {
    init_tracing();
    let config = Config::from(Cli::parse());
    debug!(?config, "starting");

    let mut interp = standard_interpreter(config.prelude);
    let outcome = run(&mut interp, &config);

    record_pool_stats(config.memory_log.as_deref(), interp.pool().stats());
    interp.pool_mut().cleanup();

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Load the files, then evaluate `--eval`; with neither, run the REPL
fn run(interp: &mut Interpreter, config: &Config) -> Result<(), DriverError> {
    if config.interactive() {
        return run_repl(interp, config);
    }

    let root = interp.root().clone();
    for path in &config.files {
        match load_file(interp, &root, path) {
            Value::Error(message) => return Err(DriverError::Script(message)),
            ok => interp.pool_mut().release(ok),
        }
        if interp.is_halted() {
            return Ok(());
        }
    }

    let Some(expr) = &config.eval else {
        return Ok(());
    };
    let mut failed = false;
    for result in interp.eval_str(expr) {
        println!("{result}");
        failed |= result.is_error();
        interp.pool_mut().release(result);
    }
    if failed {
        return Err(DriverError::Script(
            "expression evaluated to an error".to_string(),
        ));
    }
    Ok(())
}
