use std::mem;

use lispy::Interpreter;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::debug;

use crate::config::Config;
use crate::diagnostics::record_pool_stats;
use crate::error::DriverError;

pub const BANNER: &str = "Lispy Version 0.0.0.0.1";
pub const PROMPT: &str = "lispy> ";
const CONTINUATION: &str = "  ...> ";

/// Read lines until a balanced input is complete, then evaluate each of its
/// top-level forms and print the results.
pub fn run_repl(interp: &mut Interpreter, config: &Config) -> Result<(), DriverError> {
    let mut editor = DefaultEditor::new()?;
    if let Some(history) = &config.history
        && let Err(e) = editor.load_history(history)
    {
        debug!(path = %history.display(), error = %e, "no history loaded");
    }

    println!("{BANNER}");
    println!("Press Ctrl+c to Exit\n");

    let mut buffer = String::new();
    let outcome = loop {
        let prompt = if buffer.is_empty() { PROMPT } else { CONTINUATION };
        match editor.readline(prompt) {
            Ok(line) => {
                if !buffer.is_empty() {
                    buffer.push('\n');
                }
                buffer.push_str(&line);
                if !is_balanced(&buffer) {
                    continue;
                }

                let input = mem::take(&mut buffer);
                if input.trim().is_empty() {
                    continue;
                }
                if let Err(e) = editor.add_history_entry(input.as_str()) {
                    debug!(error = %e, "history entry dropped");
                }

                for result in interp.eval_str(&input) {
                    println!("{result}");
                    interp.pool_mut().release(result);
                }
                record_pool_stats(config.memory_log.as_deref(), interp.pool().stats());

                if interp.is_halted() {
                    break Ok(());
                }
            }
            Err(ReadlineError::Interrupted) if !buffer.is_empty() => {
                buffer.clear();
                println!("^C");
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break Ok(()),
            Err(e) => break Err(DriverError::from(e)),
        }
    };

    if let Some(history) = &config.history
        && let Err(e) = editor.save_history(history)
    {
        debug!(path = %history.display(), error = %e, "history not saved");
    }
    outcome
}

/// True once every opened bracket is closed. Brackets inside strings and
/// comments do not count; extra closers count as balanced so the parser
/// can report them.
pub fn is_balanced(input: &str) -> bool {
    let mut depth = 0i32;
    let mut in_string = false;
    let mut in_comment = false;
    let mut escape = false;

    for ch in input.chars() {
        if in_comment {
            in_comment = ch != '\n';
            continue;
        }
        if escape {
            escape = false;
            continue;
        }
        if ch == '\\' && in_string {
            escape = true;
            continue;
        }
        if ch == '"' {
            in_string = !in_string;
            continue;
        }
        if in_string {
            continue;
        }
        match ch {
            ';' => in_comment = true,
            '(' | '{' => depth += 1,
            ')' | '}' => depth -= 1,
            _ => {}
        }
    }
    depth <= 0 && !in_string
}
