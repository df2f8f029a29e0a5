//! File handle builtins
//!
//! Handles are shared: every copy of a handle refers to the same open file,
//! and `fclose` closes it for all of them. Operations on a closed handle
//! return an error value.

use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom, Write};

use lispy::{Environment, FileHandle, Interpreter, Value};
use tracing::debug;

use crate::native::{check_arity, check_type, extract_file, extract_int, extract_str, guard};

const FILE: &str = "File";
const NUMBER: &str = "Number";
const STRING: &str = "String";

/// Translate a C-style mode string. `b` is accepted and ignored.
fn open_options(mode: &str) -> Option<OpenOptions> {
    let mut options = OpenOptions::new();
    match mode.replace('b', "").as_str() {
        "r" => options.read(true),
        "w" => options.write(true).create(true).truncate(true),
        "a" => options.append(true).create(true),
        "r+" => options.read(true).write(true),
        "w+" => options.read(true).write(true).create(true).truncate(true),
        "a+" => options.read(true).append(true).create(true),
        _ => return None,
    };
    Some(options)
}

fn io_error(name: &str, e: std::io::Error) -> String {
    format!("Function '{name}' failed: {e}")
}

/// Open a file
/// Usage: (fopen "notes.txt" "w+") => <file 'notes.txt' w+>
pub fn fopen(interp: &mut Interpreter, _: &Environment, args: Vec<Value>) -> Value {
    guard(interp, args, |_, args| {
        check_arity("fopen", args, 2)?;
        check_type("fopen", args, 0, &[STRING])?;
        check_type("fopen", args, 1, &[STRING])?;
        let path = extract_str(&args[0])?;
        let mode = extract_str(&args[1])?;

        let file = open_options(mode)
            .and_then(|options| options.open(path).ok())
            .ok_or_else(|| format!("Failed to open file '{path}' with mode '{mode}'."))?;
        debug!(path, mode, "opened file");
        Ok(Value::File(FileHandle::new(path, mode, file)))
    })
}

/// Close a file for every handle sharing it
/// Usage: (fclose f)
pub fn fclose(interp: &mut Interpreter, _: &Environment, args: Vec<Value>) -> Value {
    guard(interp, args, |_, args| {
        check_arity("fclose", args, 1)?;
        check_type("fclose", args, 0, &[FILE])?;
        let handle = extract_file(&args[0])?;
        if handle.close() {
            debug!(path = %handle.path().display(), "closed file");
        }
        Ok(Value::default())
    })
}

/// Read up to `n` bytes as a string
/// Usage: (fread f 16) => "first 16 bytes.."
pub fn fread(interp: &mut Interpreter, _: &Environment, args: Vec<Value>) -> Value {
    guard(interp, args, |_, args| {
        check_arity("fread", args, 2)?;
        check_type("fread", args, 0, &[FILE])?;
        check_type("fread", args, 1, &[NUMBER])?;
        let handle = extract_file(&args[0])?;
        let size = u64::try_from(extract_int(&args[1])?)
            .map_err(|_| "Function 'fread' passed a negative size.".to_string())?;

        let bytes = handle
            .with_file(|file| {
                let mut buffer = Vec::new();
                Read::by_ref(file).take(size).read_to_end(&mut buffer).map(|_| buffer)
            })
            .ok_or("Cannot read from a closed file!")?
            .map_err(|e| io_error("fread", e))?;
        Ok(Value::Str(String::from_utf8_lossy(&bytes).into_owned()))
    })
}

/// Write a string at the current position
/// Usage: (fwrite f "text")
pub fn fwrite(interp: &mut Interpreter, _: &Environment, args: Vec<Value>) -> Value {
    guard(interp, args, |_, args| {
        check_arity("fwrite", args, 2)?;
        check_type("fwrite", args, 0, &[FILE])?;
        check_type("fwrite", args, 1, &[STRING])?;
        let handle = extract_file(&args[0])?;
        let text = extract_str(&args[1])?;

        handle
            .with_file(|file| file.write_all(text.as_bytes()))
            .ok_or("Cannot write to a closed file!")?
            .map_err(|e| io_error("fwrite", e))?;
        Ok(Value::default())
    })
}

/// Move to an absolute byte offset
/// Usage: (fseek f 0)
pub fn fseek(interp: &mut Interpreter, _: &Environment, args: Vec<Value>) -> Value {
    guard(interp, args, |_, args| {
        check_arity("fseek", args, 2)?;
        check_type("fseek", args, 0, &[FILE])?;
        check_type("fseek", args, 1, &[NUMBER])?;
        let handle = extract_file(&args[0])?;
        let offset = u64::try_from(extract_int(&args[1])?)
            .map_err(|_| "Function 'fseek' passed a negative offset.".to_string())?;

        handle
            .with_file(|file| file.seek(SeekFrom::Start(offset)))
            .ok_or("Cannot seek in a closed file!")?
            .map_err(|e| io_error("fseek", e))?;
        Ok(Value::default())
    })
}

/// Current byte offset
/// Usage: (ftell f) => 4
pub fn ftell(interp: &mut Interpreter, _: &Environment, args: Vec<Value>) -> Value {
    guard(interp, args, |_, args| {
        check_arity("ftell", args, 1)?;
        check_type("ftell", args, 0, &[FILE])?;
        let position = extract_file(&args[0])?
            .with_file(|file| file.stream_position())
            .ok_or("Cannot tell position in a closed file!")?
            .map_err(|e| io_error("ftell", e))?;
        i64::try_from(position)
            .map(Value::Number)
            .map_err(|_| "Function 'ftell' position does not fit a Number.".to_string())
    })
}

/// Go back to the start of the file
/// Usage: (rewind f)
pub fn rewind(interp: &mut Interpreter, _: &Environment, args: Vec<Value>) -> Value {
    guard(interp, args, |_, args| {
        check_arity("rewind", args, 1)?;
        check_type("rewind", args, 0, &[FILE])?;
        extract_file(&args[0])?
            .with_file(|file| file.rewind())
            .ok_or("Cannot rewind a closed file!")?
            .map_err(|e| io_error("rewind", e))?;
        Ok(Value::default())
    })
}

pub fn register_file_builtins(interp: &mut Interpreter) {
    interp.add_builtin("fopen", fopen);
    interp.add_builtin("fclose", fclose);
    interp.add_builtin("fread", fread);
    interp.add_builtin("fwrite", fwrite);
    interp.add_builtin("fseek", fseek);
    interp.add_builtin("ftell", ftell);
    interp.add_builtin("rewind", rewind);
}
