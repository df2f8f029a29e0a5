use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

// Helper function to get the path to the lispy binary
fn lispy_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_lispy"))
}

fn temp_path(extension: &str) -> PathBuf {
    std::env::temp_dir().join(format!("lispy_run_{}.{extension}", rand::random::<u32>()))
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}

// Helper function to create a temp file and run it
fn run_lispy_file(content: &str, extra_args: &[&str]) -> Output {
    let file_path = temp_path("lspy");
    fs::write(&file_path, content).expect("failed to write script");

    let output = Command::new(lispy_binary())
        .arg("--no-memory-log")
        .args(extra_args)
        .arg(&file_path)
        .output()
        .expect("failed to run lispy");

    fs::remove_file(&file_path).ok();
    output
}

fn run_lispy_eval(expr: &str, extra_args: &[&str]) -> Output {
    Command::new(lispy_binary())
        .arg("--no-memory-log")
        .args(extra_args)
        .args(["-e", expr])
        .output()
        .expect("failed to run lispy")
}

// ============================================================================
// Running Files
// ============================================================================

#[test]
fn test_print_output() {
    let output = run_lispy_file(
        r#"
(print "hello" 1 {2 3})
(show "raw\ttext")
"#,
        &[],
    );
    assert!(output.status.success());
    assert_eq!(stdout_of(&output), "\"hello\" 1 {2 3}\nraw\ttext");
}

#[test]
fn test_errors_are_printed_and_loading_continues() {
    let output = run_lispy_file(
        r#"
; an error in the middle of a file
(+ 1 {})
(print "after")
"#,
        &[],
    );
    assert!(output.status.success());
    assert_eq!(
        stdout_of(&output),
        "Error: Function '+' passed incorrect type for argument 1. Got Q-Expression, Expected Number.\n\"after\""
    );
}

#[test]
fn test_definitions_span_the_file() {
    let output = run_lispy_file(
        r#"
(fun {square x} {* x x})
(def {xs} (map square {1 2 3}))
(print xs (sum xs))
"#,
        &[],
    );
    assert_eq!(stdout_of(&output), "{1 4 9} 14");
}

#[test]
fn test_deep_tail_recursion_in_file() {
    let output = run_lispy_file(
        r#"
(fun {loop n acc} {if (== n 0) {acc} {loop (- n 1) (+ acc 1)}})
(print (loop 200000 0))
"#,
        &[],
    );
    assert!(output.status.success());
    assert_eq!(stdout_of(&output), "200000");
}

#[test]
fn test_exit_stops_the_file() {
    let output = run_lispy_file("(print 1)\n(exit)\n(print 2)\n", &[]);
    assert!(output.status.success());
    assert_eq!(stdout_of(&output), "1");
}

#[test]
fn test_parse_error_fails_the_run() {
    let output = run_lispy_file("(print 1", &[]);
    assert!(!output.status.success());
    assert_eq!(stdout_of(&output), "");
    assert!(stderr_of(&output).contains("Missing closing parenthesis/brace"));
}

#[test]
fn test_missing_file() {
    let missing = temp_path("lspy");
    let output = Command::new(lispy_binary())
        .arg("--no-memory-log")
        .arg(&missing)
        .output()
        .expect("failed to run lispy");
    assert!(!output.status.success());
    assert!(stderr_of(&output).contains("Could not open file"));
}

// ============================================================================
// Command-line Switches
// ============================================================================

#[test]
fn test_eval_switch() {
    let output = run_lispy_eval("(+ 1 2) (sum {1 2 3})", &[]);
    assert!(output.status.success());
    assert_eq!(stdout_of(&output), "3\n6");
}

#[test]
fn test_no_prelude() {
    let output = run_lispy_eval("(sum {1 2})", &["--no-prelude"]);
    assert!(!output.status.success());
    assert_eq!(stdout_of(&output), "Error: Unbound Symbol 'sum'");
}

#[test]
fn test_memory_log_is_appended() {
    let log = temp_path("log");
    for _ in 0..2 {
        let output = Command::new(lispy_binary())
            .arg("--memory-log")
            .arg(&log)
            .args(["-e", "(+ 1 2)"])
            .output()
            .expect("failed to run lispy");
        assert!(output.status.success());
    }

    let contents = fs::read_to_string(&log).expect("memory log missing");
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 2);
    for line in lines {
        assert!(line.starts_with('['), "bad line {line}");
        assert!(line.contains("] Total Allocs: "), "bad line {line}");
        assert!(line.contains(" | Free Objects: "), "bad line {line}");
        assert!(line.contains(" | Active Objects: "), "bad line {line}");
    }
    fs::remove_file(&log).ok();
}

// ============================================================================
// REPL
// ============================================================================

#[test]
fn test_repl_reads_stdin() {
    let history = temp_path("history");
    let mut child = Command::new(lispy_binary())
        .arg("--no-memory-log")
        .arg("--history")
        .arg(&history)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to start lispy");

    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(b"(def {x}\n 41)\n(+ x 1)\n")
        .expect("failed to write to lispy");
    let output = child.wait_with_output().expect("lispy did not finish");

    let stdout = stdout_of(&output);
    assert!(output.status.success());
    assert!(stdout.contains("Lispy Version 0.0.0.0.1"));
    assert!(stdout.contains("42"));
    fs::remove_file(&history).ok();
}
