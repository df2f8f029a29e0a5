use std::cell::RefCell;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::environment::{Environment, Scope};
use crate::interner::Symbol;
use crate::interpreter::Interpreter;

// ============================================================================
// Core Type System
// ============================================================================

/// Native function type - Rust functions callable from lispy.
///
/// Receives the calling environment and the already-evaluated arguments,
/// and owns both the arguments and the returned value.
pub type BuiltinFn = fn(&mut Interpreter, &Environment, Vec<Value>) -> Value;

/// How the evaluator applies a builtin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinKind {
    /// Called directly; its result is the value of the expression
    Native,
    /// Branch selection performed by the evaluator itself as a tail call
    Conditional,
}

#[derive(Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    pub func: BuiltinFn,
    pub kind: BuiltinKind,
}

impl Builtin {
    pub fn new(name: &'static str, func: BuiltinFn) -> Self {
        Builtin {
            name,
            func,
            kind: BuiltinKind::Native,
        }
    }

    pub fn conditional(name: &'static str, func: BuiltinFn) -> Self {
        Builtin {
            name,
            func,
            kind: BuiltinKind::Conditional,
        }
    }
}

// Builtins are equal when they share the same native callable.
impl PartialEq for Builtin {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::fn_addr_eq(self.func, other.func)
    }
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builtin")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

/// A user-defined function.
///
/// `scope` holds the arguments bound so far (partial application); its
/// parent link is only fixed when the closure is finally invoked.
#[derive(Clone, Debug)]
pub struct Lambda {
    pub formals: Vec<Symbol>,
    pub body: Vec<Value>,
    pub scope: Scope,
}

impl Lambda {
    pub fn new(formals: Vec<Symbol>, body: Vec<Value>) -> Self {
        Lambda {
            formals,
            body,
            scope: Scope::new(),
        }
    }
}

// Compare only formals and body, never the captured scope
impl PartialEq for Lambda {
    fn eq(&self, other: &Self) -> bool {
        self.formals == other.formals && self.body == other.body
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Function {
    Builtin(Builtin),
    Lambda(Box<Lambda>),
}

/// An externally opened file shared by every copy of its handle.
#[derive(Debug)]
pub struct OpenFile {
    path: PathBuf,
    mode: String,
    file: Option<File>,
}

/// Reference-counted file handle.
///
/// Cloning shares the underlying file; it is closed when the last handle
/// is dropped, or earlier by an explicit [`FileHandle::close`].
#[derive(Clone, Debug)]
pub struct FileHandle {
    inner: Rc<RefCell<OpenFile>>,
}

impl FileHandle {
    pub fn new(path: impl Into<PathBuf>, mode: impl Into<String>, file: File) -> Self {
        FileHandle {
            inner: Rc::new(RefCell::new(OpenFile {
                path: path.into(),
                mode: mode.into(),
                file: Some(file),
            })),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.inner.borrow().path.clone()
    }

    pub fn mode(&self) -> String {
        self.inner.borrow().mode.clone()
    }

    pub fn is_open(&self) -> bool {
        self.inner.borrow().file.is_some()
    }

    /// Close the file for every handle sharing it. Returns false if it was
    /// already closed.
    pub fn close(&self) -> bool {
        self.inner.borrow_mut().file.take().is_some()
    }

    /// Run `f` against the open file, or return `None` once closed
    pub fn with_file<R>(&self, f: impl FnOnce(&mut File) -> R) -> Option<R> {
        self.inner.borrow_mut().file.as_mut().map(f)
    }

    /// Number of live handles sharing this file
    pub fn ref_count(&self) -> usize {
        Rc::strong_count(&self.inner)
    }
}

impl PartialEq for FileHandle {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Number(i64),
    Decimal(f64),
    Error(String),
    Symbol(Symbol),
    Str(String),
    SExpr(Vec<Value>),
    QExpr(Vec<Value>),
    Function(Function),
    File(FileHandle),
}

/// The empty S-Expression `()`, returned by builtins run for effect.
impl Default for Value {
    fn default() -> Self {
        Value::SExpr(Vec::new())
    }
}

impl Value {
    pub fn error(message: impl Into<String>) -> Self {
        Value::Error(message.into())
    }

    pub fn symbol(name: &str) -> Self {
        Value::Symbol(Symbol::new(name))
    }

    pub fn string(text: impl Into<String>) -> Self {
        Value::Str(text.into())
    }

    pub fn builtin(name: &'static str, func: BuiltinFn) -> Self {
        Value::Function(Function::Builtin(Builtin::new(name, func)))
    }

    pub fn lambda(formals: Vec<Symbol>, body: Vec<Value>) -> Self {
        Value::Function(Function::Lambda(Box::new(Lambda::new(formals, body))))
    }

    pub fn bool(b: bool) -> Self {
        Value::Number(i64::from(b))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    /// Branch truthiness: nonzero numbers and non-empty lists are true,
    /// errors are false, and everything else is true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Number(n) => *n != 0,
            Value::Decimal(d) => *d != 0.0,
            Value::SExpr(cells) | Value::QExpr(cells) => !cells.is_empty(),
            Value::Error(_) => false,
            _ => true,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "Number",
            Value::Decimal(_) => "Decimal",
            Value::Error(_) => "Error",
            Value::Symbol(_) => "Symbol",
            Value::Str(_) => "String",
            Value::SExpr(_) => "S-Expression",
            Value::QExpr(_) => "Q-Expression",
            Value::Function(_) => "Function",
            Value::File(_) => "File",
        }
    }

    /// The children of either list form
    pub fn cells(&self) -> Option<&[Value]> {
        match self {
            Value::SExpr(cells) | Value::QExpr(cells) => Some(cells),
            _ => None,
        }
    }

    /// Retag a Q-Expression as an evaluable S-Expression; other values pass
    /// through untouched.
    pub fn into_sexpr(self) -> Value {
        match self {
            Value::QExpr(cells) => Value::SExpr(cells),
            other => other,
        }
    }

    /// Retag an S-Expression as a literal Q-Expression
    pub fn into_qexpr(self) -> Value {
        match self {
            Value::SExpr(cells) => Value::QExpr(cells),
            other => other,
        }
    }
}

// ============================================================================
// String Escaping
// ============================================================================

/// Escape text for display inside double quotes
pub fn escape(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\x07' => result.push_str("\\a"),
            '\x08' => result.push_str("\\b"),
            '\x0c' => result.push_str("\\f"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            '\x0b' => result.push_str("\\v"),
            '\\' => result.push_str("\\\\"),
            '"' => result.push_str("\\\""),
            c => result.push(c),
        }
    }
    result
}

/// Decode the escapes of a string literal. Unknown escapes are kept
/// verbatim, backslash included.
pub fn unescape(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('a') => result.push('\x07'),
            Some('b') => result.push('\x08'),
            Some('f') => result.push('\x0c'),
            Some('n') => result.push('\n'),
            Some('r') => result.push('\r'),
            Some('t') => result.push('\t'),
            Some('v') => result.push('\x0b'),
            Some('\\') => result.push('\\'),
            Some('"') => result.push('"'),
            Some(other) => {
                result.push('\\');
                result.push(other);
            }
            None => result.push('\\'),
        }
    }
    result
}

// ============================================================================
// Display Implementation
// ============================================================================

fn write_cells(f: &mut fmt::Formatter, cells: &[Value], open: char, close: char) -> fmt::Result {
    write!(f, "{open}")?;
    for (i, cell) in cells.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{cell}")?;
    }
    write!(f, "{close}")
}

/// Decimals always carry a decimal point so they read back as decimals.
fn write_decimal(f: &mut fmt::Formatter, d: f64) -> fmt::Result {
    let text = d.to_string();
    if d.is_finite() && !text.contains('.') {
        write!(f, "{text}.0")
    } else {
        write!(f, "{text}")
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Function::Builtin(_) => write!(f, "<builtin>"),
            Function::Lambda(lambda) => {
                write!(f, "(\\ {{")?;
                for (i, formal) in lambda.formals.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{formal}")?;
                }
                write!(f, "}} ")?;
                write_cells(f, &lambda.body, '{', '}')?;
                write!(f, ")")
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
            Value::Decimal(d) => write_decimal(f, *d),
            Value::Error(message) => write!(f, "Error: {message}"),
            Value::Symbol(sym) => write!(f, "{sym}"),
            Value::Str(s) => write!(f, "\"{}\"", escape(s)),
            Value::SExpr(cells) => write_cells(f, cells, '(', ')'),
            Value::QExpr(cells) => write_cells(f, cells, '{', '}'),
            Value::Function(func) => write!(f, "{func}"),
            Value::File(handle) => {
                write!(f, "<file '{}' {}>", display_path(&handle.path()), handle.mode())
            }
        }
    }
}

fn display_path(path: &Path) -> String {
    path.display().to_string()
}
