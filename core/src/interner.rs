//! Symbol interning
//!
//! Every identifier read by the parser is interned once, so symbol
//! comparison and environment lookups hash a small integer instead of text.

use once_cell::sync::Lazy;
use std::fmt;
use std::sync::RwLock;
use string_interner::{DefaultBackend, DefaultSymbol, StringInterner};

static INTERNER: Lazy<RwLock<StringInterner<DefaultBackend>>> =
    Lazy::new(|| RwLock::new(StringInterner::default()));

/// The formal-parameter marker that collects remaining arguments.
pub const REST_MARKER: &str = "&";

static REST_SYMBOL: Lazy<Symbol> = Lazy::new(|| Symbol::new(REST_MARKER));

/// A symbol that has been interned in the global string interner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Symbol(DefaultSymbol);

impl Symbol {
    /// Intern a string and return its symbol
    pub fn new(s: &str) -> Self {
        let mut interner = INTERNER.write().unwrap_or_else(|e| e.into_inner());
        Symbol(interner.get_or_intern(s))
    }

    /// Resolve the symbol back to an owned string
    pub fn resolve(&self) -> String {
        self.with_str(str::to_string)
    }

    /// Resolve the symbol and run a function with the string slice,
    /// avoiding the allocation `resolve` makes.
    pub fn with_str<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&str) -> R,
    {
        let interner = INTERNER.read().unwrap_or_else(|e| e.into_inner());
        // Symbols only come from `Symbol::new`, so the lookup cannot miss.
        f(interner.resolve(self.0).unwrap_or_default())
    }

    /// True for `&`, the rest-argument marker in a formals list
    pub fn is_rest_marker(&self) -> bool {
        *self == *REST_SYMBOL
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.with_str(|s| write!(f, "{s}"))
    }
}
