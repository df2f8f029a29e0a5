//! Environment for variable bindings
//!
//! An Environment is a lexical scope holding symbol bindings. Scopes form a
//! chain towards the root; the link to a parent is non-owning, so a scope
//! never keeps its ancestors alive on its own.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use rustc_hash::FxHashMap;

use crate::interner::Symbol;
use crate::language::Value;

// ============================================================================
// Scope
// ============================================================================

/// The bindings of a single scope, kept in definition order.
#[derive(Clone, Default)]
pub struct Scope {
    data: Vec<(Symbol, Value)>,
    index: FxHashMap<Symbol, usize>,
    parent: Option<Weak<RefCell<Scope>>>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, sym: Symbol) -> Option<&Value> {
        self.index.get(&sym).map(|&slot| &self.data[slot].1)
    }

    /// Bind `sym`, returning the value it replaced, if any.
    pub fn put(&mut self, sym: Symbol, value: Value) -> Option<Value> {
        match self.index.get(&sym) {
            Some(&slot) => Some(std::mem::replace(&mut self.data[slot].1, value)),
            None => {
                self.index.insert(sym, self.data.len());
                self.data.push((sym, value));
                None
            }
        }
    }

    pub fn bindings(&self) -> impl Iterator<Item = (Symbol, &Value)> {
        self.data.iter().map(|(sym, value)| (*sym, value))
    }

    pub fn into_values(self) -> impl Iterator<Item = Value> {
        self.data.into_iter().map(|(_, value)| value)
    }

    /// An empty scope hanging off the same parent as this one
    pub fn empty_sibling(&self) -> Scope {
        Scope {
            parent: self.parent.clone(),
            ..Scope::default()
        }
    }

    pub fn set_parent(&mut self, parent: &Environment) {
        self.parent = Some(Rc::downgrade(&parent.state));
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.data.iter().map(|(sym, value)| (sym.resolve(), value)))
            .finish()
    }
}

// ============================================================================
// Environment
// ============================================================================

/// Shared handle to a scope.
///
/// Cloning is just an Rc increment; every clone sees the same bindings.
#[derive(Clone)]
pub struct Environment {
    state: Rc<RefCell<Scope>>,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    /// Create a new, empty root environment
    pub fn new() -> Self {
        Self::from_scope(Scope::new())
    }

    pub fn from_scope(scope: Scope) -> Self {
        Environment {
            state: Rc::new(RefCell::new(scope)),
        }
    }

    /// Create an empty child scope of this environment.
    ///
    /// The child does not keep its parent alive. Once every handle to the
    /// parent is gone the child silently becomes a root of its own.
    pub fn extend(&self) -> Self {
        let mut scope = Scope::new();
        scope.set_parent(self);
        Self::from_scope(scope)
    }

    /// Look up a binding, walking up the parent chain, and hand it to `f`
    pub fn lookup_with<R>(&self, sym: Symbol, f: impl FnOnce(&Value) -> R) -> Option<R> {
        let mut current = Rc::clone(&self.state);
        loop {
            let parent = {
                let scope = current.borrow();
                if let Some(value) = scope.get(sym) {
                    return Some(f(value));
                }
                scope.parent.as_ref().and_then(Weak::upgrade)
            };
            current = parent?;
        }
    }

    /// Look up a copy of a binding, walking up the parent chain
    pub fn lookup(&self, sym: Symbol) -> Option<Value> {
        self.lookup_with(sym, Value::clone)
    }

    /// Like [`Environment::lookup`], but an unbound symbol becomes an error value
    pub fn get(&self, sym: Symbol) -> Value {
        self.lookup(sym).unwrap_or_else(|| unbound(sym))
    }

    /// Define or reassign a binding in THIS scope
    pub fn put(&self, sym: Symbol, value: Value) -> Option<Value> {
        self.state.borrow_mut().put(sym, value)
    }

    /// Define or reassign a binding in the root scope
    pub fn def(&self, sym: Symbol, value: Value) -> Option<Value> {
        self.root().put(sym, value)
    }

    pub fn parent(&self) -> Option<Environment> {
        let state = self.state.borrow().parent.as_ref().and_then(Weak::upgrade)?;
        Some(Environment { state })
    }

    pub fn root(&self) -> Environment {
        let mut current = self.clone();
        while let Some(parent) = current.parent() {
            current = parent;
        }
        current
    }

    pub fn is_root(&self) -> bool {
        self.parent().is_none()
    }

    /// Snapshot of this scope's own bindings, in definition order
    pub fn bindings(&self) -> Vec<(Symbol, Value)> {
        self.state
            .borrow()
            .bindings()
            .map(|(sym, value)| (sym, value.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.state.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().is_empty()
    }

    /// Take the scope back out of the handle, if this was the last one
    pub fn into_scope(self) -> Option<Scope> {
        Rc::try_unwrap(self.state).ok().map(RefCell::into_inner)
    }

    pub fn ptr_eq(&self, other: &Environment) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("bindings", &self.len())
            .field("root", &self.is_root())
            .finish()
    }
}

pub fn unbound(sym: Symbol) -> Value {
    Value::error(format!("Unbound Symbol '{sym}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(name: &str) -> Symbol {
        Symbol::new(name)
    }

    #[test]
    fn test_lookup_walks_parent_chain() {
        let root = Environment::new();
        root.put(sym("x"), Value::Number(1));
        let child = root.extend();
        let grandchild = child.extend();

        assert_eq!(grandchild.lookup(sym("x")), Some(Value::Number(1)));
        child.put(sym("x"), Value::Number(2));
        assert_eq!(grandchild.lookup(sym("x")), Some(Value::Number(2)));
        assert_eq!(root.lookup(sym("x")), Some(Value::Number(1)));
    }

    #[test]
    fn test_unbound_symbol_is_error() {
        let env = Environment::new();
        assert_eq!(
            env.get(sym("missing")),
            Value::error("Unbound Symbol 'missing'")
        );
    }

    #[test]
    fn test_put_replaces_in_place() {
        let env = Environment::new();
        env.put(sym("a"), Value::Number(1));
        env.put(sym("b"), Value::Number(2));
        let old = env.put(sym("a"), Value::Number(3));

        assert_eq!(old, Some(Value::Number(1)));
        let names: Vec<String> = env.bindings().iter().map(|(s, _)| s.resolve()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(env.lookup(sym("a")), Some(Value::Number(3)));
    }

    #[test]
    fn test_def_binds_at_root() {
        let root = Environment::new();
        let middle = root.extend();
        let child = middle.extend();
        child.def(sym("g"), Value::Number(9));

        assert!(child.is_empty());
        assert!(middle.is_empty());
        assert_eq!(root.lookup(sym("g")), Some(Value::Number(9)));
        assert!(child.root().ptr_eq(&root));
    }

    #[test]
    fn test_parent_link_does_not_own() {
        let child = {
            let root = Environment::new();
            root.put(sym("gone"), Value::Number(1));
            root.extend()
        };
        assert!(child.is_root());
        assert_eq!(child.lookup(sym("gone")), None);
    }

    #[test]
    fn test_dropped_middle_scope_detaches_child() {
        let root = Environment::new();
        let child = root.extend().extend();
        assert!(child.is_root());
        child.def(sym("local"), Value::Number(1));
        assert_eq!(child.len(), 1);
        assert!(root.is_empty());
    }

    #[test]
    fn test_into_scope_needs_the_last_handle() {
        let env = Environment::new();
        env.put(sym("x"), Value::Number(1));
        let other = env.clone();
        assert!(env.into_scope().is_none());

        let scope = other.into_scope().expect("last handle");
        assert_eq!(scope.get(sym("x")), Some(&Value::Number(1)));
    }

    #[test]
    fn test_empty_sibling_keeps_parent() {
        let root = Environment::new();
        root.put(sym("g"), Value::Number(3));
        let mut scope = Scope::new();
        scope.set_parent(&root);
        scope.put(sym("x"), Value::Number(1));

        let sibling = Environment::from_scope(scope.empty_sibling());
        assert!(sibling.is_empty());
        assert_eq!(sibling.lookup(sym("g")), Some(Value::Number(3)));
    }
}
