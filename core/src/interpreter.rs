use std::mem;

use tracing::trace;

use crate::environment::{Environment, Scope, unbound};
use crate::interner::Symbol;
use crate::language::{Builtin, BuiltinFn, BuiltinKind, Function, Lambda, Value};
use crate::parser;
use crate::pool::Pool;

const RED_ZONE: usize = 100 * 1024;
const STACK_PER_RECURSION: usize = 1024 * 1024;

// ============================================================================
// Interpreter
// ============================================================================

/// One independent interpreter: its own pool and root environment.
pub struct Interpreter {
    pool: Pool,
    root: Environment,
    halted: bool,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// An interpreter with an empty root environment. Builtins are
    /// registered by the embedding host.
    pub fn new() -> Self {
        Interpreter {
            pool: Pool::new(),
            root: Environment::new(),
            halted: false,
        }
    }

    pub fn root(&self) -> &Environment {
        &self.root
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut Pool {
        &mut self.pool
    }

    pub fn parse(&mut self, input: &str) -> Value {
        parser::parse(input, &mut self.pool)
    }

    /// Evaluate a value in the root environment
    pub fn eval(&mut self, value: Value) -> Value {
        let root = self.root.clone();
        evaluate(self, &root, value)
    }

    pub fn evaluate_in(&mut self, env: &Environment, value: Value) -> Value {
        evaluate(self, env, value)
    }

    /// Parse `input` and evaluate each top-level form in the root, in order.
    /// A parse failure yields the single parse error.
    pub fn eval_str(&mut self, input: &str) -> Vec<Value> {
        match self.parse(input) {
            Value::SExpr(mut forms) => {
                let results = forms.drain(..).map(|form| self.eval(form)).collect();
                self.pool.release_cells(forms);
                results
            }
            other => vec![other],
        }
    }

    pub fn add_builtin(&mut self, name: &'static str, func: BuiltinFn) {
        self.add_builtin_kind(name, func, BuiltinKind::Native);
    }

    pub fn add_builtin_kind(&mut self, name: &'static str, func: BuiltinFn, kind: BuiltinKind) {
        let builtin = Builtin { name, func, kind };
        if let Some(old) = self
            .root
            .put(Symbol::new(name), Value::Function(Function::Builtin(builtin)))
        {
            self.pool.release(old);
        }
    }

    /// Ask the host loop to stop after the current form
    pub fn halt(&mut self) {
        self.halted = true;
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }
}

// ============================================================================
// Evaluator
// ============================================================================

/// Evaluate `value` in `env`.
///
/// Applications in tail position (a chosen conditional branch, the body of
/// a fully applied closure) continue this loop instead of recursing, so
/// tail-recursive programs run in constant native stack.
pub fn evaluate(interp: &mut Interpreter, env: &Environment, value: Value) -> Value {
    let mut frame = Frame {
        env: env.clone(),
        call_scope: false,
    };
    let result = trampoline(interp, &mut frame, value);
    frame.leave(&mut interp.pool);
    result
}

/// The environment the trampoline is running in.
struct Frame {
    env: Environment,
    /// Set once `env` is a call scope created by this trampoline
    call_scope: bool,
}

impl Frame {
    /// Switch to a fresh call scope, giving the bindings of the call scope
    /// being left back to the pool.
    fn enter(&mut self, pool: &mut Pool, scope: Scope, parent: &Environment) {
        let previous = mem::replace(&mut self.env, Environment::from_scope(scope));
        if mem::replace(&mut self.call_scope, true) && !previous.ptr_eq(parent) {
            release_env(pool, previous);
        }
    }

    fn leave(self, pool: &mut Pool) {
        if self.call_scope {
            release_env(pool, self.env);
        }
    }
}

// A scope still shared elsewhere is left to its other handles.
fn release_env(pool: &mut Pool, env: Environment) {
    if let Some(scope) = env.into_scope() {
        pool.release_scope(scope);
    }
}

fn trampoline(interp: &mut Interpreter, frame: &mut Frame, value: Value) -> Value {
    let mut value = value;

    loop {
        let mut cells = match value {
            Value::Symbol(sym) => {
                return frame
                    .env
                    .lookup_with(sym, |bound| interp.pool.copy(bound))
                    .unwrap_or_else(|| unbound(sym));
            }
            Value::SExpr(cells) => cells,
            other => return other,
        };

        for i in 0..cells.len() {
            let child = mem::take(&mut cells[i]);
            let result = stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, || {
                evaluate(interp, &frame.env, child)
            });
            if result.is_error() {
                interp.pool.release_cells(cells);
                return result;
            }
            cells[i] = result;
        }

        if cells.is_empty() {
            return Value::SExpr(cells);
        }
        if cells.len() == 1 && !matches!(cells[0], Value::Function(_)) {
            let only = cells.swap_remove(0);
            interp.pool.release_cells(cells);
            return only;
        }

        let mut args = cells;
        let func = match args.remove(0) {
            Value::Function(func) => func,
            other => {
                let message = format!(
                    "S-Expression starts with incorrect type. Got {}, Expected Function.",
                    other.type_name()
                );
                interp.pool.release(other);
                interp.pool.release_cells(args);
                return Value::error(message);
            }
        };

        match func {
            Function::Builtin(builtin) if builtin.kind == BuiltinKind::Conditional => {
                match select_branch(&mut interp.pool, builtin.name, args) {
                    Ok(branch) => {
                        trace!(builtin = builtin.name, "tail call into branch");
                        value = branch;
                    }
                    Err(error) => return error,
                }
            }
            Function::Builtin(builtin) => return (builtin.func)(interp, &frame.env, args),
            Function::Lambda(lambda) => match bind(&mut interp.pool, *lambda, args) {
                Err(error) => return error,
                Ok(Binding::Partial(lambda)) => {
                    trace!(remaining = lambda.formals.len(), "partial application");
                    return Value::Function(Function::Lambda(Box::new(lambda)));
                }
                Ok(Binding::Complete(lambda)) => {
                    // Hang the call scope off the caller's parent so chains
                    // of tail calls never lengthen the scope chain.
                    let parent = frame.env.parent().unwrap_or_else(|| frame.env.clone());
                    let Lambda { body, mut scope, .. } = lambda;
                    scope.set_parent(&parent);
                    trace!(bound = scope.len(), "tail call into closure body");
                    frame.enter(&mut interp.pool, scope, &parent);
                    value = Value::SExpr(body);
                }
            },
        }
    }
}

/// Native fallback for the conditional builtin when it is invoked directly
/// rather than intercepted by [`evaluate`].
pub fn conditional(interp: &mut Interpreter, env: &Environment, args: Vec<Value>) -> Value {
    match select_branch(&mut interp.pool, "if", args) {
        Ok(branch) => evaluate(interp, env, branch),
        Err(error) => error,
    }
}

/// Check `cond {then} {else}` and return the chosen branch, ready to run.
fn select_branch(pool: &mut Pool, name: &str, mut args: Vec<Value>) -> Result<Value, Value> {
    if args.len() != 3 {
        let message = format!(
            "Function '{name}' passed incorrect number of arguments. Got {}, Expected 3.",
            args.len()
        );
        pool.release_cells(args);
        return Err(Value::error(message));
    }
    if !matches!(args[0], Value::Number(_)) {
        let message = format!(
            "Function '{name}' passed incorrect type for condition. Got {}, Expected Number.",
            args[0].type_name()
        );
        pool.release_cells(args);
        return Err(Value::error(message));
    }
    if !matches!((&args[1], &args[2]), (Value::QExpr(_), Value::QExpr(_))) {
        pool.release_cells(args);
        return Err(Value::error(format!(
            "Function '{name}' passed incorrect type for branches."
        )));
    }

    let chosen = if args[0].is_truthy() { 1 } else { 2 };
    let branch = args.swap_remove(chosen);
    pool.release_cells(args);
    Ok(branch.into_sexpr())
}

enum Binding {
    /// Formals remain; the closure is returned as a value
    Partial(Lambda),
    /// Every formal is bound; the body is ready to run
    Complete(Lambda),
}

/// Bind arguments to formals left to right, into the closure's own scope.
/// The argument buffer goes back to the pool once emptied.
fn bind(pool: &mut Pool, mut lambda: Lambda, mut args: Vec<Value>) -> Result<Binding, Value> {
    let given = args.len();
    let expected = lambda.formals.len();
    let mut formals = mem::take(&mut lambda.formals).into_iter();
    // popped from the back, so reversed first
    args.reverse();

    while let Some(arg) = args.pop() {
        let Some(formal) = formals.next() else {
            pool.release(arg);
            pool.release_cells(args);
            pool.release(Value::Function(Function::Lambda(Box::new(lambda))));
            return Err(Value::error(format!(
                "Function passed too many arguments. Got {given}, Expected {expected}."
            )));
        };

        if formal.is_rest_marker() {
            let Some(rest) = single(&mut formals) else {
                pool.release(arg);
                pool.release_cells(args);
                pool.release(Value::Function(Function::Lambda(Box::new(lambda))));
                return Err(invalid_rest_marker());
            };
            let mut collected = pool.allocate();
            collected.push(arg);
            args.reverse();
            collected.append(&mut args);
            release_old(pool, lambda.scope.put(rest, Value::QExpr(collected)));
            break;
        }

        release_old(pool, lambda.scope.put(formal, arg));
    }
    pool.release_cells(args);

    let mut remaining: Vec<Symbol> = formals.collect();
    if remaining.first().is_some_and(Symbol::is_rest_marker) {
        if remaining.len() != 2 {
            pool.release(Value::Function(Function::Lambda(Box::new(lambda))));
            return Err(invalid_rest_marker());
        }
        let empty = pool.allocate();
        release_old(pool, lambda.scope.put(remaining[1], Value::QExpr(empty)));
        remaining.clear();
    }

    lambda.formals = remaining;
    if lambda.formals.is_empty() {
        Ok(Binding::Complete(lambda))
    } else {
        Ok(Binding::Partial(lambda))
    }
}

/// The one symbol left after a rest marker, or `None` if there are more or fewer.
fn single(formals: &mut impl Iterator<Item = Symbol>) -> Option<Symbol> {
    match (formals.next(), formals.next()) {
        (Some(sym), None) => Some(sym),
        _ => None,
    }
}

fn invalid_rest_marker() -> Value {
    Value::error("Function format invalid. Symbol '&' not followed by single symbol.")
}

fn release_old(pool: &mut Pool, old: Option<Value>) {
    if let Some(old) = old {
        pool.release(old);
    }
}
