//! Recycling of list storage
//!
//! Evaluation constantly builds and discards short-lived argument lists.
//! The pool keeps the emptied backing buffers of released lists and hands
//! them out again, and counts how often it had to go to the allocator.

use std::mem;

use tracing::debug;

use crate::environment::Scope;
use crate::language::{Function, Lambda, Value};

/// Buffers larger than this are shrunk before being kept.
const MAX_POOLED_CAPACITY: usize = 64;

/// Capacity of a buffer created from scratch.
const INITIAL_CAPACITY: usize = 4;

// Deeply nested copies grow the stack on demand
const RED_ZONE: usize = 100 * 1024;
const STACK_PER_RECURSION: usize = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStats {
    /// Buffers obtained from the system allocator over the pool's lifetime
    pub allocations: usize,
    /// Allocations served from the free list
    pub reused: usize,
    /// Buffers currently waiting on the free list
    pub free: usize,
}

impl PoolStats {
    /// Buffers currently held by live values
    pub fn active(&self) -> usize {
        self.allocations.saturating_sub(self.free)
    }
}

#[derive(Debug, Default)]
pub struct Pool {
    free: Vec<Vec<Value>>,
    work: Vec<Value>,
    allocations: usize,
    reused: usize,
}

impl Pool {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty list buffer, recycled when one is available
    pub fn allocate(&mut self) -> Vec<Value> {
        match self.free.pop() {
            Some(cells) => {
                self.reused += 1;
                cells
            }
            None => {
                self.allocations += 1;
                Vec::with_capacity(INITIAL_CAPACITY)
            }
        }
    }

    /// Tear down a value without recursion, keeping the buffers of every
    /// list it owned.
    ///
    /// A list's children are moved onto the work stack before its emptied
    /// buffer is recycled. Closures give up their body and the values bound
    /// in their scope. Everything else is dropped in place, which for a file
    /// handle releases one share of the file.
    pub fn release(&mut self, value: Value) {
        let mut work = mem::take(&mut self.work);
        work.push(value);
        self.drain(work);
    }

    /// Release every value bound in a scope that is no longer reachable
    pub fn release_scope(&mut self, scope: Scope) {
        let mut work = mem::take(&mut self.work);
        work.extend(scope.into_values());
        self.drain(work);
    }

    fn drain(&mut self, mut work: Vec<Value>) {
        while let Some(value) = work.pop() {
            match value {
                Value::SExpr(mut cells) | Value::QExpr(mut cells) => {
                    work.append(&mut cells);
                    self.recycle(cells);
                }
                Value::Function(Function::Lambda(lambda)) => {
                    let Lambda { body, scope, .. } = *lambda;
                    work.extend(scope.into_values());
                    work.push(Value::SExpr(body));
                }
                other => drop(other),
            }
        }
        self.work = work;
    }

    /// Release a bare list buffer together with its contents
    pub fn release_cells(&mut self, cells: Vec<Value>) {
        self.release(Value::SExpr(cells));
    }

    fn recycle(&mut self, mut cells: Vec<Value>) {
        debug_assert!(cells.is_empty());
        if cells.capacity() == 0 {
            return;
        }
        if cells.capacity() > MAX_POOLED_CAPACITY {
            cells.shrink_to(MAX_POOLED_CAPACITY);
        }
        self.free.push(cells);
    }

    /// Deep copy of a value. Lists and closures, including the arguments a
    /// closure has already bound, get fresh storage from the pool; builtins
    /// and file handles are shared.
    pub fn copy(&mut self, value: &Value) -> Value {
        match value {
            Value::SExpr(cells) => Value::SExpr(self.copy_cells(cells)),
            Value::QExpr(cells) => Value::QExpr(self.copy_cells(cells)),
            Value::Function(Function::Lambda(lambda)) => {
                let body = self.copy_cells(&lambda.body);
                let mut scope = lambda.scope.empty_sibling();
                for (sym, bound) in lambda.scope.bindings() {
                    let bound = self.copy(bound);
                    scope.put(sym, bound);
                }
                Value::Function(Function::Lambda(Box::new(Lambda {
                    formals: lambda.formals.clone(),
                    body,
                    scope,
                })))
            }
            other => other.clone(),
        }
    }

    pub fn copy_cells(&mut self, cells: &[Value]) -> Vec<Value> {
        let mut copied = self.allocate();
        copied.reserve(cells.len());
        stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, || {
            for cell in cells {
                let cell = self.copy(cell);
                copied.push(cell);
            }
        });
        copied
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            allocations: self.allocations,
            reused: self.reused,
            free: self.free.len(),
        }
    }

    /// Hand every pooled buffer back to the system allocator.
    pub fn cleanup(&mut self) -> usize {
        let freed = self.free.len();
        self.free = Vec::new();
        self.work = Vec::new();
        debug!(freed, allocations = self.allocations, "pool cleanup");
        freed
    }
}
