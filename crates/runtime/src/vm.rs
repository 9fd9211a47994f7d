//! The execution context
//!
//! A `Vm` bundles the heap, the operand stack and the source location the
//! generated program last reported. Every built-in word is a method on `Vm`
//! (spread over the `*_ops` modules) that performs one atomic transition of
//! the stack or returns an error.
//!
//! Instances are independent: tests create as many as they like, and the C
//! ABI keeps exactly one per thread (see `ffi.rs`).

use crate::config::RuntimeConfig;
use kk_core::{Cell, Heap, Kind, ObjRef, OperandStack, Result, RuntimeError};
use std::fmt;

/// Source position of the word being executed, for diagnostics only
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: Option<String>,
    pub line: u32,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{}: {}", file, self.line),
            None => write!(f, "{}", self.line),
        }
    }
}

/// Heap + operand stack + current location
#[derive(Debug, Default)]
pub struct Vm {
    pub(crate) heap: Heap,
    pub(crate) stack: OperandStack,
    location: SourceLocation,
}

impl Vm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a VM sized according to the runtime configuration
    pub fn with_config(config: &RuntimeConfig) -> Self {
        Vm {
            heap: Heap::new(),
            stack: OperandStack::with_capacity(config.stack_capacity),
            location: SourceLocation::default(),
        }
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    pub fn stack(&self) -> &OperandStack {
        &self.stack
    }

    /// Number of cells on the operand stack
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    /// Record the source position of the next call
    pub fn set_location(&mut self, file: Option<&str>, line: u32) {
        if self.location.file.as_deref() != file {
            self.location.file = file.map(str::to_owned);
        }
        self.location.line = line;
    }

    pub fn location(&self) -> &SourceLocation {
        &self.location
    }

    // =========================================================================
    // Literals
    // =========================================================================

    pub fn push_null(&mut self) {
        self.stack.push_owned(Cell::Null);
    }

    pub fn push_float(&mut self, value: f64) {
        self.stack.push_owned(Cell::Float(value));
    }

    pub fn push_char(&mut self, value: u8) {
        self.stack.push_owned(Cell::Char(value));
    }

    /// Allocate a string literal and push it
    pub fn push_string(&mut self, bytes: &[u8]) -> Result<()> {
        let r = self.heap.alloc_string(bytes)?;
        self.stack.push_owned(Cell::Object(r));
        Ok(())
    }

    // =========================================================================
    // Ownership helpers shared by the word modules
    // =========================================================================

    /// Push a shared cell (retained)
    pub fn push(&mut self, cell: Cell) {
        self.stack.push(&mut self.heap, cell);
    }

    /// Push a cell whose reference the caller gives up
    pub fn push_owned(&mut self, cell: Cell) {
        self.stack.push_owned(cell);
    }

    /// Pop the top cell; the caller owns the result
    pub fn pop(&mut self) -> Result<Cell> {
        self.stack.pop()
    }

    /// Pop `( a b -- )` as `(a, b)`, `b` being the most recent
    pub(crate) fn pop_two(&mut self) -> Result<(Cell, Cell)> {
        self.stack.require(2)?;
        let b = self.stack.pop()?;
        let a = self.stack.pop()?;
        Ok((a, b))
    }

    /// Give up ownership of a popped cell
    pub fn release(&mut self, cell: Cell) {
        self.heap.release(cell);
    }

    /// Release popped operands and return `err`
    pub(crate) fn fail<T>(&mut self, cells: &[Cell], err: RuntimeError) -> Result<T> {
        for &cell in cells {
            self.heap.release(cell);
        }
        tracing::debug!(location = %self.location, error = %err, "word failed");
        Err(err)
    }

    /// Abstract type of a cell
    pub fn kind(&self, cell: Cell) -> Kind {
        self.heap.kind(cell)
    }

    /// The top cell as a float index, truncated toward zero like the
    /// generated code's integer casts.
    pub(crate) fn pop_index(&mut self, word: &str) -> Result<i64> {
        match self.stack.pop()? {
            Cell::Float(f) => Ok(f as i64),
            other => {
                let kind = self.kind(other);
                self.fail(
                    &[other],
                    RuntimeError::type_error(format!("{}: cannot use {} as an index", word, kind)),
                )
            }
        }
    }

    /// Object behind a cell, or a type error naming `what` the word wanted
    pub(crate) fn expect_object(&self, word: &str, cell: Cell, what: Kind) -> Result<ObjRef> {
        match cell {
            Cell::Object(r) if self.heap.get(r).kind() == what => Ok(r),
            _ => Err(RuntimeError::type_error(format!(
                "{}: expected {}, got {}",
                word,
                what,
                self.kind(cell)
            ))),
        }
    }

    /// Release every cell on the stack
    pub fn clear(&mut self) {
        self.stack.clear(&mut self.heap);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literals() {
        let mut vm = Vm::new();
        vm.push_null();
        vm.push_float(1.5);
        vm.push_char(b'x');
        vm.push_string(b"lit").unwrap();
        assert_eq!(vm.depth(), 4);

        let s = vm.pop().unwrap();
        assert_eq!(vm.heap().string_bytes(s), Some(&b"lit"[..]));
        assert_eq!(vm.heap().refcount(s.as_object().unwrap()), 1);
        vm.release(s);
        assert_eq!(vm.pop().unwrap(), Cell::Char(b'x'));
        assert_eq!(vm.pop().unwrap(), Cell::Float(1.5));
        assert_eq!(vm.pop().unwrap(), Cell::Null);
        assert_eq!(vm.heap().live_objects(), 0);
    }

    #[test]
    fn test_location_display() {
        let mut vm = Vm::new();
        vm.set_location(Some("main.kk"), 12);
        assert_eq!(vm.location().to_string(), "main.kk: 12");
        vm.set_location(None, 3);
        assert_eq!(vm.location().to_string(), "3");
    }

    #[test]
    fn test_pop_two_order() {
        let mut vm = Vm::new();
        vm.push_float(3.0);
        vm.push_float(4.0);
        assert_eq!(vm.pop_two().unwrap(), (Cell::Float(3.0), Cell::Float(4.0)));
    }

    #[test]
    fn test_pop_two_underflow_keeps_stack() {
        let mut vm = Vm::new();
        vm.push_float(3.0);
        assert_eq!(
            vm.pop_two(),
            Err(RuntimeError::StackUnderflow {
                requested: 2,
                available: 1
            })
        );
        assert_eq!(vm.depth(), 1);
    }

    #[test]
    fn test_pop_index_rejects_non_float() {
        let mut vm = Vm::new();
        vm.push_string(b"0").unwrap();
        let err = vm.pop_index("get").unwrap_err();
        assert_eq!(
            err,
            RuntimeError::TypeError("get: cannot use string as an index".into())
        );
        assert_eq!(vm.heap().live_objects(), 0);
    }
}
