//! Operand Stack
//!
//! A contiguous, growable buffer of `Cell`s. The top of the stack is the end
//! of the buffer.
//!
//! ```text
//! ┌──────┬──────┬──────┬──────┐
//! │  c0  │  c1  │  c2  │  c3  │
//! └──────┴──────┴──────┴──────┘
//!                         ↑ top (depth 0)
//! ```
//!
//! Every slot owns one reference to the object it points at. The stack never
//! owns the heap, so operations that add or drop a reference take it as an
//! argument.

use crate::error::{Result, RuntimeError};
use crate::heap::Heap;
use crate::value::Cell;

/// Default stack capacity (number of cells)
pub const DEFAULT_STACK_CAPACITY: usize = 4096;

/// The operand stack
#[derive(Debug)]
pub struct OperandStack {
    cells: Vec<Cell>,
    high_water: usize,
}

impl Default for OperandStack {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_STACK_CAPACITY)
    }
}

impl OperandStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        OperandStack {
            cells: Vec::with_capacity(capacity),
            high_water: 0,
        }
    }

    /// Number of cells on the stack
    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Deepest the stack has ever been
    pub fn high_water(&self) -> usize {
        self.high_water
    }

    /// Push a shared cell, retaining its object
    #[inline]
    pub fn push(&mut self, heap: &mut Heap, cell: Cell) {
        heap.retain(cell);
        self.push_owned(cell);
    }

    /// Push a cell whose reference the caller hands over
    #[inline]
    pub fn push_owned(&mut self, cell: Cell) {
        self.cells.push(cell);
        if self.cells.len() > self.high_water {
            self.high_water = self.cells.len();
        }
    }

    /// Pop the top cell; the caller now owns its reference
    #[inline]
    pub fn pop(&mut self) -> Result<Cell> {
        self.cells.pop().ok_or(RuntimeError::EmptyStack)
    }

    /// Read the cell `depth` slots below the top without taking ownership
    #[inline]
    pub fn peek(&self, depth: usize) -> Result<Cell> {
        let len = self.cells.len();
        if depth >= len {
            return Err(RuntimeError::EmptyStack);
        }
        Ok(self.cells[len - 1 - depth])
    }

    /// Fail with `StackUnderflow` unless at least `n` cells are present
    #[inline]
    pub fn require(&self, n: usize) -> Result<()> {
        if self.cells.len() < n {
            return Err(RuntimeError::StackUnderflow {
                requested: n,
                available: self.cells.len(),
            });
        }
        Ok(())
    }

    /// Retain `cell` and insert it so that it ends up `depth` slots below the
    /// top (depth 0 is a plain push).
    pub fn insert_at(&mut self, heap: &mut Heap, cell: Cell, depth: usize) -> Result<()> {
        self.require(depth)?;
        heap.retain(cell);
        let pos = self.cells.len() - depth;
        self.cells.insert(pos, cell);
        if self.cells.len() > self.high_water {
            self.high_water = self.cells.len();
        }
        Ok(())
    }

    /// Remove and release the top `n` cells
    pub fn pop_n(&mut self, heap: &mut Heap, n: usize) -> Result<()> {
        self.require(n)?;
        let keep = self.cells.len() - n;
        for cell in self.cells.drain(keep..).rev() {
            heap.release(cell);
        }
        Ok(())
    }

    /// Exchange the cells at two depths (no refcount change)
    pub fn swap_depths(&mut self, a: usize, b: usize) -> Result<()> {
        self.require(a.max(b) + 1)?;
        let len = self.cells.len();
        self.cells.swap(len - 1 - a, len - 1 - b);
        Ok(())
    }

    /// Rotate the top `n` cells so the deepest of them comes to the top
    pub fn roll(&mut self, n: usize) -> Result<()> {
        self.require(n)?;
        let len = self.cells.len();
        self.cells[len - n..].rotate_left(1);
        Ok(())
    }

    /// Overwrite the cell at `depth`, sharing `source` and releasing the old
    /// occupant.
    pub fn copy_into(&mut self, heap: &mut Heap, depth: usize, source: Cell) -> Result<()> {
        let len = self.cells.len();
        if depth >= len {
            return Err(RuntimeError::EmptyStack);
        }
        heap.copy(&mut self.cells[len - 1 - depth], source);
        Ok(())
    }

    /// Depth of the nearest Null cell, if any
    pub fn find_null(&self) -> Option<usize> {
        self.cells.iter().rev().position(Cell::is_null)
    }

    /// Cells from top to bottom
    pub fn iter(&self) -> impl Iterator<Item = Cell> + '_ {
        self.cells.iter().rev().copied()
    }

    /// Release every cell
    pub fn clear(&mut self, heap: &mut Heap) {
        for cell in self.cells.drain(..).rev() {
            heap.release(cell);
        }
    }
}
