//! Comparison and boolean words: `< > <= >= = != and or not`
//!
//! Results are Chars: 1 for true, 0 for false.
//!
//! Ordering is defined on floats only. Equality also covers strings (by
//! content), chars, and Null against Null. Any other mix, a single Null
//! included, is a type error.
//!
//! Truthiness: a non-zero Char or Float is true, Null is false, and any heap
//! object is true whatever it contains.

use crate::vm::Vm;
use kk_core::{Cell, Kind, Result, RuntimeError};

impl Vm {
    /// Stack effect: ( a b -- a<b )
    pub fn less(&mut self) -> Result<()> {
        self.ordering("<", |x, y| x < y)
    }

    /// Stack effect: ( a b -- a>b )
    pub fn greater(&mut self) -> Result<()> {
        self.ordering(">", |x, y| x > y)
    }

    /// Stack effect: ( a b -- a<=b )
    pub fn less_equal(&mut self) -> Result<()> {
        self.ordering("<=", |x, y| x <= y)
    }

    /// Stack effect: ( a b -- a>=b )
    pub fn greater_equal(&mut self) -> Result<()> {
        self.ordering(">=", |x, y| x >= y)
    }

    /// Stack effect: ( a b -- a=b )
    pub fn equal(&mut self) -> Result<()> {
        self.equality("=", false)
    }

    /// Stack effect: ( a b -- a!=b )
    pub fn not_equal(&mut self) -> Result<()> {
        self.equality("!=", true)
    }

    /// Stack effect: ( a b -- a&&b )
    pub fn and(&mut self) -> Result<()> {
        let (a, b) = self.pop_two()?;
        let result = self.truthy(a) && self.truthy(b);
        self.release(a);
        self.release(b);
        self.push_owned(Cell::from_bool(result));
        Ok(())
    }

    /// Stack effect: ( a b -- a||b )
    pub fn or(&mut self) -> Result<()> {
        let (a, b) = self.pop_two()?;
        let result = self.truthy(a) || self.truthy(b);
        self.release(a);
        self.release(b);
        self.push_owned(Cell::from_bool(result));
        Ok(())
    }

    /// Stack effect: ( a -- !a )
    pub fn not(&mut self) -> Result<()> {
        let a = self.pop()?;
        let result = !self.truthy(a);
        self.release(a);
        self.push_owned(Cell::from_bool(result));
        Ok(())
    }

    /// Truth value of a cell
    pub fn truthy(&self, cell: Cell) -> bool {
        match cell {
            Cell::Null => false,
            Cell::Float(f) => f != 0.0,
            Cell::Char(c) => c != 0,
            Cell::Object(_) => true,
        }
    }

    /// Whether two cells are equal under `=`
    ///
    /// Returns a type error for kinds that cannot be compared.
    pub fn cells_equal(&self, word: &str, a: Cell, b: Cell) -> Result<bool> {
        match (a, b) {
            (Cell::Null, Cell::Null) => Ok(true),
            (Cell::Float(x), Cell::Float(y)) => Ok(x == y),
            (Cell::Char(x), Cell::Char(y)) => Ok(x == y),
            _ => match (self.heap.string_bytes(a), self.heap.string_bytes(b)) {
                (Some(x), Some(y)) => Ok(x == y),
                _ => Err(self.compare_error(word, a, b)),
            },
        }
    }

    fn ordering(&mut self, word: &str, op: impl FnOnce(f64, f64) -> bool) -> Result<()> {
        let (a, b) = self.pop_two()?;
        match (a, b) {
            (Cell::Float(x), Cell::Float(y)) => {
                self.push_owned(Cell::from_bool(op(x, y)));
                Ok(())
            }
            _ => {
                let err = self.compare_error(word, a, b);
                self.fail(&[a, b], err)
            }
        }
    }

    fn equality(&mut self, word: &str, negate: bool) -> Result<()> {
        let (a, b) = self.pop_two()?;
        match self.cells_equal(word, a, b) {
            Ok(eq) => {
                self.release(a);
                self.release(b);
                self.push_owned(Cell::from_bool(eq != negate));
                Ok(())
            }
            Err(err) => self.fail(&[a, b], err),
        }
    }

    fn compare_error(&self, word: &str, a: Cell, b: Cell) -> RuntimeError {
        let (ka, kb): (Kind, Kind) = (self.kind(a), self.kind(b));
        RuntimeError::type_error(format!("{}: cannot compare {} to {}", word, ka, kb))
    }
}
