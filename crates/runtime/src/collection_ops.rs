//! Indexed containers: arrays, strings and pair lists
//!
//! ```text
//! mka   ( n -- array )
//! get   ( c i -- c e )
//! set   ( c v i -- c )
//! len   ( c -- c n )
//! stoa  ( null x1 .. xn -- array )
//! atos  ( array -- xn .. x1 )
//! ```
//!
//! `get`, `set` and `len` leave the container on the stack. Indices are
//! floats truncated toward zero.
//!
//! Strings accept `get` at `i == len` and answer Char 0, the terminator a
//! C string would have there. Arrays and `set` on strings do not.
//!
//! Lists are indexed by walking `i` tails; Null counts as the empty list.

use crate::vm::Vm;
use kk_core::{Cell, Kind, Object, Result, RuntimeError};

impl Vm {
    /// Pop a length and push a Null-filled array
    pub fn mka(&mut self) -> Result<()> {
        let len = match self.pop()? {
            Cell::Float(f) if f.is_finite() && f >= 0.0 => f as usize,
            Cell::Float(f) => {
                return self.fail(
                    &[],
                    RuntimeError::type_error(format!("mka: cannot use {} as a length", f)),
                );
            }
            other => {
                let kind = self.kind(other);
                return self.fail(
                    &[other],
                    RuntimeError::type_error(format!("mka: cannot use {} as a length", kind)),
                );
            }
        };
        let r = match self.heap.alloc_array(len) {
            Ok(r) => r,
            Err(err) => return self.fail(&[], err),
        };
        self.push_owned(Cell::Object(r));
        Ok(())
    }

    pub fn get(&mut self) -> Result<()> {
        let index = self.pop_index("get")?;
        let container = self.stack.peek(0)?;
        match self.element(container, index) {
            Ok(element) => {
                self.push(element);
                Ok(())
            }
            Err(err) => self.fail(&[], err),
        }
    }

    pub fn set(&mut self) -> Result<()> {
        let index = self.pop_index("set")?;
        let value = self.pop()?;
        let container = match self.stack.peek(0) {
            Ok(c) => c,
            Err(err) => return self.fail(&[value], err),
        };
        match self.store(container, value, index) {
            Ok(()) => Ok(()),
            Err(err) => self.fail(&[value], err),
        }
    }

    pub fn len(&mut self) -> Result<()> {
        let container = self.stack.peek(0)?;
        let n = match self.kind(container) {
            Kind::String => self.heap.string_bytes(container).map_or(0, <[u8]>::len),
            Kind::Array => self.heap.array_cells(container).map_or(0, <[Cell]>::len),
            Kind::Null | Kind::Pair => match self.list_length("len", container) {
                Ok(n) => n,
                Err(err) => return self.fail(&[], err),
            },
            kind => {
                return self.fail(
                    &[],
                    RuntimeError::type_error(format!("len: cannot measure {}", kind)),
                );
            }
        };
        self.push_owned(Cell::Float(n as f64));
        Ok(())
    }

    /// Collect the cells down to and including the nearest Null into an
    /// array, top first, so the sentinel is the last element
    pub fn stoa(&mut self) -> Result<()> {
        let count = match self.stack.find_null() {
            Some(depth) => depth + 1,
            None => {
                let available = self.depth();
                return self.fail(
                    &[],
                    RuntimeError::StackUnderflow {
                        requested: available + 1,
                        available,
                    },
                );
            }
        };

        let mut cells = Vec::new();
        if let Err(err) = cells.try_reserve_exact(count) {
            return self.fail(&[], err.into());
        }
        for _ in 0..count {
            cells.push(self.stack.pop()?);
        }
        let r = match self.heap.alloc(Object::Array(cells.clone())) {
            Ok(r) => r,
            Err(err) => return self.fail(&cells, err),
        };
        self.push_owned(Cell::Object(r));
        Ok(())
    }

    /// Spread an array over the stack so its first element ends on top
    pub fn atos(&mut self) -> Result<()> {
        let array = self.pop()?;
        if let Err(err) = self.expect_object("atos", array, Kind::Array) {
            return self.fail(&[array], err);
        }
        let cells = self.heap.array_cells(array).map(<[Cell]>::to_vec).unwrap_or_default();
        for cell in cells.into_iter().rev() {
            self.push(cell);
        }
        self.release(array);
        Ok(())
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// The cell `get` would push, without retaining it
    fn element(&self, container: Cell, index: i64) -> Result<Cell> {
        match self.kind(container) {
            Kind::Array => {
                let cells = self.heap.array_cells(container).unwrap_or_default();
                checked(index, cells.len()).map(|i| cells[i])
            }
            Kind::String => {
                let bytes = self.heap.string_bytes(container).unwrap_or_default();
                if index == bytes.len() as i64 {
                    return Ok(Cell::Char(0));
                }
                checked(index, bytes.len()).map(|i| Cell::Char(bytes[i]))
            }
            Kind::Null | Kind::Pair => {
                let link = self.list_link("get", container, index)?;
                match self.heap.pair_fields(link) {
                    Some((head, _)) => Ok(head),
                    None => unreachable!("list_link returns pairs"),
                }
            }
            kind => Err(RuntimeError::type_error(format!("get: cannot index {}", kind))),
        }
    }

    /// Put an owned `value` into `container` at `index`
    ///
    /// On error the caller still owns `value`.
    fn store(&mut self, container: Cell, value: Cell, index: i64) -> Result<()> {
        let old = match self.kind(container) {
            Kind::Array => {
                let r = self.expect_object("set", container, Kind::Array)?;
                let Object::Array(cells) = self.heap.get_mut(r) else {
                    unreachable!("kind checked")
                };
                let i = checked(index, cells.len())?;
                std::mem::replace(&mut cells[i], value)
            }
            Kind::String => {
                let byte = match value {
                    Cell::Char(c) => c,
                    other => {
                        return Err(RuntimeError::type_error(format!(
                            "set: cannot store {} in a string",
                            self.kind(other)
                        )));
                    }
                };
                let r = self.expect_object("set", container, Kind::String)?;
                let Object::String(bytes) = self.heap.get_mut(r) else {
                    unreachable!("kind checked")
                };
                let i = checked(index, bytes.len())?;
                bytes[i] = byte;
                return Ok(());
            }
            Kind::Null | Kind::Pair => {
                let link = self.list_link("set", container, index)?;
                let r = self.expect_object("set", link, Kind::Pair)?;
                let Object::Pair { head, .. } = self.heap.get_mut(r) else {
                    unreachable!("kind checked")
                };
                std::mem::replace(head, value)
            }
            kind => {
                return Err(RuntimeError::type_error(format!(
                    "set: cannot index {}",
                    kind
                )));
            }
        };
        self.release(old);
        Ok(())
    }

    /// The pair `index` links into `list`
    fn list_link(&self, word: &str, list: Cell, index: i64) -> Result<Cell> {
        let mut current = list;
        let mut walked = 0usize;
        loop {
            match self.heap.pair_fields(current) {
                Some((_, tail)) => {
                    if walked as i64 == index {
                        return Ok(current);
                    }
                    current = tail;
                    walked += 1;
                }
                None if current.is_null() => {
                    return Err(RuntimeError::IndexOutOfRange {
                        index,
                        len: walked,
                    });
                }
                None => return Err(improper_tail(word, self.kind(current))),
            }
        }
    }

    /// Number of links in a Null-terminated pair chain
    fn list_length(&self, word: &str, list: Cell) -> Result<usize> {
        let mut current = list;
        let mut n = 0;
        while let Some((_, tail)) = self.heap.pair_fields(current) {
            n += 1;
            current = tail;
        }
        if !current.is_null() {
            return Err(improper_tail(word, self.kind(current)));
        }
        Ok(n)
    }
}

/// `index` as a position in `0..len`
fn checked(index: i64, len: usize) -> Result<usize> {
    if index < 0 || index >= len as i64 {
        return Err(RuntimeError::IndexOutOfRange { index, len });
    }
    Ok(index as usize)
}

fn improper_tail(word: &str, kind: Kind) -> RuntimeError {
    RuntimeError::type_error(format!("{}: list ends in {} instead of null", word, kind))
}
