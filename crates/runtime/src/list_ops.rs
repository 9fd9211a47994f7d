//! Pair and list words
//!
//! Lists are chains of pairs whose last tail is Null.
//!
//! ```text
//! cons    ( head tail -- pair )
//! car     ( pair -- pair head )
//! cdr     ( pair -- pair tail )
//! uncons  ( pair -- head tail )
//! ```
//!
//! `car` and `cdr` leave the pair in place and push a shared field.

use crate::vm::Vm;
use kk_core::{Cell, Kind, Result};

impl Vm {
    pub fn cons(&mut self) -> Result<()> {
        let (head, tail) = self.pop_two()?;
        match self.heap.alloc_pair(head, tail) {
            Ok(r) => {
                self.push_owned(Cell::Object(r));
                Ok(())
            }
            Err(err) => self.fail(&[head, tail], err),
        }
    }

    pub fn car(&mut self) -> Result<()> {
        let (head, _) = self.peek_pair("car")?;
        self.push(head);
        Ok(())
    }

    pub fn cdr(&mut self) -> Result<()> {
        let (_, tail) = self.peek_pair("cdr")?;
        self.push(tail);
        Ok(())
    }

    pub fn uncons(&mut self) -> Result<()> {
        let (head, tail) = self.peek_pair("uncons")?;
        let pair = self.pop()?;
        // Hold the fields before the pair lets go of them
        self.push(head);
        self.push(tail);
        self.release(pair);
        Ok(())
    }

    fn peek_pair(&mut self, word: &str) -> Result<(Cell, Cell)> {
        let cell = self.stack.peek(0)?;
        match self.expect_object(word, cell, Kind::Pair) {
            Ok(_) => match self.heap.pair_fields(cell) {
                Some(fields) => Ok(fields),
                None => unreachable!("expect_object checked the kind"),
            },
            Err(err) => self.fail(&[], err),
        }
    }
}
