//! Conversion words
//!
//! ```text
//! num   ( x -- float )
//! char  ( x -- char )
//! ```
//!
//! `num` parses strings after trimming surrounding whitespace, reads a char as
//! its byte code and maps Null to 0. `char` truncates a float and keeps the
//! low byte.

use crate::vm::Vm;
use kk_core::{Cell, Result, RuntimeError};

impl Vm {
    pub fn num(&mut self) -> Result<()> {
        let cell = self.pop()?;
        let value = match cell {
            Cell::Null => 0.0,
            Cell::Float(f) => f,
            Cell::Char(c) => f64::from(c),
            Cell::Object(_) => {
                let parsed = match self.heap.string_bytes(cell) {
                    Some(bytes) => parse_float(bytes),
                    None => Err(RuntimeError::type_error(format!(
                        "num: cannot convert {} to a number",
                        self.kind(cell)
                    ))),
                };
                match parsed {
                    Ok(f) => f,
                    Err(err) => return self.fail(&[cell], err),
                }
            }
        };
        self.release(cell);
        self.push_owned(Cell::Float(value));
        Ok(())
    }

    pub fn to_char(&mut self) -> Result<()> {
        let cell = self.pop()?;
        let value = match cell {
            Cell::Null => 0,
            Cell::Float(f) => f as i64 as u8,
            Cell::Char(c) => c,
            Cell::Object(_) => {
                let kind = self.kind(cell);
                return self.fail(
                    &[cell],
                    RuntimeError::type_error(format!("char: cannot convert {} to a char", kind)),
                );
            }
        };
        self.push_owned(Cell::Char(value));
        Ok(())
    }
}

fn parse_float(bytes: &[u8]) -> Result<f64> {
    let text = String::from_utf8_lossy(bytes);
    text.trim().parse::<f64>().map_err(|_| {
        RuntimeError::type_error(format!("num: cannot parse \"{}\" as a number", text))
    })
}
