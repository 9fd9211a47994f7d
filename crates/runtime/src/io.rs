//! I/O words
//!
//! ```text
//! put   ( x -- )        display form of x and a newline on stdout
//! read  ( -- string )   one line of stdin without its terminator
//! s>    ( -- )          stack trace on stdout, nothing consumed
//! ```
//!
//! Each word has a `*_to` / `*_from` variant taking the writer or reader, so
//! tests can drive them without touching the process streams.
//!
//! Write errors on stdout are logged at `warn` and otherwise ignored; a
//! program whose output pipe is gone keeps running until it exits.

use crate::vm::Vm;
use kk_core::{Result, Style, render_into};
use std::io::{self, BufRead, Write};

impl Vm {
    pub fn put(&mut self) -> Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        self.put_to(&mut out)
    }

    pub fn put_to<W: Write>(&mut self, out: &mut W) -> Result<()> {
        let cell = self.pop()?;
        let mut line = Vec::new();
        render_into(&self.heap, cell, Style::Display, &mut line);
        line.push(b'\n');
        if let Err(err) = out.write_all(&line) {
            tracing::warn!(error = %err, "put: write failed");
        }
        self.release(cell);
        Ok(())
    }

    pub fn read(&mut self) -> Result<()> {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        self.read_from(&mut input)
    }

    /// Push the next line as a string, or Null at end of input
    pub fn read_from<R: BufRead>(&mut self, input: &mut R) -> Result<()> {
        let mut line = Vec::new();
        match input.read_until(b'\n', &mut line) {
            Ok(0) => {
                self.push_null();
                Ok(())
            }
            Ok(_) => {
                if line.last() == Some(&b'\n') {
                    line.pop();
                    if line.last() == Some(&b'\r') {
                        line.pop();
                    }
                }
                self.push_string(&line)
            }
            Err(err) => {
                tracing::warn!(error = %err, "read: treating input error as end of input");
                self.push_null();
                Ok(())
            }
        }
    }

    pub fn trace(&mut self) -> Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        self.trace_to(&mut out)
    }

    /// `<depth> ` then each cell's debug form, top first
    pub fn trace_to<W: Write>(&mut self, out: &mut W) -> Result<()> {
        let mut line = format!("<{}> ", self.depth()).into_bytes();
        for cell in self.stack.iter() {
            render_into(&self.heap, cell, Style::Debug, &mut line);
            line.push(b' ');
        }
        line.push(b'\n');
        if let Err(err) = out.write_all(&line) {
            tracing::warn!(error = %err, "s>: write failed");
        }
        Ok(())
    }
}
