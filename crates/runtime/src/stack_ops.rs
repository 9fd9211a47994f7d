//! Stack shuffling words
//!
//! ```text
//! dup   ( a -- a a )
//! drop  ( a -- )
//! swap  ( a b -- b a )
//! rot   ( a b c -- b c a )
//! tuck  ( a b -- b a b )
//! over  ( a b -- a b a )
//! nip   ( a b -- b )
//! ```
//!
//! Each word checks the depth it needs up front, so a failing word leaves the
//! stack as it found it.

use crate::vm::Vm;
use kk_core::Result;

impl Vm {
    /// Stack effect: ( a -- a a )
    pub fn dup(&mut self) -> Result<()> {
        self.stack.require(1)?;
        let a = self.stack.peek(0)?;
        self.push(a);
        Ok(())
    }

    /// Stack effect: ( a -- )
    pub fn drop_top(&mut self) -> Result<()> {
        self.stack.pop_n(&mut self.heap, 1)
    }

    /// Stack effect: ( a b -- b a )
    pub fn swap(&mut self) -> Result<()> {
        self.stack.swap_depths(0, 1)
    }

    /// Stack effect: ( a b c -- b c a )
    pub fn rot(&mut self) -> Result<()> {
        self.stack.roll(3)
    }

    /// Stack effect: ( a b -- b a b )
    pub fn tuck(&mut self) -> Result<()> {
        self.stack.require(2)?;
        let b = self.stack.peek(0)?;
        self.stack.insert_at(&mut self.heap, b, 2)
    }

    /// Stack effect: ( a b -- a b a )
    pub fn over(&mut self) -> Result<()> {
        self.stack.require(2)?;
        let a = self.stack.peek(1)?;
        self.push(a);
        Ok(())
    }

    /// Stack effect: ( a b -- b )
    pub fn nip(&mut self) -> Result<()> {
        self.stack.require(2)?;
        let b = self.stack.pop()?;
        let a = self.stack.pop()?;
        self.release(a);
        self.push_owned(b);
        Ok(())
    }
}
