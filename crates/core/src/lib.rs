//! kk Core: value model and operand stack for the kk runtime
//!
//! This crate holds the memory-safety-critical part of the runtime: the cell
//! representation, the reference-counted heap and the operand stack whose
//! operations transfer or share ownership.
//!
//! Key design principles:
//! - Cell: fixed-size tagged value (Null, Float, Char, object reference)
//! - Heap: arena of refcounted objects (string, pair, array) behind handles
//! - OperandStack: contiguous buffer of cells, each slot owning one reference
//!
//! # Modules
//!
//! - `error`: Runtime error taxonomy shared by every operation
//! - `value`: `Cell`, `ObjRef`, `Kind` and the `Object` payloads
//! - `heap`: Arena allocation plus retain / release / copy
//! - `memory_stats`: Per-heap allocation counters
//! - `stack`: The operand stack
//! - `format`: Display and debug rendering of cells

pub mod error;
pub mod format;
pub mod heap;
pub mod memory_stats;
pub mod stack;
pub mod value;

pub use error::{Result, RuntimeError};
pub use format::{Style, render, render_into, render_string};
pub use heap::Heap;
pub use memory_stats::HeapStats;
pub use stack::{DEFAULT_STACK_CAPACITY, OperandStack};
pub use value::{Cell, Kind, ObjRef, Object};
