//! kk runtime: the library compiled kk programs link against
//!
//! Key pieces:
//! - `Vm`: heap + operand stack + source location; every built-in word is a
//!   method on it returning `Result<(), RuntimeError>`
//! - `Builtin`: the word table (`+`, `dup`, `get`, `s>` ...)
//! - `ffi`: the `kk_*` C ABI generated code calls, which turns any error
//!   into a fatal diagnostic and exit status 1
//!
//! Values, the heap and the stack themselves live in `kk-core`.

pub mod builtins;
pub mod config;
pub mod diagnostics;
pub mod ffi;
pub mod logging;
pub mod report;
pub mod vm;

mod arithmetic;
mod collection_ops;
mod comparison;
mod conversion;
mod io;
mod list_ops;
mod stack_ops;

pub use builtins::Builtin;
pub use config::{RuntimeConfig, runtime_config};
pub use diagnostics::{FATAL_EXIT_CODE, fatal, format_diagnostic};
pub use logging::init_logging;
pub use report::{ReportConfig, ReportData, ReportDestination, ReportFormat};
pub use vm::{SourceLocation, Vm};

// Core types, so generated-code tooling needs only this crate
pub use kk_core::{
    Cell, Heap, HeapStats, Kind, ObjRef, Object, Result, RuntimeError, Style, render, render_string,
};

// C ABI (exported for linking)
pub use ffi::{
    kk_push_char as push_char, kk_push_float as push_float, kk_push_null as push_null,
    kk_push_string as push_string, kk_runtime_finish as runtime_finish,
    kk_runtime_init as runtime_init, kk_set_location as set_location,
    kk_stack_depth as stack_depth,
};
