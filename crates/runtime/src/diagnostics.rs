//! Fatal runtime errors
//!
//! A failing word is terminal for the program: the driver prints one
//! diagnostic line on stderr and exits with status 1.
//!
//! ```text
//! ESC[1m(main.kk: 12): ESC[31mruntime error: ESC[0mDivision by zero.
//! ```
//!
//! When no file was ever reported the location is just the line number.

use crate::vm::SourceLocation;
use kk_core::RuntimeError;
use std::io::Write;

const BOLD: &str = "\x1b[1m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

/// Exit status of a program stopped by a runtime error
pub const FATAL_EXIT_CODE: i32 = 1;

/// The diagnostic line for `err` raised at `location`, newline included
pub fn format_diagnostic(location: &SourceLocation, err: &RuntimeError) -> String {
    format!(
        "{}({}): {}runtime error: {}{}\n",
        BOLD, location, RED, RESET, err
    )
}

/// Print the diagnostic and terminate the process
pub fn fatal(location: &SourceLocation, err: &RuntimeError) -> ! {
    // Whatever the program already printed must come out before the error
    let _ = std::io::stdout().flush();
    let mut stderr = std::io::stderr().lock();
    let _ = stderr.write_all(format_diagnostic(location, err).as_bytes());
    let _ = stderr.flush();
    std::process::exit(FATAL_EXIT_CODE)
}
