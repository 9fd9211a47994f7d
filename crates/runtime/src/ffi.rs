//! C ABI called by generated programs
//!
//! # Safety Contract
//!
//! These functions are designed to be called ONLY by compiler-generated code.
//! The compiler is responsible for:
//!
//! - Calling `kk_runtime_init` before anything else and `kk_runtime_finish`
//!   when `main` returns
//! - Passing valid pointers to `kk_set_location` and `kk_push_string`
//!
//! Each thread gets its own VM. Any error raised by a word is fatal: the
//! diagnostic is printed and the process exits with status 1.
//!
//! # Generated code shape
//!
//! ```text
//! kk_runtime_init();
//! kk_set_location("main.kk", 3);
//! kk_push_float(3.0);
//! kk_push_float(4.0);
//! kk_builtin_subtract();
//! kk_builtin_put();
//! kk_runtime_finish();
//! ```

use crate::builtins::Builtin;
use crate::config::runtime_config;
use crate::diagnostics::fatal;
use crate::logging::init_logging;
use crate::report::{ReportData, emit_report};
use crate::vm::Vm;
use kk_core::Result;
use std::cell::RefCell;
use std::ffi::{CStr, c_char};
use std::io::Write;

thread_local! {
    static VM: RefCell<Option<Vm>> = const { RefCell::new(None) };
}

/// Run `f` on this thread's VM, creating it on first use
///
/// An `Err` never returns to generated code.
fn with_vm<T>(f: impl FnOnce(&mut Vm) -> Result<T>) -> T {
    VM.with(|slot| {
        let mut slot = slot.borrow_mut();
        let vm = slot.get_or_insert_with(|| Vm::with_config(runtime_config()));
        match f(vm) {
            Ok(value) => value,
            Err(err) => fatal(vm.location(), &err),
        }
    })
}

// =============================================================================
// Lifecycle
// =============================================================================

/// Set up logging and this thread's VM
#[unsafe(no_mangle)]
pub extern "C" fn kk_runtime_init() {
    let config = runtime_config();
    init_logging(&config.log_filter);
    with_vm(|vm| {
        tracing::debug!(
            stack_capacity = config.stack_capacity,
            depth = vm.depth(),
            "runtime started"
        );
        Ok(())
    });
}

/// Release what is left on the stack and emit the at-exit report
#[unsafe(no_mangle)]
pub extern "C" fn kk_runtime_finish() {
    let Some(mut vm) = VM.with(|slot| slot.borrow_mut().take()) else {
        return;
    };
    let final_depth = vm.depth();
    vm.clear();

    let data = ReportData::collect(&vm, final_depth);
    tracing::debug!(
        leaked = data.objects_live,
        final_depth,
        "runtime finished"
    );
    if let Some(report) = &runtime_config().report {
        emit_report(report, &data);
    }
    let _ = std::io::stdout().flush();
}

// =============================================================================
// Locations and literals
// =============================================================================

/// Record the source position used by error messages
///
/// # Safety
/// `file` must be null or a valid NUL-terminated string
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kk_set_location(file: *const c_char, line: i32) {
    let file = if file.is_null() {
        None
    } else {
        Some(unsafe { CStr::from_ptr(file) }.to_string_lossy())
    };
    let line = u32::try_from(line).unwrap_or(0);
    with_vm(|vm| {
        vm.set_location(file.as_deref(), line);
        Ok(())
    });
}

#[unsafe(no_mangle)]
pub extern "C" fn kk_push_null() {
    with_vm(|vm| {
        vm.push_null();
        Ok(())
    });
}

#[unsafe(no_mangle)]
pub extern "C" fn kk_push_float(value: f64) {
    with_vm(|vm| {
        vm.push_float(value);
        Ok(())
    });
}

#[unsafe(no_mangle)]
pub extern "C" fn kk_push_char(value: u8) {
    with_vm(|vm| {
        vm.push_char(value);
        Ok(())
    });
}

/// Push a string literal
///
/// # Safety
/// `bytes` must point to `len` readable bytes (or be null when `len` is 0)
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kk_push_string(bytes: *const u8, len: usize) {
    let bytes: &[u8] = if bytes.is_null() || len == 0 {
        &[]
    } else {
        unsafe { std::slice::from_raw_parts(bytes, len) }
    };
    with_vm(|vm| vm.push_string(bytes));
}

/// Current operand stack depth
#[unsafe(no_mangle)]
pub extern "C" fn kk_stack_depth() -> i64 {
    with_vm(|vm| Ok(vm.depth() as i64))
}

// =============================================================================
// Built-in words
// =============================================================================

macro_rules! export_builtins {
    ($($symbol:ident => $builtin:ident),* $(,)?) => {
        $(
            #[unsafe(no_mangle)]
            pub extern "C" fn $symbol() {
                with_vm(|vm| vm.call(Builtin::$builtin));
            }
        )*
    };
}

export_builtins! {
    kk_builtin_add => Add,
    kk_builtin_subtract => Subtract,
    kk_builtin_multiply => Multiply,
    kk_builtin_divide => Divide,
    kk_builtin_modulo => Modulo,
    kk_builtin_abs => Abs,
    kk_builtin_less => Less,
    kk_builtin_greater => Greater,
    kk_builtin_less_equal => LessEqual,
    kk_builtin_greater_equal => GreaterEqual,
    kk_builtin_equal => Equal,
    kk_builtin_not_equal => NotEqual,
    kk_builtin_and => And,
    kk_builtin_or => Or,
    kk_builtin_not => Not,
    kk_builtin_dup => Dup,
    kk_builtin_drop => Drop,
    kk_builtin_swap => Swap,
    kk_builtin_rot => Rot,
    kk_builtin_tuck => Tuck,
    kk_builtin_over => Over,
    kk_builtin_nip => Nip,
    kk_builtin_cons => Cons,
    kk_builtin_car => Car,
    kk_builtin_cdr => Cdr,
    kk_builtin_uncons => Uncons,
    kk_builtin_mka => Mka,
    kk_builtin_get => Get,
    kk_builtin_set => Set,
    kk_builtin_len => Len,
    kk_builtin_stoa => Stoa,
    kk_builtin_atos => Atos,
    kk_builtin_num => Num,
    kk_builtin_char => Char,
    kk_builtin_put => Put,
    kk_builtin_read => Read,
    kk_builtin_trace => Trace,
}
