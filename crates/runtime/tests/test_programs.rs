//! Whole-program behaviour of the built-in words
//!
//! Programs are written as whitespace-separated tokens and fed through the
//! same `Vm::call` dispatch the C ABI uses. Numbers push floats, `'c` pushes
//! a char, `"text"` pushes a string (no spaces inside), `null` pushes Null,
//! and anything else must be a built-in word.

use kk_runtime::{Builtin, Cell, Kind, RuntimeError, Style, Vm, render_string};

fn run(vm: &mut Vm, program: &str) -> Result<(), RuntimeError> {
    for token in program.split_whitespace() {
        if token == "null" {
            vm.push_null();
        } else if let Some(text) = token.strip_prefix('"').and_then(|t| t.strip_suffix('"')) {
            vm.push_string(text.as_bytes())?;
        } else if let Some(c) = token.strip_prefix('\'') {
            vm.push_char(c.as_bytes()[0]);
        } else if let Ok(f) = token.parse::<f64>() {
            vm.push_float(f);
        } else {
            let builtin = Builtin::from_word(token)
                .unwrap_or_else(|| panic!("unknown word {:?}", token));
            vm.call(builtin)?;
        }
    }
    Ok(())
}

fn top(vm: &Vm) -> String {
    let cell = vm.stack().peek(0).unwrap();
    render_string(vm.heap(), cell, Style::Debug)
}

/// Rendered stack, bottom to top
fn stack(vm: &Vm) -> Vec<String> {
    let mut cells: Vec<String> = vm
        .stack()
        .iter()
        .map(|c| render_string(vm.heap(), c, Style::Debug))
        .collect();
    cells.reverse();
    cells
}

fn trace(vm: &mut Vm) -> String {
    let mut out = Vec::new();
    vm.trace_to(&mut out).unwrap();
    String::from_utf8(out).unwrap()
}

// =============================================================================
// Stack discipline
// =============================================================================

#[test]
fn test_subtract_operand_order() {
    let mut vm = Vm::new();
    run(&mut vm, "3 4 -").unwrap();
    assert_eq!(vm.pop().unwrap(), Cell::Float(-1.0));
}

#[test]
fn test_dup_pop_pop_restores_refcounts() {
    let mut vm = Vm::new();
    run(&mut vm, "\"shared\"").unwrap();
    let r = vm.stack().peek(0).unwrap().as_object().unwrap();
    let depth = vm.depth();

    run(&mut vm, "dup").unwrap();
    let a = vm.pop().unwrap();
    vm.release(a);

    assert_eq!(vm.depth(), depth);
    assert_eq!(vm.heap().refcount(r), 1);
}

#[test]
fn test_swap_swap_is_identity() {
    let mut vm = Vm::new();
    run(&mut vm, "1 \"two\" 'c").unwrap();
    let before = stack(&vm);
    run(&mut vm, "swap swap").unwrap();
    assert_eq!(stack(&vm), before);
}

#[test]
fn test_shuffles() {
    let mut vm = Vm::new();
    run(&mut vm, "1 2 3 rot").unwrap();
    assert_eq!(stack(&vm), ["2", "3", "1"]);
    run(&mut vm, "tuck").unwrap();
    assert_eq!(stack(&vm), ["2", "1", "3", "1"]);
    run(&mut vm, "over nip drop").unwrap();
    assert_eq!(stack(&vm), ["2", "1", "3"]);
}

#[test]
fn test_trace_output() {
    let mut vm = Vm::new();
    run(&mut vm, "1 'a \"b\" null 2 mka").unwrap();
    assert_eq!(trace(&mut vm), "<5> [ null null ] null \"b\" a/97 1 \n");
    assert_eq!(vm.depth(), 5);
}

// =============================================================================
// Equality and truth
// =============================================================================

#[test]
fn test_null_equals_null() {
    let mut vm = Vm::new();
    run(&mut vm, "null null =").unwrap();
    assert_eq!(vm.pop().unwrap(), Cell::Char(1));
}

#[test]
fn test_null_against_float_is_type_error() {
    let mut vm = Vm::new();
    assert_eq!(
        run(&mut vm, "1 null ="),
        Err(RuntimeError::TypeError("=: cannot compare float to null".into()))
    );
}

#[test]
fn test_float_string_equality_is_type_error() {
    let mut vm = Vm::new();
    let err = run(&mut vm, "1 \"a\" =").unwrap_err();
    assert!(matches!(err, RuntimeError::TypeError(_)));
    assert_eq!(vm.heap().live_objects(), 0);
}

#[test]
fn test_boolean_words_combine() {
    let mut vm = Vm::new();
    run(&mut vm, "1 2 < 3 3 != or \"x\" and not").unwrap();
    assert_eq!(vm.pop().unwrap(), Cell::Char(0));
    assert_eq!(vm.heap().live_objects(), 0);
}

// =============================================================================
// Containers
// =============================================================================

#[test]
fn test_array_store_and_fetch() {
    let mut vm = Vm::new();
    run(&mut vm, "3 mka 9 0 set 0 get").unwrap();
    assert_eq!(vm.pop().unwrap(), Cell::Float(9.0));
    assert_eq!(top(&vm), "[ 9 null null ]");
}

#[test]
fn test_cons_car_cdr() {
    let mut vm = Vm::new();
    run(&mut vm, "\"head\" \"tail\" cons car swap cdr").unwrap();
    assert_eq!(stack(&vm), ["\"head\"", "( \"head\" . \"tail\" )", "\"tail\""]);

    let tail = vm.pop().unwrap();
    let tail_ref = tail.as_object().unwrap();
    assert_eq!(vm.heap().refcount(tail_ref), 2);
    vm.release(tail);

    vm.clear();
    assert_eq!(vm.heap().live_objects(), 0);
}

#[test]
fn test_list_walk() {
    let mut vm = Vm::new();
    run(&mut vm, "'a 'b 'c null cons cons cons").unwrap();
    run(&mut vm, "len swap 1 get").unwrap();
    assert_eq!(stack(&vm), ["3", "( a/97 . ( b/98 . ( c/99 . null ) ) )", "b/98"]);

    run(&mut vm, "drop nip uncons").unwrap();
    assert_eq!(stack(&vm), ["a/97", "( b/98 . ( c/99 . null ) )"]);
}

#[test]
fn test_stoa_atos_round_trip() {
    let mut vm = Vm::new();
    run(&mut vm, "0 null 1 \"two\" 'c").unwrap();
    let before = stack(&vm);

    run(&mut vm, "stoa").unwrap();
    assert_eq!(top(&vm), "[ c/99 \"two\" 1 null ]");
    assert_eq!(vm.depth(), 2);

    run(&mut vm, "atos").unwrap();
    assert_eq!(stack(&vm), before);
    assert_eq!(stack(&vm), ["0", "null", "1", "\"two\"", "c/99"]);

    vm.clear();
    assert_eq!(vm.heap().live_objects(), 0);
}

#[test]
fn test_concatenation_leaves_inputs_intact() {
    let mut vm = Vm::new();
    run(&mut vm, "\"ab\" dup \"cd\" +").unwrap();
    assert_eq!(stack(&vm), ["\"ab\"", "\"abcd\""]);

    run(&mut vm, "drop drop 2 mka 1 mka +").unwrap();
    assert_eq!(top(&vm), "[ null null null ]");
    vm.clear();
    assert_eq!(vm.heap().live_objects(), 0);
}

#[test]
fn test_string_buffer_editing() {
    let mut vm = Vm::new();
    run(&mut vm, "\"hello\" 'j 0 set dup len").unwrap();
    assert_eq!(stack(&vm), ["\"jello\"", "\"jello\"", "5"]);

    run(&mut vm, "get").unwrap();
    assert_eq!(vm.pop().unwrap(), Cell::Char(0));
}

// =============================================================================
// Conversion
// =============================================================================

#[test]
fn test_num_and_char() {
    let mut vm = Vm::new();
    run(&mut vm, "\"12.5\" num 0.5 + 'A num + char").unwrap();
    assert_eq!(vm.pop().unwrap(), Cell::Char(78));
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn test_division_by_zero() {
    let mut vm = Vm::new();
    assert_eq!(run(&mut vm, "5 0 /"), Err(RuntimeError::DivisionByZero));
}

#[test]
fn test_failures_report_kinds() {
    let mut vm = Vm::new();
    assert_eq!(
        run(&mut vm, "'a car"),
        Err(RuntimeError::TypeError("car: expected pair, got char".into()))
    );

    let mut vm = Vm::new();
    assert_eq!(
        run(&mut vm, "1 2 stoa"),
        Err(RuntimeError::StackUnderflow {
            requested: 3,
            available: 2
        })
    );

    let mut vm = Vm::new();
    assert_eq!(
        run(&mut vm, "drop"),
        Err(RuntimeError::StackUnderflow {
            requested: 1,
            available: 0
        })
    );
}

#[test]
fn test_error_messages() {
    let mut vm = Vm::new();
    let err = run(&mut vm, "2 mka 5 get").unwrap_err();
    assert_eq!(err.to_string(), "Index 5 out of range 2.");

    let mut vm = Vm::new();
    let err = run(&mut vm, "1 +").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Trying to pop 2 elements from stack 1 elements long."
    );
}

// =============================================================================
// Heap accounting
// =============================================================================

#[test]
fn test_nested_structures_free_exactly_once() {
    let mut vm = Vm::new();
    run(
        &mut vm,
        "null \"a\" \"b\" null cons cons 3 mka \"c\" 1 set stoa dup dup + 1 get",
    )
    .unwrap();
    assert_eq!(vm.kind(vm.stack().peek(0).unwrap()), Kind::Pair);

    vm.clear();
    let stats = vm.heap().stats();
    assert_eq!(stats.live(), 0);
    assert_eq!(stats.allocated, stats.freed);
}

#[test]
fn test_long_list_release() {
    let mut vm = Vm::new();
    vm.push_null();
    for i in 0..100_000 {
        vm.push_float(i as f64);
        vm.swap().unwrap();
        vm.cons().unwrap();
    }
    run(&mut vm, "len").unwrap();
    assert_eq!(vm.pop().unwrap(), Cell::Float(100_000.0));

    vm.clear();
    assert_eq!(vm.heap().live_objects(), 0);
}

#[test]
fn test_display_form() {
    let mut vm = Vm::new();
    run(&mut vm, "\"x\" 'y cons").unwrap();
    let cell = vm.stack().peek(0).unwrap();
    assert_eq!(render_string(vm.heap(), cell, Style::Display), "( x . y )");
}
