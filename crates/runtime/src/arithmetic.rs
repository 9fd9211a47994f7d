//! Arithmetic words: `+ - * / % abs`
//!
//! All binary words pop the most recent operand first and compute
//! `earlier OP later`:
//!
//! ```text
//! 3 4 -    ( 3 4 -- -1 )
//! ```
//!
//! Numbers are floats only. `+` is overloaded: two strings or two arrays are
//! concatenated into a new object (earlier first), selected by the kind of
//! the most recent operand.
//!
//! `%` works on the operands truncated to integers, with wrapping remainder
//! semantics so `i64::MIN % -1` is defined.

use crate::vm::Vm;
use kk_core::{Cell, Kind, Object, Result, RuntimeError};

impl Vm {
    /// Add two floats, or concatenate two strings / two arrays
    ///
    /// Stack effect: ( a b -- a+b )
    pub fn add(&mut self) -> Result<()> {
        let (a, b) = self.pop_two()?;
        match (self.kind(a), self.kind(b)) {
            (Kind::Float, Kind::Float) => {
                if let (Cell::Float(x), Cell::Float(y)) = (a, b) {
                    self.push_owned(Cell::Float(x + y));
                }
                Ok(())
            }
            (Kind::String, Kind::String) => self.concat_strings(a, b),
            (Kind::Array, Kind::Array) => self.concat_arrays(a, b),
            (ka, kb @ (Kind::Float | Kind::String | Kind::Array)) => self.fail(
                &[a, b],
                RuntimeError::type_error(format!("+: cannot add {} to {}", kb, ka)),
            ),
            (_, kb) => self.fail(
                &[a, b],
                RuntimeError::type_error(format!("+: cannot add {}", kb)),
            ),
        }
    }

    /// Stack effect: ( a b -- a-b )
    pub fn subtract(&mut self) -> Result<()> {
        self.float_binary("-", "subtract", |x, y| Ok(x - y))
    }

    /// Stack effect: ( a b -- a*b )
    pub fn multiply(&mut self) -> Result<()> {
        self.float_binary("*", "multiply", |x, y| Ok(x * y))
    }

    /// Stack effect: ( a b -- a/b )
    ///
    /// A zero divisor is an error, not infinity.
    pub fn divide(&mut self) -> Result<()> {
        self.float_binary("/", "divide", |x, y| {
            if y == 0.0 {
                return Err(RuntimeError::DivisionByZero);
            }
            Ok(x / y)
        })
    }

    /// Integer remainder of the truncated operands
    ///
    /// Stack effect: ( a b -- a%b )
    pub fn modulo(&mut self) -> Result<()> {
        self.float_binary("%", "take the modulo of", |x, y| {
            let (x, y) = (x as i64, y as i64);
            if y == 0 {
                return Err(RuntimeError::DivisionByZero);
            }
            Ok(x.wrapping_rem(y) as f64)
        })
    }

    /// Stack effect: ( a -- |a| )
    pub fn abs(&mut self) -> Result<()> {
        match self.pop()? {
            Cell::Float(x) => {
                self.push_owned(Cell::Float(x.abs()));
                Ok(())
            }
            other => {
                let kind = self.kind(other);
                self.fail(
                    &[other],
                    RuntimeError::type_error(format!("abs: cannot take the absolute value of {}", kind)),
                )
            }
        }
    }

    fn float_binary(
        &mut self,
        word: &str,
        verb: &str,
        op: impl FnOnce(f64, f64) -> Result<f64>,
    ) -> Result<()> {
        let (a, b) = self.pop_two()?;
        match (a, b) {
            (Cell::Float(x), Cell::Float(y)) => match op(x, y) {
                Ok(result) => {
                    self.push_owned(Cell::Float(result));
                    Ok(())
                }
                Err(err) => self.fail(&[], err),
            },
            _ => {
                let (ka, kb) = (self.kind(a), self.kind(b));
                self.fail(
                    &[a, b],
                    RuntimeError::type_error(format!("{}: cannot {} {} and {}", word, verb, ka, kb)),
                )
            }
        }
    }

    fn concat_strings(&mut self, a: Cell, b: Cell) -> Result<()> {
        let joined = match (self.heap.string_bytes(a), self.heap.string_bytes(b)) {
            (Some(x), Some(y)) => join(x, y),
            _ => unreachable!("kinds checked by add"),
        };
        let joined = match joined {
            Ok(joined) => joined,
            Err(err) => return self.fail(&[a, b], err),
        };
        let r = match self.heap.alloc(Object::String(joined)) {
            Ok(r) => r,
            Err(err) => return self.fail(&[a, b], err),
        };
        self.heap.release(a);
        self.heap.release(b);
        self.push_owned(Cell::Object(r));
        Ok(())
    }

    fn concat_arrays(&mut self, a: Cell, b: Cell) -> Result<()> {
        let joined = match (self.heap.array_cells(a), self.heap.array_cells(b)) {
            (Some(x), Some(y)) => join(x, y),
            _ => unreachable!("kinds checked by add"),
        };
        let joined: Vec<Cell> = match joined {
            Ok(joined) => joined,
            Err(err) => return self.fail(&[a, b], err),
        };
        // The new array shares every element with the old ones
        for &cell in &joined {
            self.heap.retain(cell);
        }
        let r = match self.heap.alloc(Object::Array(joined.clone())) {
            Ok(r) => r,
            Err(err) => {
                for cell in joined {
                    self.heap.release(cell);
                }
                return self.fail(&[a, b], err);
            }
        };
        self.heap.release(a);
        self.heap.release(b);
        self.push_owned(Cell::Object(r));
        Ok(())
    }
}

/// `x` followed by `y` in a freshly reserved buffer
fn join<T: Copy>(x: &[T], y: &[T]) -> Result<Vec<T>> {
    let mut joined = Vec::new();
    joined.try_reserve_exact(x.len() + y.len())?;
    joined.extend_from_slice(x);
    joined.extend_from_slice(y);
    Ok(joined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kk_core::{Style, render_string};

    fn floats(vm: &mut Vm, xs: &[f64]) {
        for &x in xs {
            vm.push_float(x);
        }
    }

    fn top_float(vm: &mut Vm) -> f64 {
        match vm.pop().unwrap() {
            Cell::Float(f) => f,
            other => panic!("expected float, got {:?}", other),
        }
    }

    #[test]
    fn test_add() {
        let mut vm = Vm::new();
        floats(&mut vm, &[2.0, 3.5]);
        vm.add().unwrap();
        assert_eq!(top_float(&mut vm), 5.5);
    }

    #[test]
    fn test_subtract_operand_order() {
        let mut vm = Vm::new();
        floats(&mut vm, &[3.0, 4.0]);
        vm.subtract().unwrap();
        assert_eq!(top_float(&mut vm), -1.0);
    }

    #[test]
    fn test_multiply_divide() {
        let mut vm = Vm::new();
        floats(&mut vm, &[6.0, 7.0]);
        vm.multiply().unwrap();
        assert_eq!(top_float(&mut vm), 42.0);

        floats(&mut vm, &[1.0, 4.0]);
        vm.divide().unwrap();
        assert_eq!(top_float(&mut vm), 0.25);
    }

    #[test]
    fn test_divide_by_zero() {
        let mut vm = Vm::new();
        floats(&mut vm, &[5.0, 0.0]);
        assert_eq!(vm.divide(), Err(RuntimeError::DivisionByZero));
    }

    #[test]
    fn test_modulo_truncates() {
        let mut vm = Vm::new();
        floats(&mut vm, &[7.9, 3.2]);
        vm.modulo().unwrap();
        assert_eq!(top_float(&mut vm), 1.0);

        floats(&mut vm, &[-7.0, 3.0]);
        vm.modulo().unwrap();
        assert_eq!(top_float(&mut vm), -1.0);
    }

    #[test]
    fn test_modulo_by_truncated_zero() {
        let mut vm = Vm::new();
        floats(&mut vm, &[5.0, 0.5]);
        assert_eq!(vm.modulo(), Err(RuntimeError::DivisionByZero));
    }

    #[test]
    fn test_abs() {
        let mut vm = Vm::new();
        vm.push_float(-2.5);
        vm.abs().unwrap();
        assert_eq!(top_float(&mut vm), 2.5);

        vm.push_null();
        assert!(matches!(vm.abs(), Err(RuntimeError::TypeError(_))));
    }

    #[test]
    fn test_concat_strings() {
        let mut vm = Vm::new();
        vm.push_string(b"foo").unwrap();
        vm.push_string(b"bar").unwrap();
        vm.add().unwrap();

        let s = vm.pop().unwrap();
        assert_eq!(vm.heap().string_bytes(s), Some(&b"foobar"[..]));
        vm.release(s);
        assert_eq!(vm.heap().live_objects(), 0);
    }

    #[test]
    fn test_concat_arrays_shares_elements() {
        let mut vm = Vm::new();
        vm.push_float(1.0);
        vm.mka().unwrap();
        vm.push_string(b"shared").unwrap();
        vm.push_float(0.0);
        vm.set().unwrap();
        vm.push_float(1.0);
        vm.mka().unwrap();
        vm.add().unwrap();

        let arr = vm.pop().unwrap();
        assert_eq!(
            render_string(vm.heap(), arr, Style::Debug),
            "[ \"shared\" null ]"
        );
        let inner = vm.heap().array_cells(arr).unwrap()[0];
        assert_eq!(vm.heap().refcount(inner.as_object().unwrap()), 1);
        vm.release(arr);
        assert_eq!(vm.heap().live_objects(), 0);
    }

    #[test]
    fn test_add_mismatch_names_both_kinds() {
        let mut vm = Vm::new();
        vm.push_float(1.0);
        vm.push_string(b"a").unwrap();
        assert_eq!(
            vm.add(),
            Err(RuntimeError::TypeError(
                "+: cannot add string to float".into()
            ))
        );
        assert_eq!(vm.heap().live_objects(), 0);
    }

    #[test]
    fn test_subtract_mismatch() {
        let mut vm = Vm::new();
        vm.push_char(b'a');
        vm.push_float(1.0);
        assert_eq!(
            vm.subtract(),
            Err(RuntimeError::TypeError(
                "-: cannot subtract char and float".into()
            ))
        );
    }

    #[test]
    fn test_add_underflow() {
        let mut vm = Vm::new();
        vm.push_float(1.0);
        assert!(matches!(
            vm.add(),
            Err(RuntimeError::StackUnderflow { requested: 2, available: 1 })
        ));
    }
}
