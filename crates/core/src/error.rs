//! Runtime Error Taxonomy
//!
//! Every contract violation a word can hit is one of these variants. Nothing
//! here is recoverable: the operand stack may be half-consumed when an error is
//! raised, so the driver reports it and terminates. Inside the library the
//! error is an ordinary value, which keeps every operation testable.
//!
//! # Usage
//!
//! ```ignore
//! if divisor == 0.0 {
//!     return Err(RuntimeError::DivisionByZero);
//! }
//! ```

use std::fmt;

/// Result alias used by every fallible runtime operation
pub type Result<T> = std::result::Result<T, RuntimeError>;

/// A fatal runtime error raised by a stack or built-in operation
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeError {
    /// Pop or peek on a stack that does not hold enough cells
    EmptyStack,
    /// A word needed more cells than the stack holds
    StackUnderflow { requested: usize, available: usize },
    /// Operand kinds do not fit the word; the message names them
    TypeError(String),
    /// Index outside the container it was applied to
    IndexOutOfRange { index: i64, len: usize },
    /// Division or modulo by zero
    DivisionByZero,
    /// The heap could not provide memory for an object or payload
    AllocationFailure(String),
}

impl RuntimeError {
    /// Build a type error from anything displayable
    pub fn type_error(msg: impl Into<String>) -> Self {
        RuntimeError::TypeError(msg.into())
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::EmptyStack => write!(f, "Unexpected empty stack."),
            RuntimeError::StackUnderflow {
                requested,
                available,
            } => write!(
                f,
                "Trying to pop {} elements from stack {} elements long.",
                requested, available
            ),
            RuntimeError::TypeError(msg) => write!(f, "{}", msg),
            RuntimeError::IndexOutOfRange { index, len } => {
                write!(f, "Index {} out of range {}.", index, len)
            }
            RuntimeError::DivisionByZero => write!(f, "Division by zero."),
            RuntimeError::AllocationFailure(what) => write!(f, "Failed to allocate {}.", what),
        }
    }
}

impl std::error::Error for RuntimeError {}

impl From<std::collections::TryReserveError> for RuntimeError {
    fn from(e: std::collections::TryReserveError) -> Self {
        RuntimeError::AllocationFailure(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_underflow_message() {
        let err = RuntimeError::StackUnderflow {
            requested: 3,
            available: 1,
        };
        assert_eq!(
            err.to_string(),
            "Trying to pop 3 elements from stack 1 elements long."
        );
    }

    #[test]
    fn test_index_message() {
        let err = RuntimeError::IndexOutOfRange { index: 7, len: 3 };
        assert_eq!(err.to_string(), "Index 7 out of range 3.");
    }

    #[test]
    fn test_type_error_passes_message_through() {
        let err = RuntimeError::type_error("+: cannot add string to float");
        assert_eq!(err.to_string(), "+: cannot add string to float");
    }

    #[test]
    fn test_try_reserve_maps_to_allocation_failure() {
        let mut v: Vec<u64> = Vec::new();
        let err: RuntimeError = v.try_reserve(usize::MAX).unwrap_err().into();
        assert!(matches!(err, RuntimeError::AllocationFailure(_)));
    }
}
