//! Runtime errors for the interpreter

use std::fmt;

/// Fatal error raised while running a program
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeError {
    pub kind: ErrorKind,
    pub message: String,
}

/// Kinds of runtime errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Name not bound in any visible scope
    UndeclaredVariable,
    /// Name already bound in the active scope
    DoubleDeclaration,
    /// Integer used as an array, or an unallocated array used as an integer
    TypeMismatch,
    DivisionByZero,
    /// Indexed access on an array with no storage yet
    ArrayNotInitialized,
    /// Index outside `0..len`, or a negative allocation size
    IndexOutOfRange,
    /// `in` with no input values left
    InputExhausted,
    UnknownProcedure,
    /// Call with the wrong number of arguments
    ArityMismatch,
    /// Procedure nesting deeper than the configured limit
    StackOverflow,
    /// Array allocation larger than the configured limit or the host allows
    OutOfMemory,
}

impl RuntimeError {
    pub fn undeclared_variable(name: &str) -> Self {
        RuntimeError {
            kind: ErrorKind::UndeclaredVariable,
            message: format!("undeclared variable `{name}`"),
        }
    }

    pub fn double_declaration(name: &str) -> Self {
        RuntimeError {
            kind: ErrorKind::DoubleDeclaration,
            message: format!("variable `{name}` is already declared in this scope"),
        }
    }

    pub fn type_mismatch(name: &str, detail: &str) -> Self {
        RuntimeError {
            kind: ErrorKind::TypeMismatch,
            message: format!("type mismatch on `{name}`: {detail}"),
        }
    }

    pub fn division_by_zero() -> Self {
        RuntimeError {
            kind: ErrorKind::DivisionByZero,
            message: "division by zero".to_string(),
        }
    }

    pub fn array_not_initialized(name: &str) -> Self {
        RuntimeError {
            kind: ErrorKind::ArrayNotInitialized,
            message: format!("array `{name}` has not been allocated"),
        }
    }

    pub fn index_out_of_range(name: &str, index: i64, len: usize) -> Self {
        RuntimeError {
            kind: ErrorKind::IndexOutOfRange,
            message: format!("index {index} out of range for `{name}` of length {len}"),
        }
    }

    pub fn negative_size(name: &str, size: i64) -> Self {
        RuntimeError {
            kind: ErrorKind::IndexOutOfRange,
            message: format!("cannot allocate `{name}` with negative size {size}"),
        }
    }

    pub fn input_exhausted(name: &str) -> Self {
        RuntimeError {
            kind: ErrorKind::InputExhausted,
            message: format!("no input left to read into `{name}`"),
        }
    }

    pub fn unknown_procedure(name: &str) -> Self {
        RuntimeError {
            kind: ErrorKind::UnknownProcedure,
            message: format!("unknown procedure `{name}`"),
        }
    }

    pub fn arity_mismatch(name: &str, expected: usize, got: usize) -> Self {
        RuntimeError {
            kind: ErrorKind::ArityMismatch,
            message: format!("procedure `{name}` expects {expected} argument(s), got {got}"),
        }
    }

    pub fn stack_overflow(limit: usize) -> Self {
        RuntimeError {
            kind: ErrorKind::StackOverflow,
            message: format!("stack overflow: call depth exceeds {limit}"),
        }
    }

    pub fn out_of_memory(name: &str, size: usize) -> Self {
        RuntimeError {
            kind: ErrorKind::OutOfMemory,
            message: format!("cannot allocate `{name}` with {size} elements"),
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Runtime error: {}", self.message)
    }
}

impl std::error::Error for RuntimeError {}

/// Result type for interpreter operations
pub type InterpResult<T> = Result<T, RuntimeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_set_kind() {
        let cases = [
            (RuntimeError::undeclared_variable("x"), ErrorKind::UndeclaredVariable),
            (RuntimeError::double_declaration("x"), ErrorKind::DoubleDeclaration),
            (RuntimeError::type_mismatch("x", "not an array"), ErrorKind::TypeMismatch),
            (RuntimeError::division_by_zero(), ErrorKind::DivisionByZero),
            (RuntimeError::array_not_initialized("a"), ErrorKind::ArrayNotInitialized),
            (RuntimeError::index_out_of_range("a", 5, 3), ErrorKind::IndexOutOfRange),
            (RuntimeError::negative_size("a", -1), ErrorKind::IndexOutOfRange),
            (RuntimeError::input_exhausted("x"), ErrorKind::InputExhausted),
            (RuntimeError::unknown_procedure("p"), ErrorKind::UnknownProcedure),
            (RuntimeError::arity_mismatch("p", 2, 1), ErrorKind::ArityMismatch),
            (RuntimeError::stack_overflow(10), ErrorKind::StackOverflow),
            (RuntimeError::out_of_memory("a", 1 << 40), ErrorKind::OutOfMemory),
        ];
        for (err, kind) in cases {
            assert_eq!(err.kind, kind, "{}", err.message);
        }
    }

    #[test]
    fn test_index_message() {
        let err = RuntimeError::index_out_of_range("buf", 5, 3);
        assert!(err.message.contains("index 5"));
        assert!(err.message.contains("`buf`"));
        assert!(err.message.contains("length 3"));
    }

    #[test]
    fn test_display() {
        let err = RuntimeError::division_by_zero();
        assert_eq!(err.to_string(), "Runtime error: division by zero");
    }
}
