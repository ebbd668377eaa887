//! Runtime values for the interpreter

use std::fmt;

use crate::ast::VarKind;

use super::heap::ArrayId;

/// Runtime value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value {
    /// Integer, owned by its binding
    Int(i64),
    /// Handle to a heap array, `None` until allocated or shared
    Array(Option<ArrayId>),
}

impl Value {
    /// Default value for a fresh declaration
    pub fn default_for(kind: VarKind) -> Self {
        match kind {
            VarKind::Integer => Value::Int(0),
            VarKind::Array => Value::Array(None),
        }
    }

    pub fn kind(&self) -> VarKind {
        match self {
            Value::Int(_) => VarKind::Integer,
            Value::Array(_) => VarKind::Array,
        }
    }

    /// Heap array this value keeps alive, if any
    pub fn array_id(&self) -> Option<ArrayId> {
        match self {
            Value::Array(id) => *id,
            Value::Int(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Array(Some(id)) => write!(f, "array#{}", id.index()),
            Value::Array(None) => write!(f, "array(unallocated)"),
        }
    }
}

/// A name bound to a value in some scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub name: String,
    pub value: Value,
}

impl Binding {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}
