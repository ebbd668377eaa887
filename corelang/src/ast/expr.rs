//! Expression AST nodes

use super::Spanned;
use serde::{Deserialize, Serialize};

/// Integer-valued expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// Integer constant
    Const(i64),

    /// Variable reference: `x`
    Var(String),

    /// Array element: `a[index]`
    Index {
        name: String,
        index: Box<Spanned<Expr>>,
    },

    /// Binary arithmetic. `+`/`-` and `*`/`/` chains nest to the right.
    Binary {
        left: Box<Spanned<Expr>>,
        op: BinOp,
        right: Box<Spanned<Expr>>,
    },
}

impl Expr {
    /// Name of a bare identifier expression
    pub fn as_var(&self) -> Option<&str> {
        match self {
            Expr::Var(name) => Some(name),
            _ => None,
        }
    }
}

/// Arithmetic operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl std::fmt::Display for BinOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinOp::Add => write!(f, "+"),
            BinOp::Sub => write!(f, "-"),
            BinOp::Mul => write!(f, "*"),
            BinOp::Div => write!(f, "/"),
        }
    }
}
