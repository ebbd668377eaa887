//! Statement and condition AST nodes

use super::{Expr, Spanned, VarDecl};
use serde::{Deserialize, Serialize};

/// Statement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Stmt {
    /// One of the four assignment forms
    Assign(Assign),

    /// `if c then ... [else ...] end`
    If {
        cond: Cond,
        then_branch: Vec<Spanned<Stmt>>,
        else_branch: Option<Vec<Spanned<Stmt>>>,
    },

    /// `while c do ... end`
    While {
        cond: Cond,
        body: Vec<Spanned<Stmt>>,
    },

    /// `out(e);`
    Out(Spanned<Expr>),

    /// `in(x);`
    In(Spanned<String>),

    /// Local declaration inside a statement sequence
    Decl(VarDecl),

    /// `begin p(a, b);`
    Call {
        name: Spanned<String>,
        args: Vec<Spanned<String>>,
    },
}

/// Assignment forms
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Assign {
    /// `x := e;`
    Scalar {
        target: Spanned<String>,
        value: Spanned<Expr>,
    },
    /// `a[i] := e;`
    Index {
        target: Spanned<String>,
        index: Spanned<Expr>,
        value: Spanned<Expr>,
    },
    /// `a := array b;`
    Share {
        target: Spanned<String>,
        source: Spanned<String>,
    },
    /// `a := new integer[n];`
    New {
        target: Spanned<String>,
        size: Spanned<Expr>,
    },
}

impl Assign {
    /// Name being assigned to
    pub fn target(&self) -> &Spanned<String> {
        match self {
            Assign::Scalar { target, .. }
            | Assign::Index { target, .. }
            | Assign::Share { target, .. }
            | Assign::New { target, .. } => target,
        }
    }
}

/// Boolean condition. `and`/`or` take a comparison on the left and nest to the right.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Cond {
    Cmp(Compare),
    Not(Box<Cond>),
    And(Compare, Box<Cond>),
    Or(Compare, Box<Cond>),
}

/// `e1 = e2` or `e1 < e2`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Compare {
    pub left: Spanned<Expr>,
    pub op: CmpOp,
    pub right: Spanned<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CmpOp {
    Eq,
    Lt,
}

impl std::fmt::Display for CmpOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CmpOp::Eq => write!(f, "="),
            CmpOp::Lt => write!(f, "<"),
        }
    }
}
