//! Abstract Syntax Tree definitions
//!
//! One enum variant per grammar production. Every evaluator and checker
//! pattern-matches on these types directly.

mod expr;
mod span;
mod stmt;

pub use expr::*;
pub use span::*;
pub use stmt::*;

use serde::{Deserialize, Serialize};

/// A whole program: `procedure name is <decls> begin <body> end`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    pub name: Spanned<String>,
    pub decls: Vec<Decl>,
    pub body: Vec<Spanned<Stmt>>,
    pub span: Span,
}

impl Program {
    /// Procedure definitions in declaration order
    pub fn procedures(&self) -> impl Iterator<Item = &ProcDef> {
        self.decls.iter().filter_map(|decl| match decl {
            Decl::Proc(proc_def) => Some(proc_def),
            Decl::Var(_) => None,
        })
    }

    /// Global variable declarations in declaration order
    pub fn globals(&self) -> impl Iterator<Item = &VarDecl> {
        self.decls.iter().filter_map(|decl| match decl {
            Decl::Var(var) => Some(var),
            Decl::Proc(_) => None,
        })
    }
}

/// Item of the top-level declaration sequence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Decl {
    Var(VarDecl),
    Proc(ProcDef),
}

/// Variable kind named by a declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VarKind {
    Integer,
    Array,
}

impl std::fmt::Display for VarKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VarKind::Integer => write!(f, "integer"),
            VarKind::Array => write!(f, "array"),
        }
    }
}

/// `integer x;` or `array a;`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VarDecl {
    pub kind: VarKind,
    pub name: Spanned<String>,
    pub span: Span,
}

/// `procedure p(a, b) is <body> end`
///
/// Every formal parameter is an array bound by sharing at call time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcDef {
    pub name: Spanned<String>,
    pub params: Vec<Spanned<String>>,
    pub body: Vec<Spanned<Stmt>>,
    pub span: Span,
}
