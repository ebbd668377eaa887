//! Semantic checking
//!
//! Walks the program once with a compile-time scope stack that mirrors the
//! runtime layout: globals beside one stack of block scopes per activation.
//! A program that passes here can still fail at run time (bad index,
//! division by zero, unallocated array), but never on a name or kind error.

use std::collections::HashMap;

use crate::ast::*;
use crate::error::{CompileError, Result};
use crate::util::{closest_name, suggestion_hint};

/// Semantic checker
pub struct TypeChecker {
    /// Global variables, all visible from every procedure
    globals: HashMap<String, VarKind>,
    /// Procedure name -> number of formals
    procedures: HashMap<String, usize>,
    /// Block scopes of the activation being checked, innermost last
    scopes: Vec<HashMap<String, VarKind>>,
}

impl TypeChecker {
    pub fn new() -> Self {
        Self {
            globals: HashMap::new(),
            procedures: HashMap::new(),
            scopes: Vec::new(),
        }
    }

    pub fn check_program(&mut self, program: &Program) -> Result<()> {
        // First pass: every global and procedure signature, so bodies may
        // refer to names declared further down
        for decl in &program.decls {
            match decl {
                Decl::Var(var) => {
                    if self.globals.contains_key(&var.name.node) {
                        return Err(CompileError::semantic(
                            format!("variable `{}` is already declared", var.name.node),
                            var.name.span,
                        ));
                    }
                    self.globals.insert(var.name.node.clone(), var.kind);
                }
                Decl::Proc(proc_def) => {
                    if self.procedures.contains_key(&proc_def.name.node) {
                        return Err(CompileError::semantic(
                            format!("procedure `{}` is defined more than once", proc_def.name.node),
                            proc_def.name.span,
                        ));
                    }
                    self.procedures
                        .insert(proc_def.name.node.clone(), proc_def.params.len());
                }
            }
        }

        // Second pass: bodies
        for proc_def in program.procedures() {
            self.check_procedure(proc_def)?;
        }

        self.scopes = vec![HashMap::new()];
        let result = self.check_block(&program.body);
        self.scopes.clear();
        result
    }

    fn check_procedure(&mut self, proc_def: &ProcDef) -> Result<()> {
        self.scopes = vec![HashMap::new()];
        for param in &proc_def.params {
            if self.scopes[0].contains_key(&param.node) {
                return Err(CompileError::semantic(
                    format!(
                        "parameter `{}` appears twice in procedure `{}`",
                        param.node, proc_def.name.node
                    ),
                    param.span,
                ));
            }
            self.scopes[0].insert(param.node.clone(), VarKind::Array);
        }
        let result = self.check_block(&proc_def.body);
        self.scopes.clear();
        result
    }

    /// Check a statement sequence inside a fresh block scope
    fn check_scoped_block(&mut self, stmts: &[Spanned<Stmt>]) -> Result<()> {
        self.scopes.push(HashMap::new());
        let result = self.check_block(stmts);
        self.scopes.pop();
        result
    }

    fn check_block(&mut self, stmts: &[Spanned<Stmt>]) -> Result<()> {
        stmts.iter().try_for_each(|stmt| self.check_stmt(&stmt.node))
    }

    fn check_stmt(&mut self, stmt: &Stmt) -> Result<()> {
        match stmt {
            Stmt::Assign(assign) => self.check_assign(assign),

            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.check_cond(cond)?;
                self.check_scoped_block(then_branch)?;
                if let Some(else_branch) = else_branch {
                    self.check_scoped_block(else_branch)?;
                }
                Ok(())
            }

            Stmt::While { cond, body } => {
                self.check_cond(cond)?;
                self.check_scoped_block(body)
            }

            Stmt::Out(expr) => self.check_expr(expr),

            Stmt::In(name) => self.lookup(name).map(|_| ()),

            Stmt::Decl(var) => self.declare_local(var),

            Stmt::Call { name, args } => {
                let arity = *self.procedures.get(&name.node).ok_or_else(|| {
                    let suggestion =
                        closest_name(&name.node, self.procedures.keys().map(String::as_str));
                    CompileError::semantic(
                        format!(
                            "unknown procedure `{}`{}",
                            name.node,
                            suggestion_hint(suggestion)
                        ),
                        name.span,
                    )
                })?;
                if arity != args.len() {
                    return Err(CompileError::semantic(
                        format!(
                            "procedure `{}` takes {} argument(s) but {} were supplied",
                            name.node,
                            arity,
                            args.len()
                        ),
                        name.span,
                    ));
                }
                for arg in args {
                    self.expect_array(arg, "passed to a procedure")?;
                }
                Ok(())
            }
        }
    }

    fn check_assign(&mut self, assign: &Assign) -> Result<()> {
        match assign {
            // Integer targets take the value; array targets either share a
            // bare array name or store into element 0
            Assign::Scalar { target, value } => {
                self.lookup(target)?;
                self.check_expr(value)
            }
            Assign::Index {
                target,
                index,
                value,
            } => {
                self.expect_array(target, "indexed")?;
                self.check_expr(index)?;
                self.check_expr(value)
            }
            Assign::Share { target, source } => {
                self.expect_array(target, "rebound to another array")?;
                self.expect_array(source, "shared")
            }
            Assign::New { target, size } => {
                self.expect_array(target, "allocated")?;
                self.check_expr(size)
            }
        }
    }

    fn check_cond(&self, cond: &Cond) -> Result<()> {
        match cond {
            Cond::Cmp(cmp) => self.check_compare(cmp),
            Cond::Not(inner) => self.check_cond(inner),
            Cond::And(cmp, rest) | Cond::Or(cmp, rest) => {
                self.check_compare(cmp)?;
                self.check_cond(rest)
            }
        }
    }

    fn check_compare(&self, cmp: &Compare) -> Result<()> {
        self.check_expr(&cmp.left)?;
        self.check_expr(&cmp.right)
    }

    fn check_expr(&self, expr: &Spanned<Expr>) -> Result<()> {
        match &expr.node {
            Expr::Const(_) => Ok(()),
            Expr::Var(name) => self.lookup_name(name, expr.span).map(|_| ()),
            Expr::Index { name, index } => {
                if self.lookup_name(name, expr.span)? == VarKind::Integer {
                    return Err(CompileError::semantic(
                        format!("integer `{name}` cannot be indexed"),
                        expr.span,
                    ));
                }
                self.check_expr(index)
            }
            Expr::Binary { left, right, .. } => {
                self.check_expr(left)?;
                self.check_expr(right)
            }
        }
    }

    /// Local declarations may shadow globals but not another local of the
    /// same activation, whatever block it lives in
    fn declare_local(&mut self, var: &VarDecl) -> Result<()> {
        if self
            .scopes
            .iter()
            .any(|scope| scope.contains_key(&var.name.node))
        {
            return Err(CompileError::semantic(
                format!("variable `{}` is already declared", var.name.node),
                var.name.span,
            ));
        }
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(var.name.node.clone(), var.kind);
        }
        Ok(())
    }

    fn expect_array(&self, name: &Spanned<String>, role: &str) -> Result<()> {
        match self.lookup(name)? {
            VarKind::Array => Ok(()),
            VarKind::Integer => Err(CompileError::semantic(
                format!("integer `{}` cannot be {role}", name.node),
                name.span,
            )),
        }
    }

    fn lookup(&self, name: &Spanned<String>) -> Result<VarKind> {
        self.lookup_name(&name.node, name.span)
    }

    fn lookup_name(&self, name: &str, span: Span) -> Result<VarKind> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name))
            .or_else(|| self.globals.get(name))
            .copied()
            .ok_or_else(|| {
                let visible = self
                    .scopes
                    .iter()
                    .flat_map(|scope| scope.keys())
                    .chain(self.globals.keys())
                    .map(String::as_str);
                let suggestion = closest_name(name, visible);
                CompileError::semantic(
                    format!("undeclared variable `{name}`{}", suggestion_hint(suggestion)),
                    span,
                )
            })
    }
}

impl Default for TypeChecker {
    fn default() -> Self {
        Self::new()
    }
}
