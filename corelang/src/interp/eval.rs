//! Statement and expression evaluator

use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use tracing::trace;

use super::error::{InterpResult, RuntimeError};
use super::memory::MemoryStore;
use super::transcript::Transcript;
use crate::ast::{Assign, BinOp, CmpOp, Compare, Cond, Decl, Expr, ProcDef, Program, Spanned, Stmt, VarKind};
use crate::config::RunConfig;

/// Stack growth parameters for deep recursion
const STACK_RED_ZONE: usize = 128 * 1024; // 128KB remaining triggers growth
const STACK_GROW_SIZE: usize = 4 * 1024 * 1024; // Grow by 4MB each time

/// The interpreter
pub struct Interpreter {
    memory: MemoryStore,
    /// Procedures registered during the declaration phase
    procedures: HashMap<String, Rc<ProcDef>>,
    /// Values consumed by `in`
    input: VecDeque<i64>,
    /// Current procedure nesting
    call_depth: usize,
    config: RunConfig,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_config(RunConfig::default())
    }

    pub fn with_config(config: RunConfig) -> Self {
        Interpreter {
            memory: MemoryStore::new().with_max_array_len(config.max_array_len),
            procedures: HashMap::new(),
            input: VecDeque::new(),
            call_depth: 0,
            config,
        }
    }

    /// Queue values for `in` statements
    pub fn with_input(mut self, input: impl IntoIterator<Item = i64>) -> Self {
        self.input.extend(input);
        self
    }

    /// Run a checked program to completion.
    ///
    /// On failure the transcript keeps every event recorded before the error.
    pub fn run(&mut self, program: &Program) -> InterpResult<()> {
        self.load(program)?;
        self.exec_block(&program.body)?;
        if self.config.release_on_exit {
            self.memory.release_all();
        }
        Ok(())
    }

    /// Declaration phase: globals and procedure definitions, in source order
    fn load(&mut self, program: &Program) -> InterpResult<()> {
        for decl in &program.decls {
            match decl {
                Decl::Var(var) => self.memory.declare(var.kind, &var.name.node)?,
                Decl::Proc(proc_def) => {
                    self.procedures
                        .insert(proc_def.name.node.clone(), Rc::new(proc_def.clone()));
                }
            }
        }
        self.memory.finish_declarations();
        Ok(())
    }

    pub fn transcript(&self) -> &Transcript {
        self.memory.transcript()
    }

    pub fn memory(&self) -> &MemoryStore {
        &self.memory
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    // ===== Statements =====

    fn exec_block(&mut self, stmts: &[Spanned<Stmt>]) -> InterpResult<()> {
        stmts.iter().try_for_each(|stmt| self.exec_stmt(&stmt.node))
    }

    fn exec_stmt(&mut self, stmt: &Stmt) -> InterpResult<()> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || self.exec_stmt_inner(stmt))
    }

    fn exec_stmt_inner(&mut self, stmt: &Stmt) -> InterpResult<()> {
        match stmt {
            Stmt::Assign(assign) => self.exec_assign(assign),

            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let taken = self.eval_cond(cond)?;
                self.memory.push_frame();
                if taken {
                    self.exec_block(then_branch)?;
                } else if let Some(else_branch) = else_branch {
                    self.exec_block(else_branch)?;
                }
                self.memory.pop_frame();
                Ok(())
            }

            Stmt::While { cond, body } => {
                self.memory.push_frame();
                let mark = self.memory.local_binding_count();
                while self.eval_cond(cond)? {
                    self.exec_block(body)?;
                    // Body declarations start fresh on the next iteration
                    while self.memory.local_binding_count() > mark {
                        self.memory.pop_one_local_binding();
                    }
                }
                self.memory.pop_frame();
                Ok(())
            }

            Stmt::Out(expr) => {
                let value = self.eval_expr(expr)?;
                trace!(value, "out");
                self.memory.record_output(value);
                Ok(())
            }

            Stmt::In(name) => {
                let value = self
                    .input
                    .pop_front()
                    .ok_or_else(|| RuntimeError::input_exhausted(&name.node))?;
                self.memory.write_scalar(&name.node, value)
            }

            Stmt::Decl(var) => self.memory.declare(var.kind, &var.name.node),

            Stmt::Call { name, args } => self.call_procedure(&name.node, args),
        }
    }

    fn exec_assign(&mut self, assign: &Assign) -> InterpResult<()> {
        match assign {
            Assign::Scalar { target, value } => {
                // `a := b` between two arrays shares rather than copies element 0
                if let Some(source) = value.node.as_var() {
                    let both_arrays = self.memory.kind_of(&target.node) == Some(VarKind::Array)
                        && self.memory.kind_of(source) == Some(VarKind::Array);
                    if both_arrays {
                        return self.memory.bind_shared(&target.node, source);
                    }
                }
                let value = self.eval_expr(value)?;
                self.memory.write_scalar(&target.node, value)
            }
            Assign::Index {
                target,
                index,
                value,
            } => {
                let index = self.eval_expr(index)?;
                let value = self.eval_expr(value)?;
                self.memory.write_indexed(&target.node, index, value)
            }
            Assign::Share { target, source } => self.memory.bind_shared(&target.node, &source.node),
            Assign::New { target, size } => {
                let size = self.eval_expr(size)?;
                self.memory.allocate_array(&target.node, size)
            }
        }
    }

    // ===== Procedure calls =====

    /// Call a procedure with automatic stack growth
    fn call_procedure(&mut self, name: &str, args: &[Spanned<String>]) -> InterpResult<()> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
            self.call_procedure_inner(name, args)
        })
    }

    #[tracing::instrument(level = "trace", skip_all, fields(procedure = %name))]
    fn call_procedure_inner(&mut self, name: &str, args: &[Spanned<String>]) -> InterpResult<()> {
        let proc_def = self
            .procedures
            .get(name)
            .cloned()
            .ok_or_else(|| RuntimeError::unknown_procedure(name))?;

        if proc_def.params.len() != args.len() {
            return Err(RuntimeError::arity_mismatch(
                name,
                proc_def.params.len(),
                args.len(),
            ));
        }

        if self.call_depth >= self.config.max_call_depth {
            return Err(RuntimeError::stack_overflow(self.config.max_call_depth));
        }

        // Actuals resolve in the caller's scope, before the callee exists
        let resolved = args
            .iter()
            .map(|arg| self.memory.resolve_shared(&arg.node))
            .collect::<InterpResult<Vec<_>>>()?;

        self.memory.push_call_frame();
        self.call_depth += 1;
        for (param, shared) in proc_def.params.iter().zip(resolved) {
            self.memory.declare(VarKind::Array, &param.node)?;
            self.memory.bind_resolved(&param.node, shared)?;
        }

        self.exec_block(&proc_def.body)?;

        self.memory.pop_call_frame();
        self.call_depth -= 1;
        Ok(())
    }

    // ===== Conditions =====

    /// Both sides of `and`/`or` are always evaluated
    fn eval_cond(&self, cond: &Cond) -> InterpResult<bool> {
        match cond {
            Cond::Cmp(cmp) => self.eval_compare(cmp),
            Cond::Not(inner) => Ok(!self.eval_cond(inner)?),
            Cond::And(cmp, rest) => {
                let left = self.eval_compare(cmp)?;
                let right = self.eval_cond(rest)?;
                Ok(left && right)
            }
            Cond::Or(cmp, rest) => {
                let left = self.eval_compare(cmp)?;
                let right = self.eval_cond(rest)?;
                Ok(left || right)
            }
        }
    }

    fn eval_compare(&self, cmp: &Compare) -> InterpResult<bool> {
        let left = self.eval_expr(&cmp.left)?;
        let right = self.eval_expr(&cmp.right)?;
        Ok(match cmp.op {
            CmpOp::Eq => left == right,
            CmpOp::Lt => left < right,
        })
    }

    // ===== Expressions =====

    /// Evaluate an expression with automatic stack growth
    fn eval_expr(&self, expr: &Spanned<Expr>) -> InterpResult<i64> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || self.eval_expr_inner(&expr.node))
    }

    fn eval_expr_inner(&self, expr: &Expr) -> InterpResult<i64> {
        match expr {
            Expr::Const(n) => Ok(*n),
            Expr::Var(name) => self.memory.read_scalar(name),
            Expr::Index { name, index } => {
                let index = self.eval_expr(index)?;
                self.memory.read_indexed(name, index)
            }
            Expr::Binary { left, op, right } => {
                let left = self.eval_expr(left)?;
                let right = self.eval_expr(right)?;
                match op {
                    BinOp::Add => Ok(left.wrapping_add(right)),
                    BinOp::Sub => Ok(left.wrapping_sub(right)),
                    BinOp::Mul => Ok(left.wrapping_mul(right)),
                    BinOp::Div if right == 0 => Err(RuntimeError::division_by_zero()),
                    BinOp::Div => Ok(left.wrapping_div(right)),
                }
            }
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}
