//! Core language interpreter
//!
//! A small imperative language with integer and array variables, nested
//! procedures and a deterministic, reference-counted array heap.
//!
//! Pipeline: [`lexer`] → [`parser`] → [`types`] (semantic checks) →
//! [`interp`] (evaluation over the memory store).

pub mod ast;
pub mod config;
pub mod error;
pub mod interp;
pub mod lexer;
pub mod parser;
pub mod types;
pub mod util;

use std::sync::Once;

pub use ast::Span;
pub use config::RunConfig;
pub use error::{CompileError, Result};
pub use interp::{Event, Interpreter, RuntimeError, Transcript};

/// Any failure between source text and a finished run
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

/// Lex, parse and check a program
pub fn compile(source: &str) -> Result<ast::Program> {
    let program = parser::parse_source(source)?;
    types::TypeChecker::new().check_program(&program)?;
    Ok(program)
}

/// Compile and run a program, returning its transcript.
///
/// Use [`Interpreter`] directly to keep the transcript of a failed run.
pub fn run_source(
    source: &str,
    input: impl IntoIterator<Item = i64>,
    config: RunConfig,
) -> std::result::Result<Transcript, Error> {
    let program = compile(source)?;
    let mut interp = Interpreter::with_config(config).with_input(input);
    interp.run(&program)?;
    Ok(interp.transcript().clone())
}

static TRACING_INIT: Once = Once::new();

/// Install a `tracing` subscriber driven by `RUST_LOG`.
///
/// Does nothing unless `RUST_LOG` is set; safe to call more than once.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{EnvFilter, fmt, prelude::*};

        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true).with_writer(std::io::stderr))
                .with(EnvFilter::from_default_env())
                .init();
        }
    });
}
