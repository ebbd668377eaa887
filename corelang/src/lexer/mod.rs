//! Lexer implementation using logos

mod token;

pub use token::{MAX_CONST, Token};

use crate::ast::Span;
use crate::error::{CompileError, Result};
use logos::Logos;

/// Tokenize source code
pub fn tokenize(source: &str) -> Result<Vec<(Token, Span)>> {
    let mut tokens = Vec::new();
    let mut lexer = Token::lexer(source);

    while let Some(result) = lexer.next() {
        let span = Span::new(lexer.span().start, lexer.span().end);
        match result {
            Ok(token) => tokens.push((token, span)),
            Err(_) => {
                let slice = lexer.slice();
                let message = if slice.bytes().all(|b| b.is_ascii_digit()) {
                    format!("integer constant {slice} is out of range (0..={MAX_CONST})")
                } else {
                    format!("unexpected character: {slice:?}")
                };
                return Err(CompileError::lexer(message, span));
            }
        }
    }

    Ok(tokens)
}

/// Read an input data feed: integer constants separated by whitespace
pub fn parse_input(source: &str) -> Result<Vec<i64>> {
    tokenize(source)?
        .into_iter()
        .map(|(token, span)| match token {
            Token::IntLit(n) => Ok(n),
            other => Err(CompileError::lexer(
                format!("input data must be integer constants, found `{other}`"),
                span,
            )),
        })
        .collect()
}
