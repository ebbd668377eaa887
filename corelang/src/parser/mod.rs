//! Parser implementation using lalrpop

use crate::ast::{Program, Span};
use crate::error::{CompileError, Result};
use crate::lexer::Token;
use lalrpop_util::ParseError;


lalrpop_util::lalrpop_mod!(
    #[allow(clippy::all)]
    grammar
);

/// Parse tokens into AST
pub fn parse(source: &str, tokens: Vec<(Token, Span)>) -> Result<Program> {
    let token_iter = tokens
        .into_iter()
        .map(|(tok, span)| Ok::<_, String>((span.start, tok, span.end)));

    grammar::ProgramParser::new()
        .parse(token_iter)
        .map_err(|e| {
            let span = match &e {
                ParseError::InvalidToken { location } => Span::new(*location, *location + 1),
                // Point at the last byte so the report stays inside the source
                ParseError::UnrecognizedEof { location, .. } => {
                    let end = (*location).min(source.len());
                    Span::new(end.saturating_sub(1), end)
                }
                ParseError::UnrecognizedToken { token, .. } => Span::new(token.0, token.2),
                ParseError::ExtraToken { token } => Span::new(token.0, token.2),
                ParseError::User { .. } => Span::new(0, 1),
            };
            CompileError::parser(describe(&e), span)
        })
}

/// Lex and parse in one step
pub fn parse_source(source: &str) -> Result<Program> {
    let tokens = crate::lexer::tokenize(source)?;
    parse(source, tokens)
}

fn describe(error: &ParseError<usize, Token, String>) -> String {
    match error {
        ParseError::UnrecognizedToken { token, expected } => {
            format!("unexpected `{}`, expected one of {}", token.1, expected.join(", "))
        }
        ParseError::UnrecognizedEof { expected, .. } => {
            format!("unexpected end of input, expected one of {}", expected.join(", "))
        }
        ParseError::ExtraToken { token } => format!("unexpected `{}` after program end", token.1),
        ParseError::InvalidToken { .. } => "invalid token".to_string(),
        ParseError::User { error } => error.clone(),
    }
}
