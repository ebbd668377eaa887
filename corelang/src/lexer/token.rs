//! Token definitions

use logos::Logos;

/// Largest integer constant the language accepts
pub const MAX_CONST: i64 = 100_003;

/// Core token
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r]+")]
pub enum Token {
    // Keywords
    #[token("procedure")]
    Procedure,
    #[token("begin")]
    Begin,
    #[token("is")]
    Is,
    #[token("end")]
    End,
    #[token("if")]
    If,
    #[token("then")]
    Then,
    #[token("else")]
    Else,
    #[token("while")]
    While,
    #[token("do")]
    Do,
    #[token("in")]
    In,
    #[token("out")]
    Out,
    #[token("integer")]
    Integer,
    #[token("array")]
    Array,
    #[token("new")]
    New,
    #[token("not")]
    Not,
    #[token("and")]
    And,
    #[token("or")]
    Or,
    // Reserved, never accepted by the grammar
    #[token("return")]
    Return,

    // Literals and identifiers
    #[regex(r"[0-9]+", parse_const)]
    IntLit(i64),

    #[regex(r"[a-zA-Z][a-zA-Z0-9]*", |lex| lex.slice().to_string())]
    Ident(String),

    // Symbols
    #[token(":=")]
    Assign,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("=")]
    Eq,
    #[token("<")]
    Lt,
    #[token(";")]
    Semi,
    #[token(".")]
    Dot,
    #[token(",")]
    Comma,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
}

/// Constants outside `0..=MAX_CONST` are lexer errors
fn parse_const(lex: &mut logos::Lexer<'_, Token>) -> Option<i64> {
    lex.slice()
        .parse::<i64>()
        .ok()
        .filter(|n| *n <= MAX_CONST)
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Procedure => write!(f, "procedure"),
            Token::Begin => write!(f, "begin"),
            Token::Is => write!(f, "is"),
            Token::End => write!(f, "end"),
            Token::If => write!(f, "if"),
            Token::Then => write!(f, "then"),
            Token::Else => write!(f, "else"),
            Token::While => write!(f, "while"),
            Token::Do => write!(f, "do"),
            Token::In => write!(f, "in"),
            Token::Out => write!(f, "out"),
            Token::Integer => write!(f, "integer"),
            Token::Array => write!(f, "array"),
            Token::New => write!(f, "new"),
            Token::Not => write!(f, "not"),
            Token::And => write!(f, "and"),
            Token::Or => write!(f, "or"),
            Token::Return => write!(f, "return"),
            Token::IntLit(n) => write!(f, "{n}"),
            Token::Ident(name) => write!(f, "{name}"),
            Token::Assign => write!(f, ":="),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Eq => write!(f, "="),
            Token::Lt => write!(f, "<"),
            Token::Semi => write!(f, ";"),
            Token::Dot => write!(f, "."),
            Token::Comma => write!(f, ","),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
        }
    }
}
