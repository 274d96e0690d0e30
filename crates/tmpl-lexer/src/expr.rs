//! Inner tokenizer for a single filter-expression word (spec.md §4.2):
//! `var(|filter(:arg)?)*`. Built on `logos`, the way the teacher's own
//! `Token` enum tokenizes identifiers/literals/operators for the Vais
//! grammar.
//!
//! A filter-expression word never contains un-escaped whitespace (that's
//! what [`crate::words::split_words`] guarantees by construction), so,
//! unlike the top-level lexer, letting `logos` skip whitespace here is
//! harmless and simplifies quoted-argument handling.

use logos::Logos;
use std::fmt;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t]+")]
pub enum ExprToken {
    #[token(".")]
    Dot,
    #[token("|")]
    Pipe,
    #[token(":")]
    Colon,

    #[regex(r"-?[0-9]+\.[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    Float(f64),
    #[regex(r"-?[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Int(i64),

    #[regex(r#""([^"\\]|\\.)*""#, |lex| unquote(lex.slice()))]
    #[regex(r"'([^'\\]|\\.)*'", |lex| unquote(lex.slice()))]
    Str(String),

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),
}

impl fmt::Display for ExprToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExprToken::Dot => write!(f, "."),
            ExprToken::Pipe => write!(f, "|"),
            ExprToken::Colon => write!(f, ":"),
            ExprToken::Float(n) => write!(f, "{n}"),
            ExprToken::Int(n) => write!(f, "{n}"),
            ExprToken::Str(s) => write!(f, "{s:?}"),
            ExprToken::Ident(s) => write!(f, "{s}"),
        }
    }
}

/// Strip the surrounding quote characters and resolve backslash escapes,
/// per spec.md §3: literals support backslash-escaped characters.
fn unquote(raw: &str) -> Option<String> {
    let inner = &raw[1..raw.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(escaped) => out.push(escaped),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    Some(out)
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpannedExprToken {
    pub token: ExprToken,
    pub span: (usize, usize),
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ExprLexError {
    #[error("invalid token at position {0}")]
    InvalidToken(usize),
}

/// Tokenize a single filter-expression word. `base_offset` is the byte
/// offset of `word` within the original template source.
pub fn lex_filter_chain(word: &str, base_offset: usize) -> Result<Vec<SpannedExprToken>, ExprLexError> {
    let mut tokens = Vec::new();
    let mut lexer = ExprToken::lexer(word);

    while let Some(result) = lexer.next() {
        match result {
            Ok(token) => {
                let span = lexer.span();
                tokens.push(SpannedExprToken {
                    token,
                    span: (base_offset + span.start, base_offset + span.end),
                });
            }
            Err(_) => return Err(ExprLexError::InvalidToken(base_offset + lexer.span().start)),
        }
    }

    Ok(tokens)
}
