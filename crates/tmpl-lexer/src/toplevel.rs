//! Top-level lexer: splits a template source into `Text` / `Variable` /
//! `Tag` / `Comment` lexemes.
//!
//! Delimiters (`{{ }}`, `{% %}`, `{# #}`) never nest and the first
//! matching close wins. This is a hand-scanned pass rather than a
//! `logos` grammar: the closing delimiter search has to skip past
//! partial matches inside arbitrary text, which regexes over the whole
//! source handle naturally but a single-token DFA does not compose with
//! "three independent delimiter pairs sharing a `{` prefix" cleanly.

use std::fmt;

/// Kind of a top-level lexeme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Text,
    Variable,
    Tag,
    Comment,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Text => write!(f, "text"),
            TokenKind::Variable => write!(f, "variable"),
            TokenKind::Tag => write!(f, "tag"),
            TokenKind::Comment => write!(f, "comment"),
        }
    }
}

/// A top-level lexeme with its full span (including delimiters, if any)
/// and, for `Variable`/`Tag`, the inner content span (excluding them).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Span over the whole lexeme, delimiters included.
    pub span: (usize, usize),
    /// Span over the interior content, delimiters excluded. Equal to
    /// `span` for `Text`.
    pub content_span: (usize, usize),
}

impl Token {
    pub fn content<'s>(&self, source: &'s str) -> &'s str {
        &source[self.content_span.0..self.content_span.1]
    }

    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        &source[self.span.0..self.span.1]
    }
}

const OPEN_VAR: &str = "{{";
const CLOSE_VAR: &str = "}}";
const OPEN_TAG: &str = "{%";
const CLOSE_TAG: &str = "%}";
const OPEN_COMMENT: &str = "{#";
const CLOSE_COMMENT: &str = "#}";

/// Scan `source` into a flat sequence of top-level tokens.
///
/// The concatenation of every returned token's `span` reproduces `source`
/// exactly (spec invariant: lex coverage). An unterminated `{{`, `{%` or
/// `{#` is not an error here: the rest of the source becomes `Text`,
/// matching the reference lexer's leniency. Errors for "this needed a
/// closing tag" surface later, in the parser, once it knows what kind of
/// closer was expected.
pub fn lex(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut pos = 0usize;
    let mut text_start = 0usize;
    let len = source.len();

    while pos < len {
        let rest = &source[pos..];
        let (open, close, kind) = if rest.starts_with(OPEN_VAR) {
            (OPEN_VAR, CLOSE_VAR, TokenKind::Variable)
        } else if rest.starts_with(OPEN_TAG) {
            (OPEN_TAG, CLOSE_TAG, TokenKind::Tag)
        } else if rest.starts_with(OPEN_COMMENT) {
            (OPEN_COMMENT, CLOSE_COMMENT, TokenKind::Comment)
        } else {
            pos += next_char_len(source, pos);
            continue;
        };

        if text_start < pos {
            tokens.push(Token {
                kind: TokenKind::Text,
                span: (text_start, pos),
                content_span: (text_start, pos),
            });
        }

        let content_start = pos + open.len();
        match source[content_start..].find(close) {
            Some(rel_end) => {
                let content_end = content_start + rel_end;
                let full_end = content_end + close.len();
                tokens.push(Token {
                    kind,
                    span: (pos, full_end),
                    content_span: (content_start, content_end),
                });
                pos = full_end;
                text_start = pos;
            }
            None => {
                // Unterminated construct: the remainder of the source
                // becomes Text, as if the opening delimiter were never
                // special.
                pos = len;
                text_start = text_start.min(len);
                break;
            }
        }
    }

    if text_start < len {
        tokens.push(Token {
            kind: TokenKind::Text,
            span: (text_start, len),
            content_span: (text_start, len),
        });
    }

    tokens
}

fn next_char_len(source: &str, pos: usize) -> usize {
    source[pos..]
        .chars()
        .next()
        .map(|c| c.len_utf8())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn reassemble(source: &str, tokens: &[Token]) -> String {
        tokens.iter().map(|t| t.text(source)).collect()
    }

    #[test]
    fn text_only() {
        let source = "hello, world";
        let tokens = lex(source);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Text);
        assert_eq!(reassemble(source, &tokens), source);
    }

    #[test]
    fn variable_and_tag_and_comment() {
        let source = "a {{ b }} c {% d %} e {# f #} g";
        let tokens = lex(source);
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Text,
                TokenKind::Variable,
                TokenKind::Text,
                TokenKind::Tag,
                TokenKind::Text,
                TokenKind::Comment,
                TokenKind::Text,
            ]
        );
        assert_eq!(reassemble(source, &tokens), source);
    }

    #[test]
    fn content_span_excludes_delimiters() {
        let source = "{{ name }}";
        let tokens = lex(source);
        assert_eq!(tokens[0].content(source), " name ");
    }

    #[test]
    fn unterminated_variable_becomes_text() {
        let source = "hi {{ nope";
        let tokens = lex(source);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Text);
        assert_eq!(reassemble(source, &tokens), source);
    }

    #[test]
    fn adjacent_constructs_with_no_text_between() {
        let source = "{{ a }}{% b %}";
        let tokens = lex(source);
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![TokenKind::Variable, TokenKind::Tag]);
        assert_eq!(reassemble(source, &tokens), source);
    }

    #[test]
    fn empty_source() {
        assert_eq!(lex("").len(), 0);
    }

    proptest::proptest! {
        #[test]
        fn lex_coverage(source in ".{0,200}") {
            let tokens = lex(&source);
            let rebuilt = reassemble(&source, &tokens);
            proptest::prop_assert_eq!(rebuilt, source);
        }
    }
}
