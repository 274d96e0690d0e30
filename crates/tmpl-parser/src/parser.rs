//! Token-stream -> node-tree parser and tag registry (spec.md §4.3).
//!
//! Block tags aren't re-scanned for their closer: each tag's parse
//! function recurses directly into [`Parser::parse_body`], which stops
//! as soon as it sees a `Tag` lexeme whose name is one of the caller's
//! declared closers and hands that closer back, the way the teacher's
//! `Parser::parse_item` recurses for braced bodies rather than
//! re-tokenizing them.

use crate::bool_expr::parse_condition;
use crate::error::ParseError;
use crate::expr_parse::parse_filter_expression;
use tmpl_ast::{Node, NodeKind, Span, TagKind};
use tmpl_lexer::toplevel::{lex, Token, TokenKind};
use tmpl_lexer::words::{split_words, Word};

const AUTOESCAPE_CLOSERS: &[&str] = &["endautoescape"];
const IF_CLOSERS: &[&str] = &["elif", "else", "endif"];
const ALL_SENTINELS: &[&str] = &["endautoescape", "elif", "else", "endif"];

/// Parse a full template source into its node tree.
pub fn parse(source: &str) -> Result<Vec<Node>, ParseError> {
    let mut parser = Parser {
        source,
        tokens: lex(source),
        pos: 0,
    };
    // At the top level there are no valid closers, so `parse_body` never
    // returns `Some` here: any sentinel tag (`endif`/`elif`/`else`/
    // `endautoescape`) is reported as `UnexpectedTag` from within the
    // call itself.
    let (body, _stop) = parser.parse_body(&[])?;
    Ok(body)
}

/// The closing tag a `parse_body` call stopped at: its name, full
/// token (for span bookkeeping) and its own argument words.
struct Stop<'s> {
    name: String,
    token: Token,
    args: Vec<Word<'s>>,
}

struct Parser<'s> {
    source: &'s str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'s> Parser<'s> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Token {
        let t = self.tokens[self.pos];
        self.pos += 1;
        t
    }

    /// Parse nodes until end of input or a tag matching one of `closers`.
    /// Returns the accumulated body plus, if a closer was found, its
    /// `Stop` descriptor (already consumed from the stream).
    fn parse_body(&mut self, closers: &[&str]) -> Result<(Vec<Node>, Option<Stop<'s>>), ParseError> {
        let mut nodes = Vec::new();
        while let Some(token) = self.peek().copied() {
            match token.kind {
                TokenKind::Text => {
                    self.advance();
                    nodes.push(Node::new(
                        NodeKind::Text(token.text(self.source).to_string()),
                        Span::new(token.span.0, token.span.1),
                    ));
                }
                TokenKind::Comment => {
                    self.advance();
                }
                TokenKind::Variable => {
                    self.advance();
                    let expr = parse_filter_expression(token.content(self.source), token.content_span.0)?;
                    nodes.push(Node::new(
                        NodeKind::Variable(expr),
                        Span::new(token.span.0, token.span.1),
                    ));
                }
                TokenKind::Tag => {
                    let words = split_words(token.content(self.source), token.content_span.0);
                    let name = words.first().map(|w| w.text).unwrap_or("").to_string();
                    let args: Vec<Word<'s>> = words.into_iter().skip(1).collect();

                    if closers.contains(&name.as_str()) {
                        self.advance();
                        return Ok((nodes, Some(Stop { name, token, args })));
                    }

                    match name.as_str() {
                        "autoescape" => {
                            self.advance();
                            nodes.push(self.parse_autoescape(token, args)?);
                        }
                        "if" => {
                            self.advance();
                            nodes.push(self.parse_if(token, args)?);
                        }
                        _ if ALL_SENTINELS.contains(&name.as_str()) => {
                            self.advance();
                            return Err(ParseError::UnexpectedTag {
                                tag: "block".to_string(),
                                found: name,
                                at: token.span,
                            });
                        }
                        _ => {
                            self.advance();
                            return Err(ParseError::UnknownTag { name, at: token.span });
                        }
                    }
                }
            }
        }
        Ok((nodes, None))
    }

    fn parse_autoescape(&mut self, opener: Token, args: Vec<Word<'s>>) -> Result<Node, ParseError> {
        let name_word_end = name_word_end(opener, self.source);
        let on = match args.len() {
            0 => {
                return Err(ParseError::AutoescapeMissingArgument {
                    at: (name_word_end, name_word_end),
                })
            }
            1 => match args[0].text {
                "on" => true,
                "off" => false,
                _ => return Err(ParseError::AutoescapeInvalidArgument { at: args[0].span }),
            },
            _ => {
                let first = args[0];
                let last = *args.last().unwrap();
                return Err(ParseError::AutoescapeExtraArgument {
                    at: (first.span.0, last.span.1),
                });
            }
        };

        let (body, stop) = self.parse_body(AUTOESCAPE_CLOSERS)?;
        let closer = stop.ok_or_else(|| ParseError::UnclosedTag {
            tag: "autoescape".to_string(),
            expected: "endautoescape".to_string(),
            opening: opener.span,
        })?;

        Ok(Node::new(
            NodeKind::Tag(TagKind::Autoescape { on, body }),
            Span::new(opener.span.0, closer.token.span.1),
        ))
    }

    fn parse_if(&mut self, opener: Token, args: Vec<Word<'s>>) -> Result<Node, ParseError> {
        let mut branches = Vec::new();
        let mut else_body = None;
        let mut current_condition = parse_condition(args, opener.span)?;
        let mut opening_span = opener.span;

        loop {
            let (body, stop) = self.parse_body(IF_CLOSERS)?;
            let closer = stop.ok_or_else(|| ParseError::UnclosedTag {
                tag: "if".to_string(),
                expected: "elif, else, endif".to_string(),
                opening: opening_span,
            })?;
            branches.push((current_condition, body));

            match closer.name.as_str() {
                "elif" => {
                    current_condition = parse_condition(closer.args, closer.token.span)?;
                    opening_span = closer.token.span;
                    continue;
                }
                "else" => {
                    let (else_nodes, stop2) = self.parse_body(&["endif"])?;
                    stop2.ok_or_else(|| ParseError::UnclosedTag {
                        tag: "if".to_string(),
                        expected: "elif, else, endif".to_string(),
                        opening: opener.span,
                    })?;
                    else_body = Some(else_nodes);
                    break;
                }
                _ => break, // "endif"
            }
        }

        Ok(Node::new(
            NodeKind::Tag(TagKind::If { branches, else_body }),
            Span::new(opener.span.0, self.tokens[self.pos - 1].span.1),
        ))
    }
}

/// Exclusive end of the tag-name word within `opener`'s content, used
/// to anchor the "missing argument" zero-width span.
fn name_word_end(opener: Token, source: &str) -> usize {
    split_words(opener.content(source), opener.content_span.0)
        .first()
        .map(|w| w.span.1)
        .unwrap_or(opener.content_span.1)
}
