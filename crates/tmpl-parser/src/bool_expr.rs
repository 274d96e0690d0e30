//! Recursive-descent parser for the `if` tag's boolean sub-language
//! (spec.md §4.5):
//!
//! ```text
//! expr      := or
//! or        := and ('or' and)*
//! and       := not_ ('and' not_)*
//! not_      := 'not' not_ | compare
//! compare   := atom (cmp_op atom)?
//! cmp_op    := '==' | '!=' | '<' | '>' | '<=' | '>=' | 'in' | 'not in' | 'is' | 'is not'
//! atom      := literal | lookup
//! ```

use crate::error::ParseError;
use crate::expr_parse::parse_filter_expression;
use tmpl_ast::{BoolExpr, CompareOp};
use tmpl_lexer::words::Word;

/// Recursion depth cap (spec.md §9): beyond this, overflow is reported
/// the same way as running out of input mid-expression.
const MAX_DEPTH: usize = 1024;

struct CondParser<'s> {
    words: Vec<Word<'s>>,
    pos: usize,
    depth: usize,
}

/// Parse the condition words of an `if`/`elif` tag (everything after the
/// tag keyword) into a `BoolExpr`. `tag_span` is the full `{% ... %}`
/// span, used to anchor the "empty condition" error.
pub fn parse_condition(words: Vec<Word<'_>>, tag_span: (usize, usize)) -> Result<BoolExpr, ParseError> {
    if words.is_empty() {
        return Err(ParseError::MissingBooleanExpression { at: tag_span });
    }
    let mut parser = CondParser { words, pos: 0, depth: 0 };
    let expr = parser.or_expr(tag_span)?;
    if parser.pos < parser.words.len() {
        let leftover = parser.words[parser.pos];
        return Err(ParseError::UnusedExpression {
            token: leftover.text.to_string(),
            at: leftover.span,
        });
    }
    Ok(expr)
}

impl<'s> CondParser<'s> {
    fn peek(&self) -> Option<&Word<'s>> {
        self.words.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Word<'s>> {
        self.words.get(self.pos + offset)
    }

    fn advance(&mut self) -> Word<'s> {
        let w = self.words[self.pos];
        self.pos += 1;
        w
    }

    fn or_expr(&mut self, ctx: (usize, usize)) -> Result<BoolExpr, ParseError> {
        let mut left = self.and_expr(ctx)?;
        while self.peek().map(|w| w.text) == Some("or") {
            let op = self.advance();
            let right = self.and_expr(op.span)?;
            left = BoolExpr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn and_expr(&mut self, ctx: (usize, usize)) -> Result<BoolExpr, ParseError> {
        let mut left = self.not_expr(ctx)?;
        while self.peek().map(|w| w.text) == Some("and") {
            let op = self.advance();
            let right = self.not_expr(op.span)?;
            left = BoolExpr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn not_expr(&mut self, ctx: (usize, usize)) -> Result<BoolExpr, ParseError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            self.depth -= 1;
            return Err(ParseError::UnexpectedEndOfExpression { at: ctx });
        }

        let result = if self.peek().map(|w| w.text) == Some("not") && self.peek_at(1).map(|w| w.text) != Some("in") {
            let op = self.advance();
            let operand = self.not_expr(op.span)?;
            Ok(BoolExpr::Not(Box::new(operand)))
        } else {
            self.compare(ctx)
        };
        self.depth -= 1;
        result
    }

    fn compare(&mut self, ctx: (usize, usize)) -> Result<BoolExpr, ParseError> {
        let left = self.atom(ctx)?;
        match self.try_consume_cmp_op() {
            Some((op, op_span)) => {
                let right = self.atom(op_span)?;
                Ok(BoolExpr::Compare(op, Box::new(left), Box::new(right)))
            }
            None => Ok(left),
        }
    }

    fn try_consume_cmp_op(&mut self) -> Option<(CompareOp, (usize, usize))> {
        let word = self.peek()?;
        let op = match word.text {
            "==" => CompareOp::Eq,
            "!=" => CompareOp::Neq,
            "<" => CompareOp::Lt,
            ">" => CompareOp::Gt,
            "<=" => CompareOp::Lte,
            ">=" => CompareOp::Gte,
            "in" => CompareOp::In,
            "is" => {
                if self.peek_at(1).map(|w| w.text) == Some("not") {
                    let first = self.advance();
                    let second = self.advance();
                    return Some((CompareOp::IsNot, (first.span.0, second.span.1)));
                }
                CompareOp::Is
            }
            "not" if self.peek_at(1).map(|w| w.text) == Some("in") => {
                let first = self.advance();
                let second = self.advance();
                return Some((CompareOp::NotIn, (first.span.0, second.span.1)));
            }
            _ => return None,
        };
        let span = self.advance().span;
        Some((op, span))
    }

    /// Parse a single atom, raising the exact "appeared where an atom
    /// was expected" errors spec.md §4.5 requires for stray operator
    /// keywords (and/or/in/is/not in/is not, plus the comparison
    /// symbols for symmetry).
    fn atom(&mut self, ctx: (usize, usize)) -> Result<BoolExpr, ParseError> {
        let word = match self.peek() {
            Some(w) => *w,
            None => return Err(ParseError::UnexpectedEndOfExpression { at: ctx }),
        };

        if let Some((token, span)) = self.detect_operator_in_atom_position(word) {
            return Err(ParseError::UnexpectedOperator { token, at: span });
        }

        self.advance();
        let expr = parse_filter_expression(word.text, word.span.0)?;
        Ok(BoolExpr::Atom(expr))
    }

    fn detect_operator_in_atom_position(&self, word: Word<'s>) -> Option<(String, (usize, usize))> {
        match word.text {
            "and" | "or" | "in" | "==" | "!=" | "<" | ">" | "<=" | ">=" => {
                Some((word.text.to_string(), word.span))
            }
            "not" => {
                if self.peek_at(1).map(|w| w.text) == Some("in") {
                    let second = self.peek_at(1).unwrap();
                    Some(("not in".to_string(), (word.span.0, second.span.1)))
                } else {
                    None
                }
            }
            "is" => {
                if self.peek_at(1).map(|w| w.text) == Some("not") {
                    let second = self.peek_at(1).unwrap();
                    Some(("is not".to_string(), (word.span.0, second.span.1)))
                } else {
                    Some(("is".to_string(), word.span))
                }
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tmpl_lexer::words::split_words;

    fn cond(content: &str) -> Result<BoolExpr, ParseError> {
        let words = split_words(content, 6);
        parse_condition(words, (0, content.len() + 9))
    }

    #[test]
    fn simple_atom() {
        let expr = cond("foo").unwrap();
        assert!(matches!(expr, BoolExpr::Atom(_)));
    }

    #[test]
    fn and_or_precedence() {
        // `a or b and c` should parse as `a or (b and c)`.
        let expr = cond("a or b and c").unwrap();
        match expr {
            BoolExpr::Or(_, right) => assert!(matches!(*right, BoolExpr::And(_, _))),
            other => panic!("expected Or at top level, got {other:?}"),
        }
    }

    #[test]
    fn not_in_is_a_comparison_operator() {
        let expr = cond("a not in b").unwrap();
        assert!(matches!(expr, BoolExpr::Compare(CompareOp::NotIn, _, _)));
    }

    #[test]
    fn is_not_is_a_comparison_operator() {
        let expr = cond("a is not b").unwrap();
        assert!(matches!(expr, BoolExpr::Compare(CompareOp::IsNot, _, _)));
    }

    #[test]
    fn invalid_and_position() {
        let err = cond("and").unwrap_err();
        assert_eq!(err.to_string(), "Not expecting 'and' in this position");
        assert_eq!(err.span(), (6, 9));
    }

    #[test]
    fn invalid_not_in_position() {
        let err = cond("not in").unwrap_err();
        assert_eq!(err.to_string(), "Not expecting 'not in' in this position");
        assert_eq!(err.span(), (6, 12));
    }

    #[test]
    fn invalid_is_not_position() {
        let err = cond("is not").unwrap_err();
        assert_eq!(err.to_string(), "Not expecting 'is not' in this position");
    }

    #[test]
    fn unexpected_end_after_not() {
        let err = cond("not").unwrap_err();
        assert_eq!(err.to_string(), "Unexpected end of expression");
        assert_eq!(err.span(), (6, 9));
    }

    #[test]
    fn missing_condition_reports_tag_span() {
        let err = parse_condition(vec![], (0, 8)).unwrap_err();
        assert_eq!(err.to_string(), "Missing boolean expression");
        assert_eq!(err.span(), (0, 8));
    }

    #[test]
    fn no_operator_between_atoms() {
        let err = cond("foo bar spam").unwrap_err();
        assert_eq!(err.to_string(), "Unused expression 'bar' in if tag");
        assert_eq!(err.span(), (10, 13));
    }
}
