//! Builds `FilterExpression`/`VarRef`/`Filter` trees out of the token
//! stream `tmpl_lexer::expr::lex_filter_chain` produces for one word
//! (spec.md §4.2, §4.6).

use crate::error::ParseError;
use tmpl_ast::{Filter, FilterArg, FilterExpression, Segment, Value, VarRef};
use tmpl_lexer::expr::{ExprToken, SpannedExprToken};

/// Parse a single already-isolated word (e.g. `user.name|default:"x"`)
/// into a `FilterExpression`.
pub fn parse_filter_expression(word: &str, base_offset: usize) -> Result<FilterExpression, ParseError> {
    let tokens = tmpl_lexer::expr::lex_filter_chain(word, base_offset)
        .map_err(|_| malformed(word, base_offset))?;
    if tokens.is_empty() {
        return Err(malformed(word, base_offset));
    }

    let mut segments = tokens.split(|t| matches!(t.token, ExprToken::Pipe));
    let var_tokens = segments.next().unwrap_or(&[]);
    let variable = parse_var_ref(var_tokens, word, base_offset)?;

    let mut filters = Vec::new();
    for filter_tokens in segments {
        filters.push(parse_filter(filter_tokens, word, base_offset)?);
    }

    Ok(FilterExpression { variable, filters })
}

fn parse_var_ref(tokens: &[SpannedExprToken], word: &str, base_offset: usize) -> Result<VarRef, ParseError> {
    if tokens.is_empty() {
        return Err(malformed(word, base_offset));
    }
    if tokens.len() == 1 {
        if let Some(value) = literal_value(&tokens[0].token) {
            return Ok(VarRef::Literal(value));
        }
    }
    Ok(VarRef::Lookup(parse_segments(tokens, word, base_offset)?))
}

fn parse_segments(tokens: &[SpannedExprToken], word: &str, base_offset: usize) -> Result<Vec<Segment>, ParseError> {
    let mut segments = Vec::new();
    let mut iter = tokens.iter();
    match iter.next() {
        Some(t) => segments.push(segment_from_token(&t.token, word, base_offset)?),
        None => return Err(malformed(word, base_offset)),
    }
    loop {
        match iter.next() {
            None => break,
            Some(t) if matches!(t.token, ExprToken::Dot) => match iter.next() {
                Some(next) => segments.push(segment_from_token(&next.token, word, base_offset)?),
                None => return Err(malformed(word, base_offset)),
            },
            Some(_) => return Err(malformed(word, base_offset)),
        }
    }
    Ok(segments)
}

fn segment_from_token(token: &ExprToken, word: &str, base_offset: usize) -> Result<Segment, ParseError> {
    match token {
        ExprToken::Ident(name) => Ok(Segment::Name(name.clone())),
        ExprToken::Int(n) => Ok(Segment::Index(*n)),
        _ => Err(malformed(word, base_offset)),
    }
}

fn parse_filter(tokens: &[SpannedExprToken], word: &str, base_offset: usize) -> Result<Filter, ParseError> {
    let mut iter = tokens.iter();
    let (name, name_span) = match iter.next() {
        Some(t) => match &t.token {
            ExprToken::Ident(name) => (name.clone(), t.span),
            _ => return Err(malformed(word, base_offset)),
        },
        None => return Err(malformed(word, base_offset)),
    };

    let rest: Vec<SpannedExprToken> = iter.cloned().collect();
    let (arg, end_span) = if rest.is_empty() {
        (None, name_span)
    } else if matches!(rest[0].token, ExprToken::Colon) {
        let arg_tokens = &rest[1..];
        if arg_tokens.is_empty() {
            return Err(malformed(word, base_offset));
        }
        let last_span = arg_tokens.last().unwrap().span;
        let arg = if arg_tokens.len() == 1 {
            if let Some(value) = literal_value(&arg_tokens[0].token) {
                FilterArg::Literal(value)
            } else {
                FilterArg::Variable(parse_segments(arg_tokens, word, base_offset)?)
            }
        } else {
            FilterArg::Variable(parse_segments(arg_tokens, word, base_offset)?)
        };
        (Some(arg), last_span)
    } else {
        return Err(malformed(word, base_offset));
    };

    Ok(Filter {
        name,
        arg,
        span: (name_span.0, end_span.1).into(),
    })
}

fn literal_value(token: &ExprToken) -> Option<Value> {
    match token {
        ExprToken::Int(n) => Some(Value::Int(*n)),
        ExprToken::Float(f) => Some(Value::Float(*f)),
        ExprToken::Str(s) => Some(Value::str(s.clone())),
        _ => None,
    }
}

fn malformed(word: &str, base_offset: usize) -> ParseError {
    ParseError::InvalidFilterExpression {
        rest: word.to_string(),
        full: word.to_string(),
        at: (base_offset, base_offset + word.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn simple_lookup() {
        let expr = parse_filter_expression("user.name", 0).unwrap();
        assert_eq!(
            expr.variable,
            VarRef::Lookup(vec![Segment::Name("user".into()), Segment::Name("name".into())])
        );
        assert!(expr.filters.is_empty());
    }

    #[test]
    fn literal_root() {
        let expr = parse_filter_expression("42", 0).unwrap();
        assert_eq!(expr.variable, VarRef::Literal(Value::Int(42)));
    }

    #[test]
    fn filter_with_literal_argument() {
        let expr = parse_filter_expression(r#"var|yesno:'yep,nah'"#, 0).unwrap();
        assert_eq!(expr.filters[0].name, "yesno");
        assert_eq!(expr.filters[0].arg, Some(FilterArg::Literal(Value::str("yep,nah"))));
    }

    #[test]
    fn filter_chain_with_variable_argument() {
        let expr = parse_filter_expression("var|default:fallback", 0).unwrap();
        assert_eq!(
            expr.filters[0].arg,
            Some(FilterArg::Variable(vec![Segment::Name("fallback".into())]))
        );
    }

    #[test]
    fn filter_with_no_argument() {
        let expr = parse_filter_expression("var|upper", 0).unwrap();
        assert_eq!(expr.filters[0].arg, None);
    }

    #[test]
    fn index_segment() {
        let expr = parse_filter_expression("items.0", 0).unwrap();
        assert_eq!(
            expr.variable,
            VarRef::Lookup(vec![Segment::Name("items".into()), Segment::Index(0)])
        );
    }
}
