//! Parse-time error type (spec.md §4.3, §4.4, §4.5, §7).
//!
//! Each variant carries the spans needed to render its diagnostic block;
//! the message text and span-to-label mapping live in [`ParseError::diagnostic`]
//! rather than duplicated per variant, since several variants share the
//! "point at a bad token" shape.

use crate::diagnostics::Diagnostic;
use miette::SourceSpan;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("'autoescape' tag missing an 'on' or 'off' argument.")]
    AutoescapeMissingArgument { at: (usize, usize) },

    #[error("'autoescape' argument should be 'on' or 'off'.")]
    AutoescapeInvalidArgument { at: (usize, usize) },

    #[error("'autoescape' tag requires exactly one argument.")]
    AutoescapeExtraArgument { at: (usize, usize) },

    #[error("Unclosed '{tag}' tag. Looking for one of: {expected}")]
    UnclosedTag {
        tag: String,
        expected: String,
        opening: (usize, usize),
    },

    #[error("{tag} tag encountered an unexpected '{found}' tag")]
    UnexpectedTag {
        tag: String,
        found: String,
        at: (usize, usize),
    },

    #[error("Invalid block tag: '{name}'")]
    UnknownTag { name: String, at: (usize, usize) },

    #[error("Not expecting '{token}' in this position")]
    UnexpectedOperator { token: String, at: (usize, usize) },

    #[error("Unexpected end of expression")]
    UnexpectedEndOfExpression { at: (usize, usize) },

    #[error("Missing boolean expression")]
    MissingBooleanExpression { at: (usize, usize) },

    #[error("Unused expression '{token}' in if tag")]
    UnusedExpression { token: String, at: (usize, usize) },

    #[error("if expression nested too deeply")]
    ExpressionTooDeep { at: (usize, usize) },

    #[error("Could not parse the remainder: '{rest}' from '{full}'")]
    InvalidFilterExpression {
        rest: String,
        full: String,
        at: (usize, usize),
    },
}

impl ParseError {
    /// Primary span for this error, as a `(start, end)` byte pair.
    pub fn span(&self) -> (usize, usize) {
        match self {
            ParseError::AutoescapeMissingArgument { at }
            | ParseError::AutoescapeInvalidArgument { at }
            | ParseError::AutoescapeExtraArgument { at }
            | ParseError::UnexpectedTag { at, .. }
            | ParseError::UnknownTag { at, .. }
            | ParseError::UnexpectedOperator { at, .. }
            | ParseError::UnexpectedEndOfExpression { at }
            | ParseError::MissingBooleanExpression { at }
            | ParseError::UnusedExpression { at, .. }
            | ParseError::ExpressionTooDeep { at }
            | ParseError::InvalidFilterExpression { at, .. } => *at,
            ParseError::UnclosedTag { opening, .. } => *opening,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            ParseError::UnclosedTag { .. } => "started here",
            ParseError::UnexpectedEndOfExpression { .. } => "after this",
            _ => "here",
        }
    }

    /// Build the span-annotated diagnostic for rendering.
    pub fn diagnostic(&self) -> Diagnostic {
        Diagnostic::new(self.to_string(), self.span()).with_label(self.label())
    }

    /// Render the formatted, multi-line diagnostic block for `source`.
    /// This is the string `TemplateSyntaxError`'s `Display` ultimately
    /// surfaces (spec.md §4.8, §7).
    pub fn render(&self, source: &str) -> String {
        self.diagnostic().render(source)
    }
}

impl miette::Diagnostic for ParseError {
    fn labels(&self) -> Option<Box<dyn Iterator<Item = miette::LabeledSpan> + '_>> {
        let (start, end) = self.span();
        let span = SourceSpan::new(start.into(), end.saturating_sub(start));
        Some(Box::new(std::iter::once(miette::LabeledSpan::new_with_span(
            Some(self.label().to_string()),
            span,
        ))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn autoescape_missing_argument_message_and_span() {
        let err = ParseError::AutoescapeMissingArgument { at: (14, 14) };
        assert_eq!(err.to_string(), "'autoescape' tag missing an 'on' or 'off' argument.");
        assert_eq!(err.span(), (14, 14));
        assert_eq!(err.label(), "here");
    }

    #[test]
    fn unclosed_tag_uses_started_here_label() {
        let err = ParseError::UnclosedTag {
            tag: "autoescape".into(),
            expected: "endautoescape".into(),
            opening: (0, 21),
        };
        assert_eq!(
            err.to_string(),
            "Unclosed 'autoescape' tag. Looking for one of: endautoescape"
        );
        assert_eq!(err.label(), "started here");
    }

    #[test]
    fn unused_expression_message() {
        let err = ParseError::UnusedExpression {
            token: "bar".into(),
            at: (10, 13),
        };
        assert_eq!(err.to_string(), "Unused expression 'bar' in if tag");
    }
}
