//! Boundary error types (spec.md §6, §7): the three ways a caller of
//! this crate can fail. Render-time failures never reach here — they
//! are swallowed into `string_if_invalid` by [`crate::render`].

use miette::Diagnostic;
use thiserror::Error;

/// A compile-time failure, carrying the fully-formatted diagnostic
/// block (spec.md §4.8) as its `Display`. Constructed from a
/// `tmpl_parser::ParseError` plus the source it was parsed against,
/// since the diagnostic text needs both.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{0}")]
pub struct TemplateSyntaxError(pub String);

impl TemplateSyntaxError {
    pub fn from_parse_error(err: &tmpl_parser::ParseError, source: &str) -> Self {
        Self(err.render(source))
    }
}

/// Every failure mode this crate surfaces at its public boundary
/// (spec.md §6 "Errors surfaced at the boundary").
#[derive(Debug, Error, Diagnostic)]
pub enum EngineError {
    #[error(transparent)]
    Syntax(#[from] TemplateSyntaxError),

    /// No configured loader found `name`; `tried` lists every name
    /// actually attempted, in loader order.
    #[error("Template \"{name}\" does not exist. Tried: {tried:?}")]
    TemplateDoesNotExist { name: String, tried: Vec<String> },

    /// A `libraries` alias failed to resolve at engine construction
    /// (spec.md §6). The message is produced by
    /// [`crate::engine::library_error_message`] and already matches the
    /// reference's exact wording, so it is stored pre-formatted rather
    /// than rebuilt from structured fields.
    #[error("{0}")]
    InvalidTemplateLibrary(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn syntax_error_display_is_the_raw_diagnostic_block() {
        let err = TemplateSyntaxError("  × oops\n".to_string());
        assert_eq!(err.to_string(), "  × oops\n");
    }

    #[test]
    fn does_not_exist_lists_every_loader_tried() {
        let err = EngineError::TemplateDoesNotExist {
            name: "missing.html".to_string(),
            tried: vec!["a.html".to_string(), "b.html".to_string()],
        };
        assert!(err.to_string().contains("missing.html"));
    }
}
