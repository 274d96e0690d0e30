//! Tag/expression parser and diagnostics for the template engine.
//!
//! Consumes [`tmpl_lexer`]'s top-level token stream and produces a
//! [`tmpl_ast::Node`] tree (spec.md §4.3–§4.5), plus the span-annotated
//! error type and box-drawing diagnostic renderer (spec.md §4.8) used
//! to report compile failures.

mod bool_expr;
mod diagnostics;
mod error;
mod expr_parse;
mod parser;

pub use diagnostics::Diagnostic;
pub use error::ParseError;
pub use expr_parse::parse_filter_expression;
pub use parser::parse;
