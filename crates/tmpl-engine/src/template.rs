//! The `Template` public API (spec.md §6): `from_string`/`render`, plus
//! the `Engine::get_template` constructor that additionally carries a
//! loader `Origin`.

use std::collections::HashMap;
use std::sync::Arc;

use tmpl_ast::{Node, Value};
use tmpl_parser::parse;

use crate::context::RenderContext;
use crate::error::{EngineError, TemplateSyntaxError};
use crate::loader::Origin;
use crate::render::render_nodes;

/// A compiled template (spec.md §3 lifecycle: `Source -> [Token] -> Node
/// tree` happens once, here; rendering against that tree is stateless
/// per call). The source is retained for the template's lifetime so a
/// render-unrelated caller can still format a stored `ParseError`
/// lazily (spec.md §7) — in practice compilation fails fast, but the
/// source is cheap to keep (`Arc<str>`) and several other engines in
/// this corpus keep theirs around for exactly this reason.
pub struct Template {
    source: Arc<str>,
    nodes: Vec<Node>,
    origin: Option<Origin>,
    autoescape: bool,
    string_if_invalid: Arc<str>,
}

impl Template {
    /// Compile `source` directly, with no loader `Origin` attached.
    pub fn from_string(source: impl Into<String>, autoescape: bool, string_if_invalid: impl Into<Arc<str>>) -> Result<Self, EngineError> {
        Self::compile(source.into(), None, autoescape, string_if_invalid.into())
    }

    pub(crate) fn compile(
        source: String,
        origin: Option<Origin>,
        autoescape: bool,
        string_if_invalid: Arc<str>,
    ) -> Result<Self, EngineError> {
        let source: Arc<str> = source.into();
        log::debug!("compiling template ({} bytes)", source.len());
        let nodes = parse(&source).map_err(|err| TemplateSyntaxError::from_parse_error(&err, &source))?;
        Ok(Self {
            source,
            nodes,
            origin,
            autoescape,
            string_if_invalid,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn origin(&self) -> Option<&Origin> {
        self.origin.as_ref()
    }

    /// Render against `vars` and return the produced output
    /// (spec.md §6 `Template.render(context_mapping) -> string`).
    pub fn render(&self, vars: HashMap<String, Value>) -> String {
        let mut ctx = RenderContext::new(vars, self.autoescape, self.string_if_invalid.clone());
        let mut out = String::new();
        render_nodes(&self.nodes, &mut ctx, &mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn round_trip_with_no_variables_or_tags() {
        let template = Template::from_string("hello, world", true, "").unwrap();
        assert_eq!(template.render(HashMap::new()), "hello, world");
    }

    #[test]
    fn compile_error_message_is_the_formatted_diagnostic_block() {
        let err = Template::from_string("{% autoescape %}{{ html }}", true, "").unwrap_err();
        let expected = "\
  × 'autoescape' tag missing an 'on' or 'off' argument.
   ╭────
 1 │ {% autoescape %}{{ html }}
   ·              ▲
   ·              ╰── here
   ╰────
";
        assert_eq!(err.to_string(), expected);
    }

    #[test]
    fn render_substitutes_context_variables() {
        let template = Template::from_string("{{ var|center:5 }}", true, "").unwrap();
        let mut vars = HashMap::new();
        vars.insert("var".to_string(), Value::str("123"));
        assert_eq!(template.render(vars), " 123 ");
    }

    // spec.md §8 property 2: a template with no variables/tags renders to
    // its source unchanged. `{` is excluded from the generated text since
    // it is the only byte that can start a construct.
    proptest::proptest! {
        #[test]
        fn round_trip_property_plain_text_is_unchanged(source in "[^{]{0,200}") {
            let template = Template::from_string(source.clone(), true, "").unwrap();
            proptest::prop_assert_eq!(template.render(HashMap::new()), source);
        }
    }
}
