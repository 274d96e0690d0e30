//! `RenderContext` (spec.md §4.7): a scope stack of variables plus an
//! autoescape flag stack. Nothing in this engine's feature set pushes a
//! fresh variable scope (no `for`, no `block`), but the stack shape is
//! kept anyway so the shape matches spec.md §4.7's "context is a stack
//! of scopes; lookups search top-to-bottom" and so `autoescape` nesting
//! composes the same way a loop scope would.

use std::collections::HashMap;
use std::sync::Arc;

use tmpl_ast::{Segment, Value};

pub struct RenderContext {
    scopes: Vec<HashMap<String, Value>>,
    autoescape: Vec<bool>,
    string_if_invalid: Arc<str>,
}

impl RenderContext {
    pub fn new(root: HashMap<String, Value>, autoescape: bool, string_if_invalid: Arc<str>) -> Self {
        Self {
            scopes: vec![root],
            autoescape: vec![autoescape],
            string_if_invalid,
        }
    }

    pub fn autoescape(&self) -> bool {
        *self.autoescape.last().expect("autoescape stack never empties")
    }

    pub fn push_autoescape(&mut self, on: bool) {
        self.autoescape.push(on);
    }

    pub fn pop_autoescape(&mut self) {
        self.autoescape.pop();
    }

    /// The configured substitute for a failed lookup or filter
    /// application (spec.md §7), always an unsafe string.
    pub fn string_if_invalid(&self) -> Value {
        Value::Str(self.string_if_invalid.clone(), false)
    }

    /// Resolve a dotted/indexed lookup path against the current scope
    /// stack (spec.md §4.2, §4.6): the first segment is a scope
    /// variable name, searched top-to-bottom; each subsequent segment
    /// tries mapping-key, then attribute, then integer index against
    /// the value so far, first success wins.
    pub fn lookup(&self, segments: &[Segment]) -> Option<Value> {
        let mut iter = segments.iter();
        let mut current = self.lookup_root(iter.next()?)?;
        for segment in iter {
            current = lookup_step(&current, segment)?;
        }
        Some(current)
    }

    fn lookup_root(&self, segment: &Segment) -> Option<Value> {
        let name = match segment {
            Segment::Name(name) => name.as_str(),
            Segment::Index(_) => return None,
        };
        self.scopes.iter().rev().find_map(|scope| scope.get(name).cloned())
    }
}

fn lookup_step(current: &Value, segment: &Segment) -> Option<Value> {
    if let Value::Mapping(items) = current {
        let key = segment_key(segment);
        if let Some((_, value)) = items.iter().find(|(k, _)| k.loose_eq(&key)) {
            return Some(value.clone());
        }
    }

    if let (Segment::Name(name), Value::Other(obj)) = (segment, current) {
        if let Some(value) = obj.get_attr(name) {
            return Some(value);
        }
    }

    let index = match segment {
        Segment::Index(i) => Some(*i),
        Segment::Name(name) => name.parse::<i64>().ok(),
    };
    if let Some(i) = index {
        match current {
            Value::Sequence(items) if i >= 0 => return items.get(i as usize).cloned(),
            Value::Other(obj) => return obj.get_item(&Value::Int(i)),
            _ => {}
        }
    }

    None
}

fn segment_key(segment: &Segment) -> Value {
    match segment {
        Segment::Name(name) => Value::str(name.clone()),
        Segment::Index(i) => Value::Int(*i),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Arc as StdArc;

    fn ctx(vars: HashMap<String, Value>) -> RenderContext {
        RenderContext::new(vars, true, "".into())
    }

    #[test]
    fn looks_up_a_plain_variable() {
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), Value::str("Lily"));
        let c = ctx(vars);
        assert_eq!(c.lookup(&[Segment::Name("name".into())]), Some(Value::str("Lily")));
    }

    #[test]
    fn dotted_mapping_lookup() {
        let mut vars = HashMap::new();
        vars.insert(
            "user".to_string(),
            Value::Mapping(StdArc::new(vec![(Value::str("name"), Value::str("Lily"))])),
        );
        let c = ctx(vars);
        let segments = [Segment::Name("user".into()), Segment::Name("name".into())];
        assert_eq!(c.lookup(&segments), Some(Value::str("Lily")));
    }

    #[test]
    fn sequence_index_lookup() {
        let mut vars = HashMap::new();
        vars.insert(
            "items".to_string(),
            Value::Sequence(StdArc::new(vec![Value::str("a"), Value::str("b")])),
        );
        let c = ctx(vars);
        let segments = [Segment::Name("items".into()), Segment::Index(1)];
        assert_eq!(c.lookup(&segments), Some(Value::str("b")));
    }

    #[test]
    fn missing_variable_resolves_to_none() {
        let c = ctx(HashMap::new());
        assert_eq!(c.lookup(&[Segment::Name("missing".into())]), None);
    }

    #[test]
    fn autoescape_stack_nests_and_restores() {
        let mut c = ctx(HashMap::new());
        assert!(c.autoescape());
        c.push_autoescape(false);
        assert!(!c.autoescape());
        c.pop_autoescape();
        assert!(c.autoescape());
    }

    /// A host-supplied opaque value (spec.md §9) is consulted via its
    /// capability interface for both attribute and index lookups.
    #[derive(Debug)]
    struct Point {
        x: i64,
        y: i64,
    }

    impl tmpl_ast::HostValue for Point {
        fn stringify(&self) -> String {
            format!("({}, {})", self.x, self.y)
        }

        fn get_attr(&self, name: &str) -> Option<Value> {
            match name {
                "x" => Some(Value::Int(self.x)),
                "y" => Some(Value::Int(self.y)),
                _ => None,
            }
        }

        fn get_item(&self, index: &Value) -> Option<Value> {
            match index {
                Value::Int(0) => Some(Value::Int(self.x)),
                Value::Int(1) => Some(Value::Int(self.y)),
                _ => None,
            }
        }
    }

    #[test]
    fn host_value_attribute_lookup() {
        let mut vars = HashMap::new();
        vars.insert(
            "point".to_string(),
            Value::Other(StdArc::new(Point { x: 1, y: 2 })),
        );
        let c = ctx(vars);
        let segments = [Segment::Name("point".into()), Segment::Name("x".into())];
        assert_eq!(c.lookup(&segments), Some(Value::Int(1)));
    }

    #[test]
    fn host_value_index_lookup_falls_back_after_attribute_miss() {
        let mut vars = HashMap::new();
        vars.insert(
            "point".to_string(),
            Value::Other(StdArc::new(Point { x: 10, y: 20 })),
        );
        let c = ctx(vars);
        let segments = [Segment::Name("point".into()), Segment::Index(1)];
        assert_eq!(c.lookup(&segments), Some(Value::Int(20)));
    }
}
