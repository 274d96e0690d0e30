//! The dynamic value model (spec.md §3, §4.5, §4.6).

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// Capability interface for a host-supplied opaque value (spec.md §9).
///
/// `Value::Other` wraps one of these instead of trying to model every
/// type a host application might hand into a template context.
pub trait HostValue: fmt::Debug {
    fn truthy(&self) -> bool {
        true
    }
    fn stringify(&self) -> String;
    fn get_attr(&self, _name: &str) -> Option<Value> {
        None
    }
    fn get_item(&self, _index: &Value) -> Option<Value> {
        None
    }
}

/// A dynamically-typed template value.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// A string plus the "safe" taint bit (spec.md §3, §4.7): when set,
    /// the renderer must not HTML-escape it.
    Str(Arc<str>, bool),
    Sequence(Arc<Vec<Value>>),
    Mapping(Arc<Vec<(Value, Value)>>),
    Other(Arc<dyn HostValue + Send + Sync>),
}

impl Value {
    pub fn str(s: impl Into<Arc<str>>) -> Self {
        Value::Str(s.into(), false)
    }

    pub fn safe_str(s: impl Into<Arc<str>>) -> Self {
        Value::Str(s.into(), true)
    }

    /// Set the safe bit, matching the reference's `mark_safe`. Monotone:
    /// it only ever turns the bit on (spec.md §3 invariant).
    pub fn mark_safe(self) -> Self {
        match self {
            Value::Str(s, _) => Value::Str(s, true),
            other => other,
        }
    }

    pub fn is_safe(&self) -> bool {
        matches!(self, Value::Str(_, true))
    }

    /// spec.md §4.5 truthiness table.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s, _) => !s.is_empty(),
            Value::Sequence(items) => !items.is_empty(),
            Value::Mapping(items) => !items.is_empty(),
            Value::Other(o) => o.truthy(),
        }
    }

    /// Canonical stringification used when rendering `{{ var }}` output
    /// and as the generic fallback for filters that stringify their
    /// input (spec.md §4.6).
    pub fn to_text(&self) -> String {
        match self {
            Value::Null => "None".to_string(),
            Value::Bool(true) => "True".to_string(),
            Value::Bool(false) => "False".to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => format_float(*f),
            Value::Str(s, _) => s.to_string(),
            Value::Sequence(items) => {
                let parts: Vec<String> = items.iter().map(Value::to_text).collect();
                format!("[{}]", parts.join(", "))
            }
            Value::Mapping(items) => {
                let parts: Vec<String> = items
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k.to_text(), v.to_text()))
                    .collect();
                format!("{{{}}}", parts.join(", "))
            }
            Value::Other(o) => o.stringify(),
        }
    }

    /// Flattened text used as input to `slugify` (spec.md §4.6):
    /// sequences and mappings collapse to `-`-joined runs rather than
    /// the bracketed `to_text` form.
    pub fn to_slug_source(&self) -> String {
        match self {
            Value::Sequence(items) => items
                .iter()
                .map(Value::to_slug_source)
                .collect::<Vec<_>>()
                .join("-"),
            Value::Mapping(items) => items
                .iter()
                .flat_map(|(k, v)| [k.to_slug_source(), v.to_slug_source()])
                .collect::<Vec<_>>()
                .join("-"),
            other => other.to_text(),
        }
    }

    /// `==`/`!=` per spec.md §4.5: numeric cross-type compares by value,
    /// `Bool` equals `Int` 0/1, `Str` compares by bytes ignoring the
    /// safe bit, `Null` equals only `Null`, otherwise false.
    pub fn loose_eq(&self, other: &Value) -> bool {
        use Value::*;
        match (self, other) {
            (Null, Null) => true,
            (Null, _) | (_, Null) => false,
            (Bool(a), Bool(b)) => a == b,
            (Bool(a), Int(b)) | (Int(b), Bool(a)) => (*a as i64) == *b,
            (Bool(a), Float(b)) | (Float(b), Bool(a)) => (*a as i64 as f64) == *b,
            (Int(a), Int(b)) => a == b,
            (Float(a), Float(b)) => a == b,
            (Int(a), Float(b)) | (Float(b), Int(a)) => (*a as f64) == *b,
            (Str(a, _), Str(b, _)) => a.as_ref() == b.as_ref(),
            (Sequence(a), Sequence(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.loose_eq(y))
            }
            (Mapping(a), Mapping(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b.iter())
                        .all(|((ak, av), (bk, bv))| ak.loose_eq(bk) && av.loose_eq(bv))
            }
            _ => false,
        }
    }

    /// `<`/`>`/`<=`/`>=` per spec.md §4.5: numeric-to-numeric and
    /// string-to-string only. Any other combination has no ordering
    /// (the caller treats that as a falsey comparison).
    pub fn loose_cmp(&self, other: &Value) -> Option<Ordering> {
        use Value::*;
        match (self, other) {
            (Int(a), Int(b)) => a.partial_cmp(b),
            (Float(a), Float(b)) => a.partial_cmp(b),
            (Int(a), Float(b)) => (*a as f64).partial_cmp(b),
            (Float(a), Int(b)) => a.partial_cmp(&(*b as f64)),
            (Bool(a), Bool(b)) => a.partial_cmp(b),
            (Bool(a), Int(b)) => (*a as i64).partial_cmp(b),
            (Int(a), Bool(b)) => a.partial_cmp(&(*b as i64)),
            (Str(a, _), Str(b, _)) => a.as_ref().partial_cmp(b.as_ref()),
            _ => None,
        }
    }

    /// `in`/`not in` per spec.md §4.5: `self` is the needle, `self`
    /// appears in `haystack` if `haystack` is a `Sequence`/`Mapping`
    /// (keys) containing an equal value, or a `Str` containing `self`
    /// as a substring. Any other haystack type is falsey.
    pub fn is_in(&self, haystack: &Value) -> bool {
        match haystack {
            Value::Sequence(items) => items.iter().any(|item| item.loose_eq(self)),
            Value::Mapping(items) => items.iter().any(|(k, _)| k.loose_eq(self)),
            Value::Str(s, _) => match self {
                Value::Str(needle, _) => s.contains(needle.as_ref()),
                _ => false,
            },
            _ => false,
        }
    }

    /// `is`/`is not` per spec.md §4.5: identity for the `Null`/`True`/
    /// `False` singletons, value identity for other scalars.
    pub fn is_identical(&self, other: &Value) -> bool {
        use Value::*;
        match (self, other) {
            (Null, Null) => true,
            (Bool(a), Bool(b)) => a == b,
            (Int(a), Int(b)) => a == b,
            (Float(a), Float(b)) => a == b,
            (Str(a, _), Str(b, _)) => Arc::ptr_eq(a, b) || a.as_ref() == b.as_ref(),
            _ => false,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.loose_eq(other)
    }
}

fn format_float(f: f64) -> String {
    if f == f.trunc() && f.is_finite() {
        format!("{f:.1}")
    } else {
        let mut s = format!("{f}");
        if !s.contains('.') && !s.contains('e') {
            s.push_str(".0");
        }
        s
    }
}
