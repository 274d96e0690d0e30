//! The core filter pipeline (spec.md §4.6): `addslashes`, `center`,
//! `slugify`, `yesno`.
//!
//! Each filter is a plain function rather than a trait object — the
//! registry is the `match` in [`apply`] below, mirroring how
//! `tmpl-parser`'s tag dispatch is a static lookup table rather than a
//! dynamic registry (spec.md §6's `libraries` mechanism is the seam for
//! host-registered filters; these four are the only ones this engine
//! knows about natively).

use thiserror::Error;
use tmpl_ast::Value;
use unicode_normalization::UnicodeNormalization;

/// A filter application that failed for a reason the reference would
/// also reject on (wrong argument type, unknown name). Callers fall
/// back to `string_if_invalid` rather than propagate this (spec.md §7:
/// render-time errors are never raised to the caller).
#[derive(Debug, Clone, Error)]
pub enum FilterError {
    #[error("unknown filter '{0}'")]
    Unknown(String),
    #[error("center filter requires an integer width")]
    InvalidWidth,
}

/// Apply the named filter to `value` with optional resolved argument
/// `arg`. Unknown filter names and argument-type mismatches are
/// returned as `Err` for the caller to substitute `string_if_invalid`,
/// never panicking and never aborting the render.
pub fn apply(name: &str, value: Value, arg: Option<&Value>) -> Result<Value, FilterError> {
    match name {
        "addslashes" => Ok(addslashes(&value)),
        "center" => center(&value, arg),
        "slugify" => Ok(slugify(&value)),
        "yesno" => Ok(yesno(&value, arg)),
        other => Err(FilterError::Unknown(other.to_string())),
    }
}

/// Escape `\`, `'` and `"` by prefixing each with a backslash. A single
/// left-to-right pass over the *input* characters (not a re-scan of the
/// growing output) is what makes this non-idempotent: re-running it
/// over its own output doubles every inserted backslash again. Does not
/// set the safe bit; the input's safe bit (if any) passes through
/// untouched (spec.md §4.6).
fn addslashes(value: &Value) -> Value {
    let text = value.to_text();
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '\\' || c == '\'' || c == '"' {
            out.push('\\');
        }
        out.push(c);
    }
    match value {
        Value::Str(_, safe) => Value::Str(out.into(), *safe),
        _ => Value::str(out),
    }
}

/// Centre `value`'s text in a field of `width` columns, padding with
/// spaces. Matches CPython's `str.center`: when the margin is odd *and*
/// `width` is odd, the extra space goes on the left (the bitwise `&`
/// below is exactly CPython's own `marg & width & 1` test, since ANDing
/// two numbers and then masking the low bit is the same as ANDing their
/// low bits individually).
fn center(value: &Value, arg: Option<&Value>) -> Result<Value, FilterError> {
    let width = width_arg(arg)?;
    let text = value.to_text();
    let len = text.chars().count();
    if len >= width {
        return Ok(Value::str(text));
    }
    let margin = width - len;
    let left = margin / 2 + (margin & width & 1);
    let right = margin - left;

    let mut out = String::with_capacity(width);
    out.extend(std::iter::repeat(' ').take(left));
    out.push_str(&text);
    out.extend(std::iter::repeat(' ').take(right));
    Ok(Value::str(out))
}

fn width_arg(arg: Option<&Value>) -> Result<usize, FilterError> {
    match arg {
        Some(Value::Int(n)) if *n >= 0 => Ok(*n as usize),
        Some(Value::Float(f)) if *f >= 0.0 && f.fract() == 0.0 => Ok(*f as usize),
        Some(Value::Str(s, _)) => s.parse::<usize>().map_err(|_| FilterError::InvalidWidth),
        _ => Err(FilterError::InvalidWidth),
    }
}

/// Slugify per Django's own algorithm (the reference this spec targets
/// carries no separate Rust implementation worth diverging from): NFKD
/// decompose, drop non-ASCII, lowercase, drop anything that isn't a word
/// character/whitespace/hyphen, then collapse whitespace-or-hyphen runs
/// into a single `-` and trim `-`/`_` off both ends. Punctuation like
/// apostrophes is deleted outright in the third step rather than
/// becoming a separator, which is why `l'orée` slugifies to `loree`
/// with no hyphen, while the *space* in `sørensen du bois` does produce
/// one (spec.md §4.6, verified against
/// `examples/original_source/tests/filters/test_slugify.py::test_unicode`).
fn slugify(value: &Value) -> Value {
    let source = value.to_slug_source();
    let ascii_only: String = source.nfkd().filter(char::is_ascii).collect();
    let lowered = ascii_only.to_lowercase();

    let mut kept = String::with_capacity(lowered.len());
    for c in lowered.chars() {
        if c.is_ascii_alphanumeric() || c == '_' || c == '-' || c.is_whitespace() {
            kept.push(c);
        }
    }

    let mut collapsed = String::with_capacity(kept.len());
    let mut in_sep = false;
    for c in kept.chars() {
        if c == '-' || c.is_whitespace() {
            if !in_sep {
                collapsed.push('-');
                in_sep = true;
            }
        } else {
            collapsed.push(c);
            in_sep = false;
        }
    }

    let trimmed = collapsed.trim_matches(|c| c == '-' || c == '_');
    Value::Str(trimmed.into(), true)
}

/// `yesno:"y,n,m"`, defaulting to `"yes,no,maybe"`. A two-part spec
/// falls back to the "no" text for `Null` (spec.md §4.6).
fn yesno(value: &Value, arg: Option<&Value>) -> Value {
    let spec = arg.map(|v| v.to_text()).unwrap_or_else(|| "yes,no,maybe".to_string());
    let parts: Vec<&str> = spec.split(',').collect();
    let yes = parts.first().copied().unwrap_or("yes");
    let no = parts.get(1).copied().unwrap_or("no");

    let chosen = if matches!(value, Value::Null) {
        parts.get(2).copied().unwrap_or(no)
    } else if value.truthy() {
        yes
    } else {
        no
    };
    Value::str(chosen.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    #[test]
    fn addslashes_backslash_is_doubled() {
        let v = apply("addslashes", Value::str(r"\ : backslashes, too"), None).unwrap();
        assert_eq!(v.to_text(), r"\\ : backslashes, too");
    }

    #[test]
    fn addslashes_preserves_safe_bit() {
        let v = apply("addslashes", Value::safe_str("<a>'"), None).unwrap();
        assert!(v.is_safe());
        assert_eq!(v.to_text(), r"<a>\'");
    }

    #[test]
    fn addslashes_is_not_idempotent() {
        let once = apply("addslashes", Value::str(r#"it's"#), None).unwrap();
        let twice = apply("addslashes", once.clone(), None).unwrap();
        assert_ne!(once.to_text(), twice.to_text());
    }

    #[test]
    fn addslashes_stringifies_non_strings() {
        let v = apply("addslashes", Value::Int(123), None).unwrap();
        assert_eq!(v.to_text(), "123");
    }

    #[test]
    fn center_odd_margin_pads_left_first() {
        let v = apply("center", Value::str("Django"), Some(&Value::Int(15))).unwrap();
        assert_eq!(v.to_text(), "     Django    ");
    }

    #[test]
    fn center_even_margin_splits_evenly() {
        let v = apply("center", Value::str("123"), Some(&Value::Int(5))).unwrap();
        assert_eq!(v.to_text(), " 123 ");
    }

    #[test]
    fn center_width_not_wider_than_input_is_unchanged() {
        let v = apply("center", Value::str("hello world"), Some(&Value::Int(3))).unwrap();
        assert_eq!(v.to_text(), "hello world");
    }

    #[test]
    fn center_non_integer_width_errors() {
        assert!(apply("center", Value::str("x"), Some(&Value::str("abc"))).is_err());
    }

    #[test]
    fn slugify_unicode_diacritics() {
        let v = apply("slugify", Value::str("Un éléphant à l'orée du bois"), None).unwrap();
        assert_eq!(v.to_text(), "un-elephant-a-loree-du-bois");
    }

    #[test]
    fn slugify_drops_undecomposable_letters_without_separator() {
        let v = apply("slugify", Value::str("Lærke Sørensen"), None).unwrap();
        assert_eq!(v.to_text(), "lrke-srensen");
    }

    #[test]
    fn slugify_sets_safe_bit() {
        let v = apply("slugify", Value::str("a & b"), None).unwrap();
        assert!(v.is_safe());
        assert_eq!(v.to_text(), "a-b");
    }

    #[test]
    fn slugify_is_idempotent() {
        let once = apply("slugify", Value::str("Hello, World!"), None).unwrap();
        let twice = apply("slugify", once.clone(), None).unwrap();
        assert_eq!(once.to_text(), twice.to_text());
    }

    #[test]
    fn slugify_flattens_sequences_and_mappings() {
        let list = Value::Sequence(Arc::new(vec![Value::str("hello world"), Value::str("muu")]));
        assert_eq!(apply("slugify", list, None).unwrap().to_text(), "hello-world-muu");

        let map = Value::Mapping(Arc::new(vec![(Value::str("key"), Value::str("value"))]));
        assert_eq!(apply("slugify", map, None).unwrap().to_text(), "key-value");
    }

    #[test]
    fn yesno_defaults() {
        assert_eq!(apply("yesno", Value::Bool(true), None).unwrap().to_text(), "yes");
        assert_eq!(apply("yesno", Value::Bool(false), None).unwrap().to_text(), "no");
        assert_eq!(apply("yesno", Value::Null, None).unwrap().to_text(), "maybe");
    }

    #[test]
    fn yesno_two_option_spec_uses_no_text_for_null() {
        let arg = Value::str("yep,nah");
        assert_eq!(apply("yesno", Value::Null, Some(&arg)).unwrap().to_text(), "nah");
    }

    #[test]
    fn yesno_truthiness_drives_choice() {
        let arg = Value::str("yeah,nope,perhaps");
        assert_eq!(apply("yesno", Value::str(""), Some(&arg)).unwrap().to_text(), "nope");
        assert_eq!(apply("yesno", Value::Int(0), Some(&arg)).unwrap().to_text(), "nope");
        assert_eq!(apply("yesno", Value::Int(1), Some(&arg)).unwrap().to_text(), "yeah");
    }

    #[test]
    fn unknown_filter_is_an_error() {
        assert!(matches!(apply("bogus", Value::Null, None), Err(FilterError::Unknown(_))));
    }
}
