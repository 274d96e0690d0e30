//! Byte-exact diagnostic rendering (spec.md §4.8).
//!
//! Pure function of source + span: no parser state is threaded through
//! here, so a [`Diagnostic`] can be constructed cheaply at error time and
//! formatted lazily, only when its `Display` impl is actually invoked.

use std::fmt;

/// A span-annotated diagnostic, ready to format as the multi-line boxed
/// block the reference renderer produces.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub message: String,
    pub span: (usize, usize),
    pub label: &'static str,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>, span: (usize, usize)) -> Self {
        Self {
            message: message.into(),
            span,
            label: "here",
        }
    }

    pub fn with_label(mut self, label: &'static str) -> Self {
        self.label = label;
        self
    }

    /// Render the full boxed diagnostic block against `source`.
    pub fn render(&self, source: &str) -> String {
        let (line_num, line_text, col) = locate(source, self.span.0);
        let width = span_width(source, self.span.0, self.span.1);
        let digits = digit_width(line_num);

        let mut out = String::new();
        out.push_str(&format!("  × {}\n", self.message));
        out.push_str(&" ".repeat(digits + 2));
        out.push_str("╭────\n");
        out.push_str(&format!(" {} │ {}\n", line_num, line_text));

        let marker_prefix = " ".repeat(digits + 2);
        out.push_str(&marker_prefix);
        out.push('·');
        out.push_str(&" ".repeat(col + 1));
        if width == 0 {
            out.push('▲');
            out.push('\n');
            out.push_str(&marker_prefix);
            out.push_str(&" ".repeat(col + 1));
            out.push_str(&format!("╰── {}\n", self.label));
        } else {
            let tee = width / 2;
            for i in 0..width {
                out.push(if i == tee { '┬' } else { '─' });
            }
            out.push('\n');
            out.push_str(&marker_prefix);
            out.push_str(&" ".repeat(col + 1 + tee));
            out.push_str(&format!("╰── {}\n", self.label));
        }
        out.push_str(&" ".repeat(digits + 2));
        out.push_str("╰────\n");
        out
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // No source available through `Display` alone; callers that need
        // the rendered block use `render`. This impl exists so
        // `Diagnostic` composes with `thiserror`'s `#[error(transparent)]`
        // without forcing every call site to carry the source around.
        write!(f, "{}", self.message)
    }
}

/// Find the 1-based line number, the full text of that line, and the
/// 0-based Unicode-scalar column of byte offset `pos` within it.
fn locate(source: &str, pos: usize) -> (usize, &str, usize) {
    let pos = pos.min(source.len());
    let mut line_start = 0;
    let mut line_num = 1;
    for (i, b) in source.as_bytes()[..pos].iter().enumerate() {
        if *b == b'\n' {
            line_start = i + 1;
            line_num += 1;
        }
    }
    let line_end = source[line_start..]
        .find('\n')
        .map(|rel| line_start + rel)
        .unwrap_or(source.len());
    let line_text = &source[line_start..line_end];
    let col = source[line_start..pos].chars().count();
    (line_num, line_text, col)
}

/// Span width in Unicode scalars (not bytes), clamped to the line.
fn span_width(source: &str, start: usize, end: usize) -> usize {
    let end = end.max(start).min(source.len());
    source[start..end].chars().count()
}

fn digit_width(n: usize) -> usize {
    n.to_string().len()
}
