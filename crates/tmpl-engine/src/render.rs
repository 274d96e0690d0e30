//! Tree-walking renderer (spec.md §4.7) and the `if`-expression /
//! filter-chain evaluators it relies on.
//!
//! Render-time failures (a failed lookup, a filter rejecting its
//! argument) never abort rendering (spec.md §7): [`eval_filter_expression`]
//! always produces a `Value`, substituting `string_if_invalid` on any
//! failure, so `if`-branches built from those expressions see a falsey
//! value exactly as the reference's permissive rendering does.

use std::cmp::Ordering;

use tmpl_ast::{BoolExpr, CompareOp, FilterArg, FilterExpression, Node, NodeKind, TagKind, VarRef, Value};

use crate::context::RenderContext;
use crate::escape::escape_html_into;
use crate::filters;

pub fn render_nodes(nodes: &[Node], ctx: &mut RenderContext, out: &mut String) {
    for node in nodes {
        render_node(node, ctx, out);
    }
}

fn render_node(node: &Node, ctx: &mut RenderContext, out: &mut String) {
    match &node.kind {
        NodeKind::Text(text) => out.push_str(text),
        NodeKind::Variable(expr) => render_variable(expr, ctx, out),
        NodeKind::Tag(tag) => render_tag(tag, ctx, out),
    }
}

/// spec.md §4.7: write the stringified value verbatim if it is safe or
/// autoescape is off for the current scope; otherwise HTML-escape it.
fn render_variable(expr: &FilterExpression, ctx: &RenderContext, out: &mut String) {
    let value = eval_filter_expression(expr, ctx);
    let text = value.to_text();
    if value.is_safe() || !ctx.autoescape() {
        out.push_str(&text);
    } else {
        escape_html_into(&text, out);
    }
}

fn render_tag(tag: &TagKind, ctx: &mut RenderContext, out: &mut String) {
    match tag {
        TagKind::Autoescape { on, body } => {
            ctx.push_autoescape(*on);
            render_nodes(body, ctx, out);
            ctx.pop_autoescape();
        }
        TagKind::If { branches, else_body } => {
            for (condition, body) in branches {
                if eval_bool_expr(condition, ctx).truthy() {
                    render_nodes(body, ctx, out);
                    return;
                }
            }
            if let Some(body) = else_body {
                render_nodes(body, ctx, out);
            }
        }
    }
}

/// Resolve a variable/filter chain to its final `Value` (spec.md §4.6).
/// A failed root lookup or a filter that rejects its argument both
/// fall back to `string_if_invalid` rather than raising.
pub fn eval_filter_expression(expr: &FilterExpression, ctx: &RenderContext) -> Value {
    let mut value = match &expr.variable {
        VarRef::Literal(v) => v.clone(),
        VarRef::Lookup(segments) => ctx.lookup(segments).unwrap_or_else(|| ctx.string_if_invalid()),
    };

    for filter in &expr.filters {
        let arg = filter.arg.as_ref().map(|arg| match arg {
            FilterArg::Literal(v) => v.clone(),
            FilterArg::Variable(segments) => ctx.lookup(segments).unwrap_or(Value::Null),
        });
        value = match filters::apply(&filter.name, value, arg.as_ref()) {
            Ok(v) => v,
            Err(_) => ctx.string_if_invalid(),
        };
    }

    value
}

/// Evaluate the `if`-tag boolean sub-language (spec.md §4.5). Returns a
/// `Value` rather than a plain `bool` so a bare `{% if var %}` atom's
/// truthiness follows the same table `.truthy()` defines everywhere
/// else; callers that need a `bool` call `.truthy()` on the result.
fn eval_bool_expr(expr: &BoolExpr, ctx: &RenderContext) -> Value {
    match expr {
        BoolExpr::Or(l, r) => Value::Bool(eval_bool_expr(l, ctx).truthy() || eval_bool_expr(r, ctx).truthy()),
        BoolExpr::And(l, r) => Value::Bool(eval_bool_expr(l, ctx).truthy() && eval_bool_expr(r, ctx).truthy()),
        BoolExpr::Not(e) => Value::Bool(!eval_bool_expr(e, ctx).truthy()),
        BoolExpr::Compare(op, l, r) => Value::Bool(eval_compare(*op, l, r, ctx)),
        BoolExpr::Atom(expr) => eval_filter_expression(expr, ctx),
    }
}

fn eval_compare(op: CompareOp, left: &BoolExpr, right: &BoolExpr, ctx: &RenderContext) -> bool {
    let lv = eval_bool_expr(left, ctx);
    let rv = eval_bool_expr(right, ctx);
    match op {
        CompareOp::Eq => lv.loose_eq(&rv),
        CompareOp::Neq => !lv.loose_eq(&rv),
        CompareOp::Lt => lv.loose_cmp(&rv) == Some(Ordering::Less),
        CompareOp::Gt => lv.loose_cmp(&rv) == Some(Ordering::Greater),
        CompareOp::Lte => matches!(lv.loose_cmp(&rv), Some(Ordering::Less | Ordering::Equal)),
        CompareOp::Gte => matches!(lv.loose_cmp(&rv), Some(Ordering::Greater | Ordering::Equal)),
        CompareOp::In => lv.is_in(&rv),
        CompareOp::NotIn => !lv.is_in(&rv),
        CompareOp::Is => lv.is_identical(&rv),
        CompareOp::IsNot => !lv.is_identical(&rv),
    }
}
