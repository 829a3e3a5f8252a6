//! Route condition evaluator

use super::ast::{CompareOp, Expression, Literal};
use serde_json::Value;

/// Resolve a dot-separated path ("database_record.city") in a JSON object
fn lookup<'v>(root: &'v Value, path: &str) -> Option<&'v Value> {
    path.split('.').try_fold(root, |current, part| current.get(part))
}

/// Evaluate a condition against the JSON view of a workflow state
pub fn evaluate(expr: &Expression, view: &Value) -> bool {
    match expr {
        Expression::True => true,
        Expression::False => false,
        Expression::Compare { path, op, value } => compare(lookup(view, path), *op, value),
        Expression::And(left, right) => evaluate(left, view) && evaluate(right, view),
        Expression::Or(left, right) => evaluate(left, view) || evaluate(right, view),
        Expression::Not(inner) => !evaluate(inner, view),
    }
}

fn compare(left: Option<&Value>, op: CompareOp, right: &Literal) -> bool {
    match op {
        CompareOp::Eq => equals(left, right),
        CompareOp::NotEq => !equals(left, right),
        CompareOp::Gt => numeric(left, right, |a, b| a > b),
        CompareOp::Gte => numeric(left, right, |a, b| a >= b),
        CompareOp::Lt => numeric(left, right, |a, b| a < b),
        CompareOp::Lte => numeric(left, right, |a, b| a <= b),
    }
}

fn equals(left: Option<&Value>, right: &Literal) -> bool {
    match (left, right) {
        (None | Some(Value::Null), Literal::Null) => true,
        (Some(Value::String(s)), Literal::String(rs)) => s == rs,
        (Some(Value::Number(n)), Literal::Number(rn)) => n.as_f64() == Some(*rn),
        (Some(Value::Bool(b)), Literal::Boolean(rb)) => b == rb,
        _ => false,
    }
}

/// Ordering comparisons are false unless both sides are numbers
fn numeric(left: Option<&Value>, right: &Literal, cmp: impl Fn(f64, f64) -> bool) -> bool {
    match (left.and_then(Value::as_f64), right) {
        (Some(l), Literal::Number(r)) => cmp(l, *r),
        _ => false,
    }
}
