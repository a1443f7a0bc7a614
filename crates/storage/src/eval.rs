//! Predicate evaluation and row ordering
//!
//! Comparisons follow relational semantics rather than Rust equality:
//! NULL never equals anything (use `Eq NULL` for `IS NULL`), ordering
//! between incomparable kinds is false, and the text operators are
//! case-insensitive like `ILIKE`.

use std::cmp::Ordering;

use authbridge_core::{ComparisonOp, Condition, OrderBy, Predicate, Row, SortDirection, Value};

pub(crate) static NULL: Value = Value::Null;

/// Whether `row` satisfies `filter`. No filter matches every row.
pub(crate) fn matches(filter: Option<&Predicate>, row: &Row) -> bool {
    filter.map_or(true, |p| eval(p, row))
}

fn eval(predicate: &Predicate, row: &Row) -> bool {
    match predicate {
        Predicate::Condition(c) => eval_condition(c, row),
        Predicate::And(children) => children.iter().all(|p| eval(p, row)),
        Predicate::Or(children) => children.iter().any(|p| eval(p, row)),
    }
}

fn eval_condition(condition: &Condition, row: &Row) -> bool {
    let cell = row.get(&condition.field).unwrap_or(&NULL);
    let operand = &condition.value;

    match condition.op {
        ComparisonOp::Eq if operand.is_null() => cell.is_null(),
        ComparisonOp::Eq => sql_eq(cell, operand),
        ComparisonOp::Not if operand.is_null() => !cell.is_null(),
        ComparisonOp::Not => !cell.is_null() && !sql_eq(cell, operand),
        ComparisonOp::Lt => cell.compare(operand) == Some(Ordering::Less),
        ComparisonOp::Lte => matches!(
            cell.compare(operand),
            Some(Ordering::Less | Ordering::Equal)
        ),
        ComparisonOp::Gt => cell.compare(operand) == Some(Ordering::Greater),
        ComparisonOp::Gte => matches!(
            cell.compare(operand),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        ComparisonOp::In => in_set(cell, operand),
        ComparisonOp::NotIn => !cell.is_null() && !in_set(cell, operand),
        ComparisonOp::Contains => text_match(cell, operand, |h, n| h.contains(n)),
        ComparisonOp::StartsWith => text_match(cell, operand, |h, n| h.starts_with(n)),
        ComparisonOp::EndsWith => text_match(cell, operand, |h, n| h.ends_with(n)),
    }
}

/// Relational equality: NULL is never equal, numbers compare across kinds.
pub(crate) fn sql_eq(a: &Value, b: &Value) -> bool {
    if a.is_null() || b.is_null() {
        return false;
    }
    match a.compare(b) {
        Some(ord) => ord == Ordering::Equal,
        None => a == b,
    }
}

fn in_set(cell: &Value, operand: &Value) -> bool {
    match operand {
        Value::Array(items) => items.iter().any(|item| sql_eq(cell, item)),
        // A scalar operand behaves as a one-element set
        other => sql_eq(cell, other),
    }
}

fn text_match(cell: &Value, operand: &Value, f: impl Fn(&str, &str) -> bool) -> bool {
    match (cell.as_str(), operand.as_str()) {
        (Some(haystack), Some(needle)) => f(&haystack.to_lowercase(), &needle.to_lowercase()),
        _ => false,
    }
}

/// Compare two rows by a list of ordering terms.
///
/// NULLs sort last ascending and first descending; incomparable pairs tie.
pub(crate) fn compare_rows(a: &Row, b: &Row, order: &[OrderBy]) -> Ordering {
    for term in order {
        let left = a.get(&term.field).unwrap_or(&NULL);
        let right = b.get(&term.field).unwrap_or(&NULL);
        let ord = match (left.is_null(), right.is_null()) {
            (true, true) => Ordering::Equal,
            // nulls are "larger" than any value
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => left.compare(right).unwrap_or(Ordering::Equal),
        };
        let ord = match term.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}
