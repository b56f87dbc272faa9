//! Predicate evaluation over JSON rows, following SQL semantics: comparisons
//! against NULL are false, and `ORDER BY` places NULLs last ascending and
//! first descending.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

use fleet_core::types::{FilterValue, SortDirection, SortSpec};

use crate::query::Predicate;

pub(crate) type Row = Map<String, Value>;

static NULL: Value = Value::Null;

fn cell<'a>(row: &'a Row, field: &str) -> &'a Value {
    row.get(field).unwrap_or(&NULL)
}

pub(crate) fn matches(row: &Row, predicate: &Predicate) -> bool {
    match predicate {
        Predicate::Compare { field, op, value } => {
            compare(cell(row, field), value).is_some_and(|ord| op.accepts(ord))
        }
        Predicate::In {
            field,
            values,
            negated,
        } => {
            if values.is_empty() {
                return *negated;
            }
            let cell = cell(row, field);
            if cell.is_null() {
                return false;
            }
            let hit = values
                .iter()
                .any(|v| compare(cell, v) == Some(Ordering::Equal));
            hit != *negated
        }
        Predicate::Like {
            field,
            pattern,
            case_insensitive,
        } => match text(cell(row, field)) {
            Some(text) if *case_insensitive => {
                like_match(&text.to_lowercase(), &pattern.to_lowercase())
            }
            Some(text) => like_match(&text, pattern),
            None => false,
        },
        Predicate::Null { field, negated } => cell(row, field).is_null() != *negated,
        Predicate::And(parts) => parts.iter().all(|p| matches(row, p)),
        Predicate::Or(parts) => parts.iter().any(|p| matches(row, p)),
    }
}

/// Only text cells take part in pattern matching.
fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

fn timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

/// Order a stored cell against a filter value. `None` means the comparison
/// is unknown (NULL involved or incompatible types) and never matches.
fn compare(cell: &Value, value: &FilterValue) -> Option<Ordering> {
    match (cell, value) {
        (Value::Null, _) | (_, FilterValue::Null) | (_, FilterValue::List(_)) => None,
        (Value::Bool(a), FilterValue::Bool(b)) => Some(a.cmp(b)),
        (Value::Bool(a), FilterValue::String(b)) => b.parse::<bool>().ok().map(|b| a.cmp(&b)),
        (Value::Number(n), FilterValue::Integer(b)) => match n.as_i64() {
            Some(a) => Some(a.cmp(b)),
            None => n.as_f64()?.partial_cmp(&(*b as f64)),
        },
        (Value::Number(n), FilterValue::Float(b)) => n.as_f64()?.partial_cmp(b),
        (Value::Number(n), FilterValue::String(b)) => {
            n.as_f64()?.partial_cmp(&b.parse::<f64>().ok()?)
        }
        (Value::String(a), FilterValue::String(b)) => Some(a.as_str().cmp(b.as_str())),
        (Value::String(a), FilterValue::Date(b)) => Some(timestamp(a)?.cmp(b)),
        (Value::String(a), FilterValue::Uuid(b)) => Some(Uuid::parse_str(a).ok()?.cmp(b)),
        (Value::String(a), FilterValue::Integer(b)) => {
            a.parse::<f64>().ok()?.partial_cmp(&(*b as f64))
        }
        (Value::String(a), FilterValue::Float(b)) => a.parse::<f64>().ok()?.partial_cmp(b),
        _ => None,
    }
}

/// Ordering between two non-null stored cells of the same column.
fn order_cells(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => x
                .as_f64()
                .partial_cmp(&y.as_f64())
                .unwrap_or(Ordering::Equal),
        },
        (Value::String(x), Value::String(y)) => match (timestamp(x), timestamp(y)) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => x.cmp(y),
        },
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

/// Stable sort by `sort`. Callers pass rows already in primary-key order, so
/// ties keep that order.
pub(crate) fn sort_rows(rows: &mut [&Row], sort: &[SortSpec]) {
    if sort.is_empty() {
        return;
    }
    rows.sort_by(|a, b| {
        for spec in sort {
            let (x, y) = (cell(a, &spec.field), cell(b, &spec.field));
            let ordering = match (x.is_null(), y.is_null()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => order_cells(x, y),
            };
            let ordering = match spec.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

enum Token {
    Any,
    One,
    Literal(char),
}

/// SQL `LIKE`: `%` matches any run, `_` one character, `\` escapes.
pub(crate) fn like_match(text: &str, pattern: &str) -> bool {
    let mut tokens = Vec::new();
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        tokens.push(match c {
            '%' => Token::Any,
            '_' => Token::One,
            '\\' => Token::Literal(chars.next().unwrap_or('\\')),
            other => Token::Literal(other),
        });
    }

    let text: Vec<char> = text.chars().collect();
    let n = text.len();
    // reachable[i]: the tokens so far can consume exactly text[..i]
    let mut reachable = vec![false; n + 1];
    reachable[0] = true;
    for token in &tokens {
        let mut next = vec![false; n + 1];
        match token {
            Token::Any => {
                let mut seen = false;
                for i in 0..=n {
                    seen |= reachable[i];
                    next[i] = seen;
                }
            }
            Token::One => {
                for i in 1..=n {
                    next[i] = reachable[i - 1];
                }
            }
            Token::Literal(c) => {
                for i in 1..=n {
                    next[i] = reachable[i - 1] && text[i - 1] == *c;
                }
            }
        }
        reachable = next;
    }
    reachable[n]
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::query::CompareOp;

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => panic!("row must be an object"),
        }
    }

    #[test]
    fn test_like_match() {
        assert!(like_match("INV-2025-001", "INV-%"));
        assert!(like_match("INV-2025-001", "%-001"));
        assert!(like_match("abc", "a_c"));
        assert!(!like_match("abbc", "a_c"));
        assert!(like_match("", "%"));
        assert!(!like_match("abc", "ab"));
        assert!(like_match("50% off", r"50\% off"));
        assert!(!like_match("50x off", r"50\% off"));
    }

    #[test]
    fn test_null_never_compares() {
        let r = row(json!({ "due_at": null, "amount": 10 }));
        let cmp = |field: &str, op: CompareOp, value: FilterValue| {
            matches(
                &r,
                &Predicate::Compare {
                    field: field.into(),
                    op,
                    value,
                },
            )
        };
        assert!(!cmp("due_at", CompareOp::Eq, FilterValue::String("x".into())));
        assert!(!cmp("due_at", CompareOp::Ne, FilterValue::String("x".into())));
        assert!(!cmp("amount", CompareOp::Eq, FilterValue::Null));
        assert!(cmp("amount", CompareOp::Gte, FilterValue::Integer(10)));
        assert!(cmp("amount", CompareOp::Lt, FilterValue::Float(10.5)));
    }

    #[test]
    fn test_typed_comparisons() {
        let id = Uuid::from_u128(7);
        let r = row(json!({
            "id": id.to_string(),
            "issued_at": "2025-03-01T10:00:00Z",
            "is_active": true,
        }));
        assert!(matches(&r, &Predicate::eq("id", id)));
        assert!(matches(
            &r,
            &Predicate::Compare {
                field: "issued_at".into(),
                op: CompareOp::Gt,
                value: FilterValue::Date(timestamp("2025-02-28T23:59:59+07:00").unwrap()),
            }
        ));
        assert!(matches(&r, &Predicate::eq("is_active", true)));
    }

    #[test]
    fn test_in_and_not_in() {
        let r = row(json!({ "status": "paid", "notes": null }));
        let in_list = |field: &str, negated: bool| Predicate::In {
            field: field.into(),
            values: vec!["paid".into(), "issued".into()],
            negated,
        };
        assert!(matches(&r, &in_list("status", false)));
        assert!(!matches(&r, &in_list("status", true)));
        assert!(!matches(&r, &in_list("notes", true)));
        assert!(matches(
            &r,
            &Predicate::In {
                field: "status".into(),
                values: vec![],
                negated: true,
            }
        ));
    }

    #[test]
    fn test_sort_places_nulls_like_postgres() {
        let a = row(json!({ "due_at": "2025-01-02T00:00:00Z", "n": 1 }));
        let b = row(json!({ "due_at": null, "n": 2 }));
        let c = row(json!({ "due_at": "2025-01-01T00:00:00Z", "n": 3 }));

        let mut rows = vec![&a, &b, &c];
        sort_rows(&mut rows, &[SortSpec::asc("due_at")]);
        let order: Vec<_> = rows.iter().map(|r| r["n"].clone()).collect();
        assert_eq!(order, vec![json!(3), json!(1), json!(2)]);

        sort_rows(&mut rows, &[SortSpec::desc("due_at")]);
        let order: Vec<_> = rows.iter().map(|r| r["n"].clone()).collect();
        assert_eq!(order, vec![json!(2), json!(1), json!(3)]);
    }
}
