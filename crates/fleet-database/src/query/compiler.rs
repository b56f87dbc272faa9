//! Filter compiler: turns a [`FilterSpec`] into a [`Predicate`].
//!
//! Groups are emitted in a fixed order so equal specs always compile to the
//! same tree: equality, `IN`, `NOT`, `LIKE`, date ranges, free-form
//! conditions, tenant scope, and finally the search group.

use fleet_core::types::{Condition, ConditionOp, FilterSpec, FilterValue};

use super::predicate::{CompareOp, Predicate};

/// Column used for the tenant scope when the entity does not name one.
pub const DEFAULT_TENANT_COLUMN: &str = "company_id";

/// Compile against the default tenant column.
pub fn compile(spec: &FilterSpec) -> Predicate {
    compile_with(spec, DEFAULT_TENANT_COLUMN)
}

/// Compile, scoping by `tenant_column` when the spec carries a company id.
///
/// Never fails; unknown operators were already folded into equality when the
/// spec was parsed. Column names are checked later, against the entity.
pub fn compile_with(spec: &FilterSpec, tenant_column: &str) -> Predicate {
    let mut parts = Vec::new();

    for (field, value) in &spec.where_eq {
        parts.push(equality(field, value, false));
    }

    for (field, values) in &spec.where_in {
        parts.push(Predicate::In {
            field: field.clone(),
            values: values.clone(),
            negated: false,
        });
    }

    for (field, value) in &spec.where_not {
        parts.push(equality(field, value, true));
    }

    for (field, pattern) in &spec.where_like {
        parts.push(Predicate::Like {
            field: field.clone(),
            pattern: pattern.clone(),
            case_insensitive: false,
        });
    }

    for (field, range) in &spec.date_range {
        if let Some(start) = range.start {
            parts.push(Predicate::Compare {
                field: field.clone(),
                op: CompareOp::Gte,
                value: FilterValue::Date(start),
            });
        }
        if let Some(end) = range.end {
            parts.push(Predicate::Compare {
                field: field.clone(),
                op: CompareOp::Lte,
                value: FilterValue::Date(end),
            });
        }
    }

    for condition in &spec.conditions {
        parts.push(compile_condition(condition));
    }

    if let Some(company) = spec.tenant() {
        parts.push(Predicate::eq(tenant_column, company));
    }

    if !spec.search.is_empty() && !spec.search_in.is_empty() {
        let pattern = format!("%{}%", escape_like(&spec.search));
        parts.push(Predicate::Or(
            spec.search_in
                .iter()
                .map(|field| Predicate::Like {
                    field: field.clone(),
                    pattern: pattern.clone(),
                    case_insensitive: true,
                })
                .collect(),
        ));
    }

    Predicate::and(parts)
}

fn compile_condition(condition: &Condition) -> Predicate {
    let field = &condition.field;
    let value = &condition.value;
    match condition.operator {
        ConditionOp::Eq => equality(field, value, false),
        ConditionOp::Ne => equality(field, value, true),
        ConditionOp::Gt => compare(field, CompareOp::Gt, value),
        ConditionOp::Lt => compare(field, CompareOp::Lt, value),
        ConditionOp::Gte => compare(field, CompareOp::Gte, value),
        ConditionOp::Lte => compare(field, CompareOp::Lte, value),
        ConditionOp::In => membership(field, value, false),
        ConditionOp::NotIn => membership(field, value, true),
        ConditionOp::Like => like(field, value, false),
        ConditionOp::ILike => like(field, value, true),
        ConditionOp::IsNull => Predicate::Null {
            field: field.clone(),
            negated: false,
        },
        ConditionOp::IsNotNull => Predicate::Null {
            field: field.clone(),
            negated: true,
        },
    }
}

/// `=` / `!=`, widened to `IN` / `NOT IN` for lists and `IS [NOT] NULL` for null.
fn equality(field: &str, value: &FilterValue, negated: bool) -> Predicate {
    match value {
        FilterValue::List(values) => Predicate::In {
            field: field.to_string(),
            values: values.clone(),
            negated,
        },
        FilterValue::Null => Predicate::Null {
            field: field.to_string(),
            negated,
        },
        other => compare(
            field,
            if negated { CompareOp::Ne } else { CompareOp::Eq },
            other,
        ),
    }
}

fn compare(field: &str, op: CompareOp, value: &FilterValue) -> Predicate {
    Predicate::Compare {
        field: field.to_string(),
        op,
        value: value.clone(),
    }
}

fn membership(field: &str, value: &FilterValue, negated: bool) -> Predicate {
    let values = match value {
        FilterValue::List(values) => values.clone(),
        scalar => vec![scalar.clone()],
    };
    Predicate::In {
        field: field.to_string(),
        values,
        negated,
    }
}

fn like(field: &str, value: &FilterValue, case_insensitive: bool) -> Predicate {
    let pattern = match value {
        FilterValue::String(s) => s.clone(),
        FilterValue::Null => String::new(),
        other => other.to_string(),
    };
    Predicate::Like {
        field: field.to_string(),
        pattern,
        case_insensitive,
    }
}

/// Escape LIKE metacharacters in user search text.
fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
