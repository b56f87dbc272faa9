//! Backend-neutral predicate tree produced by the filter compiler.

use std::cmp::Ordering;
use std::fmt;

use fleet_core::types::FilterValue;

/// Binary comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Lt,
    Gte,
    Lte,
}

impl CompareOp {
    /// SQL token.
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Gte => ">=",
            Self::Lte => "<=",
        }
    }

    /// Whether `lhs.cmp(rhs) == ordering` satisfies this operator.
    pub fn accepts(self, ordering: Ordering) -> bool {
        match self {
            Self::Eq => ordering == Ordering::Equal,
            Self::Ne => ordering != Ordering::Equal,
            Self::Gt => ordering == Ordering::Greater,
            Self::Lt => ordering == Ordering::Less,
            Self::Gte => ordering != Ordering::Less,
            Self::Lte => ordering != Ordering::Greater,
        }
    }
}

/// A WHERE-clause tree. Values stay typed until rendering, where they become
/// bind parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `field <op> value`
    Compare {
        field: String,
        op: CompareOp,
        value: FilterValue,
    },
    /// `field [NOT] IN (values)`
    In {
        field: String,
        values: Vec<FilterValue>,
        negated: bool,
    },
    /// `field LIKE pattern` or `field ILIKE pattern`
    Like {
        field: String,
        pattern: String,
        case_insensitive: bool,
    },
    /// `field IS [NOT] NULL`
    Null { field: String, negated: bool },
    /// Conjunction; empty means "always true".
    And(Vec<Predicate>),
    /// Disjunction; empty means "always false".
    Or(Vec<Predicate>),
}

impl Predicate {
    /// The predicate that matches every row.
    pub fn always() -> Self {
        Self::And(Vec::new())
    }

    pub fn eq(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::Compare {
            field: field.into(),
            op: CompareOp::Eq,
            value: value.into(),
        }
    }

    pub fn is_null(field: impl Into<String>) -> Self {
        Self::Null {
            field: field.into(),
            negated: false,
        }
    }

    /// Conjunction of `parts`, flattening nested conjunctions. A single part
    /// is returned as-is.
    pub fn and(parts: Vec<Predicate>) -> Self {
        let mut flat = Vec::with_capacity(parts.len());
        for part in parts {
            match part {
                Self::And(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        if flat.len() == 1 {
            flat.remove(0)
        } else {
            Self::And(flat)
        }
    }

    /// Whether this is the empty conjunction.
    pub fn is_always(&self) -> bool {
        matches!(self, Self::And(parts) if parts.is_empty())
    }

    /// Every column name referenced by the tree, in visit order.
    pub fn fields(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    /// Columns matched with LIKE or ILIKE, in visit order.
    pub fn pattern_fields(&self) -> Vec<&str> {
        match self {
            Self::Like { field, .. } => vec![field.as_str()],
            Self::And(parts) | Self::Or(parts) => {
                parts.iter().flat_map(Predicate::pattern_fields).collect()
            }
            _ => Vec::new(),
        }
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Compare { field, .. }
            | Self::In { field, .. }
            | Self::Like { field, .. }
            | Self::Null { field, .. } => out.push(field),
            Self::And(parts) | Self::Or(parts) => {
                for part in parts {
                    part.collect_fields(out);
                }
            }
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compare { field, op, value } => write!(f, "{field} {} {value}", op.as_sql()),
            Self::In {
                field,
                values,
                negated,
            } => {
                let kw = if *negated { "NOT IN" } else { "IN" };
                write!(f, "{field} {kw} {}", FilterValue::List(values.clone()))
            }
            Self::Like {
                field,
                pattern,
                case_insensitive,
            } => {
                let kw = if *case_insensitive { "ILIKE" } else { "LIKE" };
                write!(f, "{field} {kw} '{pattern}'")
            }
            Self::Null { field, negated } => {
                let kw = if *negated { "IS NOT NULL" } else { "IS NULL" };
                write!(f, "{field} {kw}")
            }
            Self::And(parts) => join(f, parts, " AND ", "TRUE"),
            Self::Or(parts) => join(f, parts, " OR ", "FALSE"),
        }
    }
}

fn join(f: &mut fmt::Formatter<'_>, parts: &[Predicate], sep: &str, empty: &str) -> fmt::Result {
    match parts {
        [] => write!(f, "{empty}"),
        [only] => write!(f, "{only}"),
        _ => {
            write!(f, "(")?;
            for (i, part) in parts.iter().enumerate() {
                if i > 0 {
                    write!(f, "{sep}")?;
                }
                write!(f, "{part}")?;
            }
            write!(f, ")")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_and_flattens_and_unwraps_single_part() {
        let inner = Predicate::and(vec![Predicate::eq("a", 1i64), Predicate::eq("b", 2i64)]);
        let outer = Predicate::and(vec![inner, Predicate::is_null("deleted_at")]);
        match &outer {
            Predicate::And(parts) => assert_eq!(parts.len(), 3),
            other => panic!("expected conjunction, got {other}"),
        }

        let single = Predicate::and(vec![Predicate::always(), Predicate::eq("x", 5i64)]);
        assert_eq!(single, Predicate::eq("x", 5i64));
    }

    #[test]
    fn test_display() {
        let p = Predicate::and(vec![
            Predicate::eq("status", "paid"),
            Predicate::Or(vec![
                Predicate::Like {
                    field: "customer_name".into(),
                    pattern: "%acme%".into(),
                    case_insensitive: true,
                },
                Predicate::is_null("notes"),
            ]),
        ]);
        assert_eq!(
            p.to_string(),
            "(status = 'paid' AND (customer_name ILIKE '%acme%' OR notes IS NULL))"
        );
        assert_eq!(Predicate::always().to_string(), "TRUE");
        assert_eq!(Predicate::Or(vec![]).to_string(), "FALSE");
    }

    #[test]
    fn test_fields_lists_every_column() {
        let p = Predicate::and(vec![
            Predicate::eq("a", 1i64),
            Predicate::Or(vec![Predicate::is_null("b"), Predicate::eq("c", true)]),
        ]);
        assert_eq!(p.fields(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_pattern_fields_only_lists_like_columns() {
        let p = Predicate::and(vec![
            Predicate::eq("year", 2020i64),
            Predicate::Or(vec![
                Predicate::Like {
                    field: "make".into(),
                    pattern: "%toy%".into(),
                    case_insensitive: true,
                },
                Predicate::Like {
                    field: "model".into(),
                    pattern: "%toy%".into(),
                    case_insensitive: true,
                },
            ]),
        ]);
        assert_eq!(p.pattern_fields(), vec!["make", "model"]);
        assert!(Predicate::always().pattern_fields().is_empty());
    }

    #[test]
    fn test_compare_op_accepts() {
        assert!(CompareOp::Gte.accepts(Ordering::Equal));
        assert!(CompareOp::Gte.accepts(Ordering::Greater));
        assert!(!CompareOp::Lt.accepts(Ordering::Equal));
        assert!(CompareOp::Ne.accepts(Ordering::Less));
    }
}
