//! Declarative filter specification for list and count queries.
//!
//! A [`FilterSpec`] describes WHERE-clause intent without touching SQL. The
//! storage layer compiles it into a predicate tree. Maps are `BTreeMap`s so
//! the compiled predicate and any cache signature derived from a spec are
//! deterministic.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::warn;
use uuid::Uuid;

/// A typed filter value.
///
/// Deserialization is untagged: JSON booleans and numbers map to their
/// variants, strings are tried as RFC 3339 timestamps and then UUIDs before
/// falling back to plain text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Integer(i64),
    /// Floating-point number.
    Float(f64),
    /// Timestamp.
    Date(DateTime<Utc>),
    /// UUID.
    Uuid(Uuid),
    /// Text.
    String(String),
    /// A list of values (for `IN` / `NOT IN`).
    List(Vec<FilterValue>),
    /// SQL `NULL`.
    Null,
}

impl FilterValue {
    /// Whether this value is [`FilterValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Date(v) => write!(f, "{}", v.to_rfc3339()),
            Self::Uuid(v) => write!(f, "{v}"),
            Self::String(v) => write!(f, "'{v}'"),
            Self::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
            Self::Null => write!(f, "NULL"),
        }
    }
}

impl From<bool> for FilterValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for FilterValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<i32> for FilterValue {
    fn from(v: i32) -> Self {
        Self::Integer(i64::from(v))
    }
}

impl From<f64> for FilterValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<DateTime<Utc>> for FilterValue {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Date(v)
    }
}

impl From<Uuid> for FilterValue {
    fn from(v: Uuid) -> Self {
        Self::Uuid(v)
    }
}

impl From<String> for FilterValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for FilterValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl<T: Into<FilterValue>> From<Vec<T>> for FilterValue {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

/// Comparison operator of a [`Condition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionOp {
    /// `=`
    Eq,
    /// `!=`
    Ne,
    /// `>`
    Gt,
    /// `<`
    Lt,
    /// `>=`
    Gte,
    /// `<=`
    Lte,
    /// `IN`
    In,
    /// `NOT IN`
    NotIn,
    /// `LIKE`
    Like,
    /// `ILIKE`
    ILike,
    /// `IS NULL`
    IsNull,
    /// `IS NOT NULL`
    IsNotNull,
}

impl ConditionOp {
    /// Parse an operator string; `None` when it is not recognised.
    ///
    /// Matching ignores case and surrounding/repeated whitespace; `<>` is
    /// accepted as an alias for `!=`.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_ascii_uppercase();
        let op = match normalized.as_str() {
            "=" | "==" => Self::Eq,
            "!=" | "<>" => Self::Ne,
            ">" => Self::Gt,
            "<" => Self::Lt,
            ">=" => Self::Gte,
            "<=" => Self::Lte,
            "IN" => Self::In,
            "NOT IN" => Self::NotIn,
            "LIKE" => Self::Like,
            "ILIKE" => Self::ILike,
            "IS NULL" => Self::IsNull,
            "IS NOT NULL" => Self::IsNotNull,
            _ => return None,
        };
        Some(op)
    }

    /// Parse an operator string, falling back to equality for unknown input.
    ///
    /// The fallback is kept for compatibility with existing callers. It is
    /// logged, never reported as an error.
    pub fn parse_lenient(raw: &str) -> Self {
        Self::parse(raw).unwrap_or_else(|| {
            warn!(operator = raw, "Unknown condition operator, falling back to '='");
            Self::Eq
        })
    }

    /// Canonical operator text.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Gte => ">=",
            Self::Lte => "<=",
            Self::In => "IN",
            Self::NotIn => "NOT IN",
            Self::Like => "LIKE",
            Self::ILike => "ILIKE",
            Self::IsNull => "IS NULL",
            Self::IsNotNull => "IS NOT NULL",
        }
    }
}

impl fmt::Display for ConditionOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ConditionOp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ConditionOp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse_lenient(&raw))
    }
}

/// A single `(field, operator, value)` condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Column name.
    pub field: String,
    /// Comparison operator.
    pub operator: ConditionOp,
    /// Right-hand value; ignored for `IS NULL` / `IS NOT NULL`.
    #[serde(default = "null_value")]
    pub value: FilterValue,
}

impl Condition {
    /// Create a condition from an operator string, with lenient parsing.
    pub fn new(field: impl Into<String>, operator: &str, value: impl Into<FilterValue>) -> Self {
        Self {
            field: field.into(),
            operator: ConditionOp::parse_lenient(operator),
            value: value.into(),
        }
    }

    /// Create a condition from a typed operator.
    pub fn with_op(
        field: impl Into<String>,
        operator: ConditionOp,
        value: impl Into<FilterValue>,
    ) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }
}

/// Inclusive timestamp window on one field. Either bound may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// Lower bound (`>=`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,
    /// Upper bound (`<=`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    /// Create a range from optional bounds.
    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }
}

/// Declarative WHERE-clause description.
///
/// All groups are AND-combined; the search group is OR-combined internally.
/// `company_id` is applied only when set. Leaving it out on a tenant-scoped
/// entity is the caller's responsibility unless the repository runs in
/// strict tenant mode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    /// `field = value` (a list value becomes `IN`).
    #[serde(default, rename = "where", skip_serializing_if = "BTreeMap::is_empty")]
    pub where_eq: BTreeMap<String, FilterValue>,
    /// `field IN (values)`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub where_in: BTreeMap<String, Vec<FilterValue>>,
    /// `field != value` (a list value becomes `NOT IN`).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub where_not: BTreeMap<String, FilterValue>,
    /// `field LIKE pattern`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub where_like: BTreeMap<String, String>,
    /// Per-field timestamp windows.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub date_range: BTreeMap<String, DateRange>,
    /// Free-text search term.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub search: String,
    /// Fields searched by `search`, OR-combined.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub search_in: Vec<String>,
    /// Tenant scope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<String>,
    /// Ordered free-form conditions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

impl FilterSpec {
    /// An empty filter (matches everything).
    pub fn new() -> Self {
        Self::default()
    }

    /// A filter scoped to one tenant.
    pub fn for_company(company_id: impl Into<String>) -> Self {
        Self {
            company_id: Some(company_id.into()),
            ..Self::default()
        }
    }

    /// Add an exact-match entry.
    #[must_use]
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.where_eq.insert(field.into(), value.into());
        self
    }

    /// Add an `IN` entry.
    #[must_use]
    pub fn any_of<V: Into<FilterValue>>(
        mut self,
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.where_in
            .insert(field.into(), values.into_iter().map(Into::into).collect());
        self
    }

    /// Add a `NOT` entry.
    #[must_use]
    pub fn not(mut self, field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.where_not.insert(field.into(), value.into());
        self
    }

    /// Add a `LIKE` entry.
    #[must_use]
    pub fn like(mut self, field: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.where_like.insert(field.into(), pattern.into());
        self
    }

    /// Add a timestamp window.
    #[must_use]
    pub fn between(
        mut self,
        field: impl Into<String>,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Self {
        self.date_range
            .insert(field.into(), DateRange::new(start, end));
        self
    }

    /// Set the search term and the fields it applies to.
    #[must_use]
    pub fn search<I, S>(mut self, term: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.search = term.into();
        self.search_in = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Append a condition.
    #[must_use]
    pub fn condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// The tenant scope, treating an empty string as absent.
    pub fn tenant(&self) -> Option<&str> {
        self.company_id.as_deref().filter(|c| !c.is_empty())
    }
}

fn null_value() -> FilterValue {
    FilterValue::Null
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_parse_is_case_and_space_insensitive() {
        assert_eq!(ConditionOp::parse("not   in"), Some(ConditionOp::NotIn));
        assert_eq!(ConditionOp::parse(" is not null "), Some(ConditionOp::IsNotNull));
        assert_eq!(ConditionOp::parse("<>"), Some(ConditionOp::Ne));
        assert_eq!(ConditionOp::parse("ilike"), Some(ConditionOp::ILike));
        assert_eq!(ConditionOp::parse("BOGUS"), None);
    }

    #[test]
    fn test_unknown_operator_falls_back_to_eq() {
        let cond = Condition::new("x", "BOGUS", 5i64);
        assert_eq!(cond.operator, ConditionOp::Eq);
        assert_eq!(cond.value, FilterValue::Integer(5));
    }

    #[test]
    fn test_condition_deserializes_unknown_operator() {
        let cond: Condition =
            serde_json::from_str(r#"{"field":"x","operator":"~~","value":5}"#).expect("parse");
        assert_eq!(cond.operator, ConditionOp::Eq);
    }

    #[test]
    fn test_filter_value_untagged_order() {
        let v: FilterValue = serde_json::from_str("\"2024-03-01T00:00:00Z\"").expect("date");
        assert!(matches!(v, FilterValue::Date(_)));
        let v: FilterValue =
            serde_json::from_str("\"6f1b2c1e-2f4b-4a58-9a51-1f2d3c4b5a69\"").expect("uuid");
        assert!(matches!(v, FilterValue::Uuid(_)));
        let v: FilterValue = serde_json::from_str("\"paid\"").expect("string");
        assert_eq!(v, FilterValue::String("paid".into()));
        let v: FilterValue = serde_json::from_str("[1, 2]").expect("list");
        assert_eq!(v, FilterValue::List(vec![1i64.into(), 2i64.into()]));
        let v: FilterValue = serde_json::from_str("null").expect("null");
        assert!(v.is_null());
    }

    #[test]
    fn test_builder_and_tenant() {
        let spec = FilterSpec::for_company("C1")
            .eq("status", "paid")
            .search("truck", ["plate_number", "model"]);
        assert_eq!(spec.tenant(), Some("C1"));
        assert_eq!(spec.search_in.len(), 2);

        let empty = FilterSpec {
            company_id: Some(String::new()),
            ..FilterSpec::default()
        };
        assert_eq!(empty.tenant(), None);
    }

    #[test]
    fn test_serialization_is_deterministic() {
        let a = FilterSpec::new().eq("b", 1i64).eq("a", 2i64);
        let b = FilterSpec::new().eq("a", 2i64).eq("b", 1i64);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }
}
