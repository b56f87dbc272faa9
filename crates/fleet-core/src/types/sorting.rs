//! Ordering of list results.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// One `ORDER BY` term. The column is checked against the entity's columns
/// when the query runs, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Asc)
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Desc)
    }

    /// Parse a comma-separated list such as `-issued_at,invoice_number`.
    pub fn parse_list(raw: &str) -> Result<Vec<Self>, AppError> {
        raw.split(',')
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(str::parse::<SortSpec>)
            .collect()
    }
}

/// `field`, `-field`, `field:asc` or `field:desc`.
impl FromStr for SortSpec {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        let (field, direction) = match raw.split_once(':') {
            Some((field, dir)) if dir.eq_ignore_ascii_case("asc") => (field, SortDirection::Asc),
            Some((field, dir)) if dir.eq_ignore_ascii_case("desc") => (field, SortDirection::Desc),
            Some((_, dir)) => {
                return Err(AppError::validation(format!(
                    "sort '{raw}': unknown direction '{dir}'"
                )));
            }
            None => match raw.strip_prefix('-') {
                Some(field) => (field, SortDirection::Desc),
                None => (raw, SortDirection::Asc),
            },
        };
        if field.is_empty() {
            return Err(AppError::validation(format!("sort '{raw}': missing field")));
        }
        Ok(Self::new(field, direction))
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            SortDirection::Asc => write!(f, "{}", self.field),
            SortDirection::Desc => write!(f, "-{}", self.field),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_parse_list() {
        let specs = SortSpec::parse_list("-issued_at, invoice_number,status:DESC").unwrap();
        assert_eq!(
            specs,
            vec![
                SortSpec::desc("issued_at"),
                SortSpec::asc("invoice_number"),
                SortSpec::desc("status"),
            ]
        );
        assert!(SortSpec::parse_list("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_malformed_terms() {
        for raw in ["-", "status:sideways", ":asc"] {
            let err = raw.parse::<SortSpec>().unwrap_err();
            assert_eq!(err.kind, ErrorKind::Validation, "{raw}");
        }
    }

    #[test]
    fn test_display_round_trips() {
        let spec = SortSpec::desc("due_at");
        assert_eq!(spec.to_string(), "-due_at");
        assert_eq!(spec.to_string().parse::<SortSpec>().unwrap(), spec);
    }
}
