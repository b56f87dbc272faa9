//! Pagination input and its resolution into an offset/limit window.

use serde::{Deserialize, Serialize};

/// Limit applied when neither `limit` nor `page_size` yields one.
pub const DEFAULT_LIMIT: i64 = 20;

/// Pagination request accepting either page/page-size or offset/limit.
///
/// Explicit `offset`/`limit` win over `page`/`page_size`. See
/// [`Pagination::resolve`] for the exact rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Page number (1-based).
    #[serde(default)]
    pub page: i64,
    /// Number of items per page.
    #[serde(default)]
    pub page_size: i64,
    /// Rows to skip.
    #[serde(default)]
    pub offset: i64,
    /// Maximum rows to return.
    #[serde(default)]
    pub limit: i64,
}

impl Pagination {
    /// Page-based pagination.
    pub fn page(page: i64, page_size: i64) -> Self {
        Self {
            page,
            page_size,
            ..Self::default()
        }
    }

    /// Offset-based pagination.
    pub fn window(offset: i64, limit: i64) -> Self {
        Self {
            offset,
            limit,
            ..Self::default()
        }
    }

    /// Resolve into the effective window.
    ///
    /// 1. If `offset` and `limit` are both zero, derive them from
    ///    `page`/`page_size` when both are positive; otherwise leave them zero.
    /// 2. A resulting `limit` of zero becomes [`DEFAULT_LIMIT`].
    /// 3. A negative `offset` is clamped to zero.
    pub fn resolve(&self) -> Window {
        let (mut offset, mut limit) = (self.offset, self.limit);

        if offset == 0 && limit == 0 && self.page > 0 && self.page_size > 0 {
            offset = (self.page - 1).saturating_mul(self.page_size);
            limit = self.page_size;
        }

        if limit == 0 {
            limit = DEFAULT_LIMIT;
        }

        Window {
            offset: offset.max(0),
            limit,
        }
    }
}

/// Effective offset/limit after resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    /// Rows to skip (never negative).
    pub offset: i64,
    /// Rows to return; applied only when positive.
    pub limit: i64,
}

impl Window {
    /// The `OFFSET` to apply, if any.
    pub fn offset_clause(&self) -> Option<i64> {
        (self.offset > 0).then_some(self.offset)
    }

    /// The `LIMIT` to apply, if any.
    pub fn limit_clause(&self) -> Option<i64> {
        (self.limit > 0).then_some(self.limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_derivation() {
        let w = Pagination::page(2, 10).resolve();
        assert_eq!(w, Window { offset: 10, limit: 10 });
    }

    #[test]
    fn test_all_zero_defaults_limit() {
        let w = Pagination::default().resolve();
        assert_eq!(w, Window { offset: 0, limit: 20 });
        assert_eq!(w.offset_clause(), None);
        assert_eq!(w.limit_clause(), Some(20));
    }

    #[test]
    fn test_explicit_window_beats_page() {
        let p = Pagination {
            page: 5,
            page_size: 50,
            offset: 3,
            limit: 7,
        };
        assert_eq!(p.resolve(), Window { offset: 3, limit: 7 });
    }

    #[test]
    fn test_offset_only_keeps_offset_and_defaults_limit() {
        let w = Pagination::window(40, 0).resolve();
        assert_eq!(w, Window { offset: 40, limit: 20 });
    }

    #[test]
    fn test_page_without_size_is_ignored() {
        let w = Pagination::page(3, 0).resolve();
        assert_eq!(w, Window { offset: 0, limit: 20 });
    }

    #[test]
    fn test_negative_offset_clamped() {
        let w = Pagination::window(-5, 10).resolve();
        assert_eq!(w.offset, 0);
        assert_eq!(w.offset_clause(), None);
    }

    #[test]
    fn test_negative_limit_not_applied() {
        let w = Pagination::window(0, -1).resolve();
        assert_eq!(w.limit_clause(), None);
    }
}
