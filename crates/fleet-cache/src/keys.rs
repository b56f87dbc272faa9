//! Cache key builders for all fleet cache entries.
//!
//! Centralising key construction prevents typos and makes it easy
//! to find every key the application uses. Keys here are logical; the Redis
//! provider adds its configured prefix.

use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use fleet_core::result::AppResult;
use fleet_core::types::{FilterSpec, SortSpec, Window};

/// Tenant segment used when a key is not scoped to a company.
pub const GLOBAL_SEGMENT: &str = "_global";

/// The tenant segment for `tenant`, treating blank as global.
pub fn tenant_segment(tenant: Option<&str>) -> &str {
    match tenant {
        Some(t) if !t.is_empty() => t,
        _ => GLOBAL_SEGMENT,
    }
}

// ── Entity keys ────────────────────────────────────────────

/// Cache key for an entity by ID.
pub fn entity_by_id(entity: &str, id: Uuid) -> String {
    format!("{entity}:{id}")
}

/// Cache key for an entity by natural key, e.g.
/// `invoice:invoice_number:C1:INV-001`.
pub fn entity_by_natural_key(
    entity: &str,
    key_name: &str,
    tenant: Option<&str>,
    value: &str,
) -> String {
    format!("{entity}:{key_name}:{}:{value}", tenant_segment(tenant))
}

/// Pattern matching every key of one entity type.
pub fn entity_pattern(entity: &str) -> String {
    format!("{entity}:*")
}

// ── List keys ──────────────────────────────────────────────

/// Cache key for one list page.
pub fn list(entity: &str, tenant: Option<&str>, signature: &str) -> String {
    format!("{entity}:list:{}:{signature}", tenant_segment(tenant))
}

/// Pattern matching every list page of one tenant.
pub fn list_pattern(entity: &str, tenant: Option<&str>) -> String {
    format!("{entity}:list:{}:*", escape_glob(tenant_segment(tenant)))
}

/// Pattern matching every tenant-scoped key of one entity type: natural
/// keys and list pages.
pub fn tenant_pattern(entity: &str, tenant: &str) -> String {
    format!("{entity}:*:{}:*", escape_glob(tenant))
}

/// Set holding the list keys issued for one tenant (ledger invalidation).
pub fn list_ledger(entity: &str, tenant: Option<&str>) -> String {
    format!("{entity}:ledger:{}", tenant_segment(tenant))
}

#[derive(Serialize)]
struct ListQuery<'a> {
    filter: &'a FilterSpec,
    window: Window,
    sort: &'a [SortSpec],
}

/// Stable hex SHA-256 of a list query. Pagination is hashed after
/// resolution, so `page=2,page_size=5` and `offset=5,limit=5` share a key.
pub fn list_signature(filter: &FilterSpec, window: Window, sort: &[SortSpec]) -> AppResult<String> {
    let canonical = serde_json::to_vec(&ListQuery {
        filter,
        window,
        sort,
    })?;
    Ok(format!("{:x}", Sha256::digest(&canonical)))
}

// ── Derived data keys ──────────────────────────────────────

/// Cache key for the payment instructions of a payment.
pub fn payment_instructions(payment_id: Uuid) -> String {
    format!("payment:instructions:{payment_id}")
}

/// Escape Redis glob metacharacters in a literal key segment.
pub fn escape_glob(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for c in segment.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Redis-style glob match supporting `*`, `?` and `\` escapes.
pub fn glob_match(pattern: &str, key: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let key: Vec<char> = key.chars().collect();
    let (mut p, mut k) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while k < key.len() {
        match pattern.get(p) {
            Some('*') => {
                backtrack = Some((p, k));
                p += 1;
                continue;
            }
            Some('?') => {
                p += 1;
                k += 1;
                continue;
            }
            Some('\\') if pattern.get(p + 1) == Some(&key[k]) => {
                p += 2;
                k += 1;
                continue;
            }
            Some(c) if *c != '\\' && *c == key[k] => {
                p += 1;
                k += 1;
                continue;
            }
            _ => {}
        }
        match backtrack {
            Some((star, matched)) => {
                p = star + 1;
                k = matched + 1;
                backtrack = Some((star, matched + 1));
            }
            None => return false,
        }
    }

    pattern[p..].iter().all(|c| *c == '*')
}

#[cfg(test)]
mod tests {
    use fleet_core::types::Pagination;

    use super::*;

    #[test]
    fn test_entity_keys() {
        let id = Uuid::nil();
        assert_eq!(
            entity_by_id("invoice", id),
            "invoice:00000000-0000-0000-0000-000000000000"
        );
        assert_eq!(
            entity_by_natural_key("payment", "payment_number", Some("C1"), "PAY-9"),
            "payment:payment_number:C1:PAY-9"
        );
        assert_eq!(list_pattern("invoice", None), "invoice:list:_global:*");
        assert_eq!(list_ledger("invoice", Some("")), "invoice:ledger:_global");
        assert_eq!(tenant_pattern("invoice", "C1"), "invoice:*:C1:*");
    }

    #[test]
    fn test_signature_is_stable_and_resolution_aware() {
        let filter = FilterSpec::for_company("C1").eq("status", "paid");
        let a = list_signature(&filter, Pagination::page(2, 5).resolve(), &[]).unwrap();
        let b = list_signature(&filter, Pagination::window(5, 5).resolve(), &[]).unwrap();
        let c = list_signature(&filter, Pagination::page(3, 5).resolve(), &[]).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_glob_match() {
        assert!(glob_match("invoice:list:C1:*", "invoice:list:C1:abc"));
        assert!(!glob_match("invoice:list:C1:*", "invoice:list:C10:abc"));
        assert!(!glob_match("invoice:list:C1:*", "invoice:ledger:C1"));
        assert!(glob_match("inv?ice:*", "invoice:1"));
        assert!(glob_match("*", ""));
        assert!(glob_match("a*b*c", "axxbyyc"));
        assert!(!glob_match("a*b*c", "axxbyy"));
        assert!(glob_match(r"odd\*co:*", "odd*co:1"));
        assert!(!glob_match(r"odd\*co:*", "oddXco:1"));
        assert_eq!(escape_glob("a*b"), r"a\*b");
    }
}
