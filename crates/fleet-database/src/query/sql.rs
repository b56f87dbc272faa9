//! PostgreSQL statement rendering. Every value is a bind parameter; only
//! whitelisted column names are spliced into the SQL text.

use chrono::{DateTime, Utc};
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use fleet_core::types::{FilterValue, SortSpec, Window};

use super::predicate::Predicate;
use crate::entity::{Deletion, Entity};

/// `SELECT <columns> FROM <table> [WHERE ..] ORDER BY .. [LIMIT ..] [OFFSET ..]`
pub(crate) fn select<T: Entity>(
    predicate: &Predicate,
    window: Option<Window>,
    sort: &[SortSpec],
) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!(
        "SELECT {} FROM {}",
        T::COLUMNS.join(", "),
        T::TABLE
    ));
    push_where(&mut qb, predicate);

    qb.push(" ORDER BY ");
    for spec in sort {
        qb.push(&spec.field)
            .push(" ")
            .push(spec.direction.as_sql())
            .push(", ");
    }
    qb.push(T::PRIMARY_KEY).push(" ASC");

    if let Some(window) = window {
        if let Some(limit) = window.limit_clause() {
            qb.push(" LIMIT ").push_bind(limit);
        }
        if let Some(offset) = window.offset_clause() {
            qb.push(" OFFSET ").push_bind(offset);
        }
    }
    qb
}

/// `SELECT COUNT(*) FROM <table> [WHERE ..]`
pub(crate) fn count<T: Entity>(predicate: &Predicate) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT COUNT(*) FROM {}", T::TABLE));
    push_where(&mut qb, predicate);
    qb
}

/// `INSERT INTO <table> (<columns>) VALUES (..)`
pub(crate) fn insert<T: Entity>(entity: &T) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!(
        "INSERT INTO {} ({}) ",
        T::TABLE,
        T::COLUMNS.join(", ")
    ));
    qb.push_values(std::iter::once(entity), |mut row, e| e.bind_row(&mut row));
    qb
}

/// Insert, or overwrite every non-key column when the key already exists.
pub(crate) fn upsert<T: Entity>(entity: &T) -> QueryBuilder<'static, Postgres> {
    let mut qb = insert(entity);
    qb.push(format!(" ON CONFLICT ({}) DO UPDATE SET ", T::PRIMARY_KEY));
    let mut assignments = qb.separated(", ");
    for column in T::COLUMNS.iter().filter(|c| **c != T::PRIMARY_KEY) {
        assignments.push(format!("{column} = EXCLUDED.{column}"));
    }
    qb
}

/// Hard `DELETE`, or a soft-delete `UPDATE` that leaves already-deleted rows alone.
pub(crate) fn delete<T: Entity>(id: Uuid, now: DateTime<Utc>) -> QueryBuilder<'static, Postgres> {
    match T::DELETION {
        Deletion::Hard => {
            let mut qb = QueryBuilder::new(format!(
                "DELETE FROM {} WHERE {} = ",
                T::TABLE,
                T::PRIMARY_KEY
            ));
            qb.push_bind(id);
            qb
        }
        Deletion::Soft { column } => {
            let mut qb = QueryBuilder::new(format!("UPDATE {} SET {column} = ", T::TABLE));
            qb.push_bind(now)
                .push(format!(" WHERE {} = ", T::PRIMARY_KEY))
                .push_bind(id)
                .push(format!(" AND {column} IS NULL"));
            qb
        }
    }
}

fn push_where(qb: &mut QueryBuilder<'static, Postgres>, predicate: &Predicate) {
    if !predicate.is_always() {
        qb.push(" WHERE ");
        push_predicate(qb, predicate);
    }
}

fn push_predicate(qb: &mut QueryBuilder<'static, Postgres>, predicate: &Predicate) {
    match predicate {
        Predicate::Compare { field, op, value } => {
            qb.push(field).push(" ").push(op.as_sql()).push(" ");
            push_value(qb, value);
        }
        Predicate::In {
            field,
            values,
            negated,
        } => {
            if values.is_empty() {
                qb.push(if *negated { "TRUE" } else { "FALSE" });
                return;
            }
            qb.push(field)
                .push(if *negated { " NOT IN (" } else { " IN (" });
            for (i, value) in values.iter().enumerate() {
                if i > 0 {
                    qb.push(", ");
                }
                push_value(qb, value);
            }
            qb.push(")");
        }
        Predicate::Like {
            field,
            pattern,
            case_insensitive,
        } => {
            qb.push(field)
                .push(if *case_insensitive { " ILIKE " } else { " LIKE " })
                .push_bind(pattern.clone());
        }
        Predicate::Null { field, negated } => {
            qb.push(field)
                .push(if *negated { " IS NOT NULL" } else { " IS NULL" });
        }
        Predicate::And(parts) => push_group(qb, parts, " AND ", "TRUE"),
        Predicate::Or(parts) => push_group(qb, parts, " OR ", "FALSE"),
    }
}

fn push_group(
    qb: &mut QueryBuilder<'static, Postgres>,
    parts: &[Predicate],
    sep: &str,
    empty: &str,
) {
    if parts.is_empty() {
        qb.push(empty);
        return;
    }
    qb.push("(");
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            qb.push(sep);
        }
        push_predicate(qb, part);
    }
    qb.push(")");
}

fn push_value(qb: &mut QueryBuilder<'static, Postgres>, value: &FilterValue) {
    match value {
        FilterValue::Bool(v) => {
            qb.push_bind(*v);
        }
        FilterValue::Integer(v) => {
            qb.push_bind(*v);
        }
        FilterValue::Float(v) => {
            qb.push_bind(*v);
        }
        FilterValue::Date(v) => {
            qb.push_bind(*v);
        }
        FilterValue::Uuid(v) => {
            qb.push_bind(*v);
        }
        FilterValue::String(v) => {
            qb.push_bind(v.clone());
        }
        FilterValue::List(items) => {
            qb.push("(");
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    qb.push(", ");
                }
                push_value(qb, item);
            }
            qb.push(")");
        }
        FilterValue::Null => {
            qb.push("NULL");
        }
    }
}

#[cfg(test)]
mod tests {
    use fleet_core::types::{FilterSpec, Pagination};
    use fleet_entity::{Driver, Vehicle};

    use super::*;
    use crate::query::compile;

    #[test]
    fn test_select_binds_values_and_orders_by_key() {
        let predicate = compile(&FilterSpec::for_company("C1").eq("year", 2020i64));
        let qb = select::<Vehicle>(
            &predicate,
            Some(Pagination::page(2, 5).resolve()),
            &[SortSpec::desc("year")],
        );
        assert_eq!(
            qb.sql(),
            "SELECT id, company_id, plate_number, make, model, year, status, odometer_km, \
             created_at, updated_at FROM vehicles \
             WHERE (year = $1 AND company_id = $2) \
             ORDER BY year DESC, id ASC LIMIT $3 OFFSET $4"
        );
    }

    #[test]
    fn test_zero_offset_is_omitted() {
        let qb = select::<Vehicle>(&Predicate::always(), Some(Pagination::default().resolve()), &[]);
        assert!(qb.sql().ends_with("FROM vehicles ORDER BY id ASC LIMIT $1"));
    }

    #[test]
    fn test_empty_in_lists() {
        let predicate = Predicate::and(vec![
            Predicate::In {
                field: "status".into(),
                values: vec![],
                negated: false,
            },
            Predicate::In {
                field: "make".into(),
                values: vec![],
                negated: true,
            },
        ]);
        let qb = count::<Vehicle>(&predicate);
        assert_eq!(qb.sql(), "SELECT COUNT(*) FROM vehicles WHERE (FALSE AND TRUE)");
    }

    #[test]
    fn test_null_and_search_rendering() {
        let spec = FilterSpec::new()
            .eq("phone", FilterValue::Null)
            .search("ana", ["full_name", "license_number"]);
        let qb = count::<Driver>(&compile(&spec));
        assert_eq!(
            qb.sql(),
            "SELECT COUNT(*) FROM drivers \
             WHERE (phone IS NULL AND (full_name ILIKE $1 OR license_number ILIKE $2))"
        );
    }

    #[test]
    fn test_upsert_updates_every_non_key_column() {
        let vehicle = Vehicle::new("C1", "B 1234 XY", "Toyota", "Hiace", 2021);
        let qb = upsert(&vehicle);
        let sql = qb.sql();
        assert!(sql.starts_with("INSERT INTO vehicles (id, company_id,"));
        assert!(sql.contains("VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"));
        assert!(sql.contains("ON CONFLICT (id) DO UPDATE SET company_id = EXCLUDED.company_id, "));
        assert!(sql.ends_with("updated_at = EXCLUDED.updated_at"));
        assert!(!sql.contains("SET id = "));
    }

    #[test]
    fn test_delete_statements() {
        let id = Uuid::nil();
        let now = Utc::now();
        assert_eq!(
            delete::<Vehicle>(id, now).sql(),
            "DELETE FROM vehicles WHERE id = $1"
        );
        assert_eq!(
            delete::<Driver>(id, now).sql(),
            "UPDATE drivers SET deleted_at = $1 WHERE id = $2 AND deleted_at IS NULL"
        );
    }
}
