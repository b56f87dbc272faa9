//! Rendering of command results as tables or JSON.

use serde::Serialize;
use serde_json::Value;
use tabled::{Table, Tabled};

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// JSON output
    Json,
}

/// Rows of a report, one table row each.
pub fn print_list<T: Serialize + Tabled>(rows: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Table if rows.is_empty() => println!("(nothing to report)"),
        OutputFormat::Table => println!("{}", Table::new(rows)),
        OutputFormat::Json => print_json(&rows),
    }
}

/// One row of a flattened document.
#[derive(Debug, Tabled)]
struct Setting {
    key: String,
    value: String,
}

/// A nested document, shown as a `section.key | value` table.
pub fn print_item<T: Serialize>(item: &T, format: OutputFormat) {
    match format {
        OutputFormat::Table => match serde_json::to_value(item) {
            Ok(value) => {
                let mut rows = Vec::new();
                flatten("", &value, &mut rows);
                println!("{}", Table::new(rows));
            }
            Err(e) => print_error(&format!("cannot render output: {e}")),
        },
        OutputFormat::Json => print_json(item),
    }
}

fn print_json<T: Serialize + ?Sized>(item: &T) {
    match serde_json::to_string_pretty(item) {
        Ok(json) => println!("{json}"),
        Err(e) => print_error(&format!("cannot render output: {e}")),
    }
}

/// Objects become dotted paths; every other value is a leaf.
fn flatten(prefix: &str, value: &Value, rows: &mut Vec<Setting>) {
    match value {
        Value::Object(fields) if !fields.is_empty() => {
            for (name, field) in fields {
                let path = if prefix.is_empty() {
                    name.clone()
                } else {
                    format!("{prefix}.{name}")
                };
                flatten(&path, field, rows);
            }
        }
        Value::String(s) => rows.push(Setting {
            key: prefix.to_string(),
            value: s.clone(),
        }),
        other => rows.push(Setting {
            key: prefix.to_string(),
            value: other.to_string(),
        }),
    }
}

pub fn print_success(msg: &str) {
    println!("✓ {msg}");
}

pub fn print_error(msg: &str) {
    eprintln!("✗ {msg}");
}

/// An indented `label: value` line under a success message.
pub fn print_kv(key: &str, value: &str) {
    println!("  {:<24} {value}", format!("{key}:"));
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_flatten_uses_dotted_paths() {
        let doc = json!({
            "database": { "provider": "postgres", "max_connections": 10 },
            "cache": { "ttl": { "entity_seconds": 1800 } },
            "tags": ["a"]
        });
        let mut rows = Vec::new();
        flatten("", &doc, &mut rows);

        let pairs: Vec<(&str, &str)> = rows
            .iter()
            .map(|r| (r.key.as_str(), r.value.as_str()))
            .collect();
        assert!(pairs.contains(&("database.provider", "postgres")));
        assert!(pairs.contains(&("database.max_connections", "10")));
        assert!(pairs.contains(&("cache.ttl.entity_seconds", "1800")));
        assert!(pairs.contains(&("tags", r#"["a"]"#)));
    }
}
