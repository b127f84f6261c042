//! Compact markdown rendering of a catalog, for prompts and human review.

use std::fmt::Write;

use qgate_core::Catalog;

/// Render the outbound view of `catalog` as markdown. Source table names and
/// row filters are never included.
pub fn render_markdown(catalog: &Catalog) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Catalog: schema `{}`", catalog.safe_schema);
    let _ = writeln!(out);
    let _ = writeln!(out, "Version: `{}`", catalog.schema_version);
    let _ = writeln!(out);

    for entry in &catalog.entries {
        let _ = writeln!(out, "## {}", entry.name);
        if let Some(comment) = &entry.comment {
            let _ = writeln!(out, "{}", comment);
        }
        if !entry.primary_key.is_empty() {
            let _ = writeln!(out, "**Primary key:** `{}`", entry.primary_key.join("`, `"));
        }
        let _ = writeln!(out, "**Columns:**");
        for column in &entry.columns {
            let mut bits = vec![format!("`{}` {}", column.name, column.data_type)];
            if !column.nullable {
                bits.push("NOT NULL".to_string());
            }
            if let Some(rule) = column.rewrite {
                bits.push(format!("redacted ({})", rule));
            }
            if let Some(comment) = &column.comment {
                bits.push(comment.clone());
            }
            let _ = writeln!(out, " - {}", bits.join(" | "));
        }

        if !entry.relationships.is_empty() {
            let _ = writeln!(out, "**References:**");
            for rel in &entry.relationships {
                let _ = writeln!(
                    out,
                    " - `{}` → `{}`(`{}`)",
                    rel.column, rel.references.table, rel.references.column
                );
            }
        }
        let _ = writeln!(out);
    }

    out
}
