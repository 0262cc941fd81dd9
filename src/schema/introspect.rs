//! Schema introspection
//!
//! Reads user tables and their columns from information_schema and joins
//! them client-side into nested table/column structures. information_schema
//! columns use domain types, so every selected column is cast to a base type.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio_postgres::Client;

const TABLES_QUERY: &str = r#"
    SELECT table_schema::text, table_name::text
    FROM information_schema.tables
    WHERE table_schema NOT IN ('information_schema', 'pg_catalog')
        AND table_type = 'BASE TABLE'
    ORDER BY table_schema, table_name
"#;

const COLUMNS_QUERY: &str = r#"
    SELECT table_schema::text, table_name::text, column_name::text, data_type::text,
           is_nullable::text, column_default::text, ordinal_position::int4
    FROM information_schema.columns
    WHERE table_schema NOT IN ('information_schema', 'pg_catalog')
    ORDER BY table_schema, table_name, ordinal_position
"#;

/// Count of user tables, shared with readiness probes
pub const TABLE_COUNT_QUERY: &str = r#"
    SELECT COUNT(*) AS count
    FROM information_schema.tables
    WHERE table_schema NOT IN ('information_schema', 'pg_catalog')
        AND table_type = 'BASE TABLE'
"#;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SchemaColumn {
    pub name: String,
    pub data_type: String,
    pub is_nullable: bool,
    pub column_default: Option<String>,
    pub ordinal_position: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SchemaTable {
    pub schema: String,
    pub name: String,
    pub columns: Vec<SchemaColumn>,
}

impl SchemaTable {
    /// `"<schema>.<table>"`
    pub fn key(&self) -> String {
        table_key(&self.schema, &self.name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SchemaInfo {
    pub tables: Vec<SchemaTable>,
    pub latency_ms: f64,
}

/// Raw row of the columns query, before grouping
#[derive(Debug, Clone)]
pub struct ColumnRow {
    pub table_schema: String,
    pub table_name: String,
    pub column: SchemaColumn,
}

pub fn table_key(schema: &str, table: &str) -> String {
    format!("{}.{}", schema, table)
}

/// Run both introspection queries and assemble the nested result.
///
/// Table order follows the tables query (schema, name); columns keep
/// ordinal order.
pub async fn load_tables(client: &Client) -> Result<Vec<SchemaTable>, tokio_postgres::Error> {
    let table_rows = client.query(TABLES_QUERY, &[]).await?;
    let column_rows = client.query(COLUMNS_QUERY, &[]).await?;

    let tables: Vec<(String, String)> = table_rows
        .iter()
        .map(|row| (row.get(0), row.get(1)))
        .collect();

    let mut columns = Vec::with_capacity(column_rows.len());
    for row in &column_rows {
        let is_nullable: String = row.get(4);
        columns.push(ColumnRow {
            table_schema: row.get(0),
            table_name: row.get(1),
            column: SchemaColumn {
                name: row.get(2),
                data_type: row.get(3),
                is_nullable: is_nullable == "YES",
                column_default: row.get(5),
                ordinal_position: row.get(6),
            },
        });
    }

    Ok(assemble_tables(tables, columns))
}

/// Join column rows onto their tables by `schema.table`.
///
/// Columns whose table is not in `tables` (views, for instance) are dropped;
/// tables without columns get an empty list.
pub fn assemble_tables(tables: Vec<(String, String)>, columns: Vec<ColumnRow>) -> Vec<SchemaTable> {
    let mut columns_by_table: HashMap<String, Vec<SchemaColumn>> = HashMap::new();
    for row in columns {
        columns_by_table
            .entry(table_key(&row.table_schema, &row.table_name))
            .or_default()
            .push(row.column);
    }

    tables
        .into_iter()
        .map(|(schema, name)| {
            let mut columns = columns_by_table
                .remove(&table_key(&schema, &name))
                .unwrap_or_default();
            columns.sort_by_key(|c| c.ordinal_position);
            SchemaTable {
                schema,
                name,
                columns,
            }
        })
        .collect()
}
