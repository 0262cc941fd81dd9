//! Schema Differ
//!
//! Aligns the tables and columns of two introspected schemas and classifies
//! every table and column as matching, differing, or present on one side only.
//!
//! Rules:
//! 1. Tables are keyed by `schema.table`; output is sorted by key
//! 2. A table on one side only gets no column-level diff
//! 3. Columns are compared on raw `data_type` and `is_nullable` only
//! 4. A table matches iff every one of its columns matches

use crate::schema::introspect::{SchemaColumn, SchemaInfo, SchemaTable};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DiffStatus {
    Match,
    Diff,
    LeftOnly,
    RightOnly,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ColumnDiffEntry {
    pub name: String,
    pub status: DiffStatus,
    pub left: Option<SchemaColumn>,
    pub right: Option<SchemaColumn>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SchemaDiffEntry {
    /// `"<schema>.<table>"`
    pub table: String,
    pub status: DiffStatus,
    pub columns: Vec<ColumnDiffEntry>,
}

/// Table counts per status
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DiffSummary {
    pub total: usize,
    pub matching: usize,
    pub differing: usize,
    pub left_only: usize,
    pub right_only: usize,
}

impl DiffSummary {
    pub fn is_identical(&self) -> bool {
        self.total == self.matching
    }
}

/// Compare two schemas table by table, column by column
pub fn diff_schemas(left: &SchemaInfo, right: &SchemaInfo) -> Vec<SchemaDiffEntry> {
    diff_tables(&left.tables, &right.tables)
}

pub fn diff_tables(left: &[SchemaTable], right: &[SchemaTable]) -> Vec<SchemaDiffEntry> {
    let left_map: HashMap<String, &SchemaTable> = left.iter().map(|t| (t.key(), t)).collect();
    let right_map: HashMap<String, &SchemaTable> = right.iter().map(|t| (t.key(), t)).collect();

    let keys: BTreeSet<&str> = left_map
        .keys()
        .chain(right_map.keys())
        .map(String::as_str)
        .collect();

    keys.into_iter()
        .map(|key| match (left_map.get(key), right_map.get(key)) {
            (Some(l), Some(r)) => {
                let columns = diff_columns(&l.columns, &r.columns);
                let status = if columns.iter().all(|c| c.status == DiffStatus::Match) {
                    DiffStatus::Match
                } else {
                    DiffStatus::Diff
                };
                SchemaDiffEntry {
                    table: key.to_string(),
                    status,
                    columns,
                }
            }
            (Some(_), None) => SchemaDiffEntry {
                table: key.to_string(),
                status: DiffStatus::LeftOnly,
                columns: Vec::new(),
            },
            (None, _) => SchemaDiffEntry {
                table: key.to_string(),
                status: DiffStatus::RightOnly,
                columns: Vec::new(),
            },
        })
        .collect()
}

/// Column union keeps left order first, then right-only columns in right order
fn diff_columns(left: &[SchemaColumn], right: &[SchemaColumn]) -> Vec<ColumnDiffEntry> {
    let left_map: HashMap<&str, &SchemaColumn> = left.iter().map(|c| (c.name.as_str(), c)).collect();
    let right_map: HashMap<&str, &SchemaColumn> =
        right.iter().map(|c| (c.name.as_str(), c)).collect();

    let mut names: Vec<&str> = Vec::with_capacity(left.len().max(right.len()));
    for column in left.iter().chain(right.iter()) {
        if !names.contains(&column.name.as_str()) {
            names.push(column.name.as_str());
        }
    }

    names
        .into_iter()
        .map(|name| {
            let l = left_map.get(name).copied();
            let r = right_map.get(name).copied();
            let status = match (l, r) {
                (Some(l), Some(r)) => {
                    if columns_match(l, r) {
                        DiffStatus::Match
                    } else {
                        DiffStatus::Diff
                    }
                }
                (Some(_), None) => DiffStatus::LeftOnly,
                (None, _) => DiffStatus::RightOnly,
            };
            ColumnDiffEntry {
                name: name.to_string(),
                status,
                left: l.cloned(),
                right: r.cloned(),
            }
        })
        .collect()
}

/// Type strings are compared verbatim: `integer` and `int4` do not match
fn columns_match(left: &SchemaColumn, right: &SchemaColumn) -> bool {
    left.data_type == right.data_type && left.is_nullable == right.is_nullable
}

pub fn summarize(diff: &[SchemaDiffEntry]) -> DiffSummary {
    let mut summary = DiffSummary {
        total: diff.len(),
        ..DiffSummary::default()
    };

    for entry in diff {
        match entry.status {
            DiffStatus::Match => summary.matching += 1,
            DiffStatus::Diff => summary.differing += 1,
            DiffStatus::LeftOnly => summary.left_only += 1,
            DiffStatus::RightOnly => summary.right_only += 1,
        }
    }

    summary
}

/// Format a diff as a readable report. Matching tables are listed by count only.
pub fn format_report(left_name: &str, right_name: &str, diff: &[SchemaDiffEntry]) -> String {
    let summary = summarize(diff);
    let mut output = String::new();

    output.push_str("═══════════════════════════════════════════════════════════════\n");
    output.push_str(&format!("  SCHEMA DIFF: {} vs {}\n", left_name, right_name));
    output.push_str("═══════════════════════════════════════════════════════════════\n\n");

    if summary.is_identical() {
        output.push_str(&format!(
            "No differences across {} tables.\n",
            summary.total
        ));
        return output;
    }

    for entry in diff {
        match entry.status {
            DiffStatus::Match => {}
            DiffStatus::LeftOnly => {
                output.push_str(&format!("  - {} (only on {})\n", entry.table, left_name));
            }
            DiffStatus::RightOnly => {
                output.push_str(&format!("  + {} (only on {})\n", entry.table, right_name));
            }
            DiffStatus::Diff => {
                output.push_str(&format!("  ~ {}\n", entry.table));
                for column in entry.columns.iter().filter(|c| c.status != DiffStatus::Match) {
                    output.push_str(&format_column(column, left_name, right_name));
                }
            }
        }
    }

    output.push_str("\n───────────────────────────────────────────────────────────────\n");
    output.push_str(&format!(
        "Tables: {} match, {} differ, {} only on {}, {} only on {}\n",
        summary.matching,
        summary.differing,
        summary.left_only,
        left_name,
        summary.right_only,
        right_name
    ));

    output
}

fn format_column(column: &ColumnDiffEntry, left_name: &str, right_name: &str) -> String {
    match (&column.left, &column.right) {
        (Some(l), Some(r)) => format!(
            "      {}: {} -> {}\n",
            column.name,
            describe_column(l),
            describe_column(r)
        ),
        (Some(l), None) => format!(
            "      {}: {} (only on {})\n",
            column.name,
            describe_column(l),
            left_name
        ),
        (None, Some(r)) => format!(
            "      {}: {} (only on {})\n",
            column.name,
            describe_column(r),
            right_name
        ),
        (None, None) => String::new(),
    }
}

fn describe_column(column: &SchemaColumn) -> String {
    if column.is_nullable {
        column.data_type.clone()
    } else {
        format!("{} NOT NULL", column.data_type)
    }
}
