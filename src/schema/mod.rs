mod diff;
mod introspect;

pub use diff::{
    diff_schemas, diff_tables, format_report, summarize, ColumnDiffEntry, DiffStatus, DiffSummary,
    SchemaDiffEntry,
};
pub use introspect::{
    assemble_tables, load_tables, table_key, ColumnRow, SchemaColumn, SchemaInfo, SchemaTable,
    TABLE_COUNT_QUERY,
};
