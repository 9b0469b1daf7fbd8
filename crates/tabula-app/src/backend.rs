// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::error::GridResult;
use crate::model::{CatalogColumn, ColumnDescriptor, Row};

/// Primary-key predicate for a single-row delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMatch {
    pub column: String,
    pub udt_name: String,
    pub value: String,
}

/// Everything a table controller needs from a database.
///
/// `values` slices are parallel to `columns`; `None` is a blank input. A blank
/// input on a column that has a catalog default is written as `DEFAULT` and
/// takes no part in duplicate matching; any other blank is `NULL`.
pub trait TableBackend {
    fn ping(&self) -> GridResult<()>;

    fn list_tables(&self) -> GridResult<Vec<String>>;

    fn list_columns(&self, table: &str) -> GridResult<Vec<CatalogColumn>>;

    fn primary_key(&self, table: &str) -> GridResult<Option<String>>;

    fn load_rows(&self, table: &str, columns: &[ColumnDescriptor]) -> GridResult<Vec<Row>>;

    fn row_count(&self, table: &str) -> GridResult<u64>;

    fn count_matching(
        &self,
        table: &str,
        columns: &[ColumnDescriptor],
        values: &[Option<String>],
    ) -> GridResult<u64>;

    /// Returns the stored row as the database reports it.
    fn insert_row(
        &self,
        table: &str,
        columns: &[ColumnDescriptor],
        values: &[Option<String>],
    ) -> GridResult<Row>;

    fn delete_by_key(&self, table: &str, key: &KeyMatch) -> GridResult<u64>;

    /// Deletes every row of `table` and inserts `rows`, atomically.
    fn replace_rows(
        &self,
        table: &str,
        columns: &[ColumnDescriptor],
        rows: &[Vec<Option<String>>],
    ) -> GridResult<usize>;

    fn create_table(&self, table: &str, columns: &[String]) -> GridResult<()>;

    fn drop_table(&self, table: &str) -> GridResult<()>;
}

pub fn uses_default(column: &ColumnDescriptor, value: Option<&String>) -> bool {
    value.is_none() && column.has_default
}
