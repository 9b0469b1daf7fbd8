// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! In-process backend used for demo mode, the offline fallback and tests.
//!
//! Mirrors the observable rules of the PostgreSQL gateway: typed columns reject
//! unparsable values, blank inputs on defaulted columns take the default (a
//! serial for integer keys), and `replace_rows` is all-or-nothing.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use tracing::debug;

use crate::backend::{KeyMatch, TableBackend, uses_default};
use crate::error::{GridError, GridResult};
use crate::model::{
    CatalogColumn, ColumnDescriptor, DEFAULT_PRIMARY_KEY, Row, SqlType, validate_identifier,
};

type StoredRow = Vec<Option<String>>;

#[derive(Debug, Clone)]
struct MemoryTable {
    columns: Vec<CatalogColumn>,
    primary_key: Option<String>,
    rows: Vec<StoredRow>,
    next_serial: i64,
}

impl MemoryTable {
    fn position(&self, column: &str) -> GridResult<usize> {
        self.columns
            .iter()
            .position(|candidate| candidate.name == column)
            .ok_or_else(|| GridError::Persistence(format!("column \"{column}\" does not exist")))
    }

    fn sql_type(&self, index: usize) -> SqlType {
        SqlType::parse(&self.columns[index].data_type)
    }

    fn is_serial(&self, index: usize) -> bool {
        self.columns[index].has_default && self.sql_type(index).is_integer()
    }

    fn build_row(
        &mut self,
        columns: &[ColumnDescriptor],
        values: &[Option<String>],
    ) -> GridResult<StoredRow> {
        if columns.len() != values.len() {
            return Err(GridError::Shape {
                expected: columns.len(),
                actual: values.len(),
            });
        }

        let mut provided = vec![None; self.columns.len()];
        let mut defaulted = vec![true; self.columns.len()];
        for (descriptor, value) in columns.iter().zip(values) {
            let index = self.position(&descriptor.original_name)?;
            if uses_default(descriptor, value.as_ref()) {
                continue;
            }
            defaulted[index] = false;
            if let Some(value) = value {
                check_value(&self.sql_type(index), value)?;
            }
            provided[index] = value.clone();
        }

        for index in 0..self.columns.len() {
            if !self.is_serial(index) {
                continue;
            }
            if defaulted[index] {
                provided[index] = Some(self.next_serial.to_string());
                self.next_serial += 1;
            } else if let Some(explicit) = provided[index].as_deref()
                && let Ok(explicit) = explicit.trim().parse::<i64>()
            {
                self.next_serial = self.next_serial.max(explicit + 1);
            }
        }
        Ok(provided)
    }

    fn project(&self, row: &StoredRow, columns: &[ColumnDescriptor]) -> GridResult<Row> {
        columns
            .iter()
            .map(|column| {
                let index = self.position(&column.original_name)?;
                Ok(row[index].clone().unwrap_or_default())
            })
            .collect()
    }

    fn matches(&self, row: &StoredRow, index: usize, candidate: Option<&str>) -> bool {
        values_equal(&self.sql_type(index), row[index].as_deref(), candidate)
    }
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
    tables: RefCell<BTreeMap<String, MemoryTable>>,
    offline: Cell<bool>,
    fail_writes: Cell<bool>,
    writes_until_offline: Cell<Option<usize>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_table(&self, name: &str, columns: Vec<CatalogColumn>, primary_key: Option<&str>) {
        self.tables.borrow_mut().insert(
            name.to_owned(),
            MemoryTable {
                columns,
                primary_key: primary_key.map(str::to_owned),
                rows: Vec::new(),
                next_serial: 1,
            },
        );
    }

    /// Inserts one value per catalog column; empty strings are blanks.
    pub fn push_values(&self, table: &str, values: &[&str]) -> GridResult<Row> {
        let mut tables = self.tables.borrow_mut();
        let entry = tables
            .get_mut(table)
            .ok_or_else(|| missing_relation(table))?;
        let descriptors = entry
            .columns
            .iter()
            .map(|column| ColumnDescriptor {
                original_name: column.name.clone(),
                display_name: column.name.clone(),
                sql_type: SqlType::parse(&column.data_type),
                udt_name: column.udt_name.clone(),
                has_default: column.has_default,
            })
            .collect::<Vec<_>>();
        let values = values
            .iter()
            .map(|value| (!value.is_empty()).then(|| (*value).to_owned()))
            .collect::<Vec<_>>();
        let row = entry.build_row(&descriptors, &values)?;
        let projected = entry.project(&row, &descriptors)?;
        entry.rows.push(row);
        Ok(projected)
    }

    /// Every stored row in catalog column order.
    pub fn rows_of(&self, table: &str) -> Vec<Row> {
        self.tables
            .borrow()
            .get(table)
            .map(|entry| {
                entry
                    .rows
                    .iter()
                    .map(|row| row.iter().map(|v| v.clone().unwrap_or_default()).collect())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Deletes rows behind the controller's back.
    pub fn remove_where(&self, table: &str, column: &str, value: &str) -> usize {
        let mut tables = self.tables.borrow_mut();
        let Some(entry) = tables.get_mut(table) else {
            return 0;
        };
        let Ok(index) = entry.position(column) else {
            return 0;
        };
        let before = entry.rows.len();
        let sql_type = entry.sql_type(index);
        entry
            .rows
            .retain(|row| !values_equal(&sql_type, row[index].as_deref(), Some(value)));
        before - entry.rows.len()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.set(offline);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    /// Lets `writes` more writes through, then drops the connection.
    pub fn go_offline_after(&self, writes: usize) {
        self.writes_until_offline.set(Some(writes));
    }

    fn online(&self) -> GridResult<()> {
        if self.offline.get() {
            Err(GridError::Connection("memory backend is offline".to_owned()))
        } else {
            Ok(())
        }
    }

    fn writable(&self) -> GridResult<()> {
        match self.writes_until_offline.get() {
            Some(0) => {
                self.writes_until_offline.set(None);
                self.offline.set(true);
            }
            Some(left) => self.writes_until_offline.set(Some(left - 1)),
            None => {}
        }
        self.online()?;
        if self.fail_writes.get() {
            Err(GridError::Persistence("write rejected".to_owned()))
        } else {
            Ok(())
        }
    }
}

impl TableBackend for MemoryBackend {
    fn ping(&self) -> GridResult<()> {
        self.online()
    }

    fn list_tables(&self) -> GridResult<Vec<String>> {
        self.online()?;
        Ok(self.tables.borrow().keys().cloned().collect())
    }

    fn list_columns(&self, table: &str) -> GridResult<Vec<CatalogColumn>> {
        self.online()?;
        Ok(self
            .tables
            .borrow()
            .get(table)
            .map(|entry| entry.columns.clone())
            .unwrap_or_default())
    }

    fn primary_key(&self, table: &str) -> GridResult<Option<String>> {
        self.online()?;
        Ok(self
            .tables
            .borrow()
            .get(table)
            .and_then(|entry| entry.primary_key.clone()))
    }

    fn load_rows(&self, table: &str, columns: &[ColumnDescriptor]) -> GridResult<Vec<Row>> {
        self.online()?;
        let tables = self.tables.borrow();
        let entry = tables.get(table).ok_or_else(|| missing_relation(table))?;
        entry
            .rows
            .iter()
            .map(|row| entry.project(row, columns))
            .collect()
    }

    fn row_count(&self, table: &str) -> GridResult<u64> {
        self.online()?;
        let tables = self.tables.borrow();
        let entry = tables.get(table).ok_or_else(|| missing_relation(table))?;
        Ok(entry.rows.len() as u64)
    }

    fn count_matching(
        &self,
        table: &str,
        columns: &[ColumnDescriptor],
        values: &[Option<String>],
    ) -> GridResult<u64> {
        self.online()?;
        let tables = self.tables.borrow();
        let entry = tables.get(table).ok_or_else(|| missing_relation(table))?;
        let mut predicates = Vec::new();
        for (column, value) in columns.iter().zip(values) {
            if uses_default(column, value.as_ref()) {
                continue;
            }
            predicates.push((entry.position(&column.original_name)?, value.as_deref()));
        }
        let count = entry
            .rows
            .iter()
            .filter(|row| {
                predicates
                    .iter()
                    .all(|(index, value)| entry.matches(row, *index, *value))
            })
            .count();
        Ok(count as u64)
    }

    fn insert_row(
        &self,
        table: &str,
        columns: &[ColumnDescriptor],
        values: &[Option<String>],
    ) -> GridResult<Row> {
        self.writable()?;
        let mut tables = self.tables.borrow_mut();
        let entry = tables
            .get_mut(table)
            .ok_or_else(|| missing_relation(table))?;
        let row = entry.build_row(columns, values)?;
        let projected = entry.project(&row, columns)?;
        entry.rows.push(row);
        Ok(projected)
    }

    fn delete_by_key(&self, table: &str, key: &KeyMatch) -> GridResult<u64> {
        self.writable()?;
        let mut tables = self.tables.borrow_mut();
        let entry = tables
            .get_mut(table)
            .ok_or_else(|| missing_relation(table))?;
        let index = entry.position(&key.column)?;
        let sql_type = entry.sql_type(index);
        check_value(&sql_type, &key.value)?;
        let before = entry.rows.len();
        entry
            .rows
            .retain(|row| !values_equal(&sql_type, row[index].as_deref(), Some(&key.value)));
        Ok((before - entry.rows.len()) as u64)
    }

    fn replace_rows(
        &self,
        table: &str,
        columns: &[ColumnDescriptor],
        rows: &[Vec<Option<String>>],
    ) -> GridResult<usize> {
        self.writable()?;
        let mut tables = self.tables.borrow_mut();
        let entry = tables
            .get_mut(table)
            .ok_or_else(|| missing_relation(table))?;
        let mut staged = entry.clone();
        staged.rows.clear();
        for values in rows {
            let row = staged.build_row(columns, values)?;
            staged.rows.push(row);
        }
        debug!(table, rows = staged.rows.len(), "replaced table contents");
        *entry = staged;
        Ok(rows.len())
    }

    fn create_table(&self, table: &str, columns: &[String]) -> GridResult<()> {
        self.writable()?;
        validate_identifier(table)?;
        for column in columns {
            validate_identifier(column)?;
        }
        if self.tables.borrow().contains_key(table) {
            return Ok(());
        }
        let mut catalog = vec![CatalogColumn {
            name: DEFAULT_PRIMARY_KEY.to_owned(),
            data_type: "integer".to_owned(),
            udt_name: "int4".to_owned(),
            has_default: true,
        }];
        catalog.extend(columns.iter().map(CatalogColumn::text));
        self.add_table(table, catalog, Some(DEFAULT_PRIMARY_KEY));
        Ok(())
    }

    fn drop_table(&self, table: &str) -> GridResult<()> {
        self.writable()?;
        validate_identifier(table)?;
        self.tables.borrow_mut().remove(table);
        Ok(())
    }
}

fn missing_relation(table: &str) -> GridError {
    GridError::Persistence(format!("relation \"{table}\" does not exist"))
}

fn check_value(sql_type: &SqlType, value: &str) -> GridResult<()> {
    let trimmed = value.trim();
    let valid = if sql_type.is_integer() {
        trimmed.parse::<i64>().is_ok()
    } else if sql_type.is_numeric() {
        trimmed.parse::<f64>().is_ok_and(f64::is_finite)
    } else {
        true
    };
    if valid {
        Ok(())
    } else {
        Err(GridError::Persistence(format!(
            "invalid input syntax for type {}: \"{value}\"",
            sql_type.as_str()
        )))
    }
}

fn values_equal(sql_type: &SqlType, stored: Option<&str>, candidate: Option<&str>) -> bool {
    match (stored, candidate) {
        (None, None) => true,
        (Some(stored), Some(candidate)) if sql_type.is_numeric() => {
            match (stored.trim().parse::<f64>(), candidate.trim().parse::<f64>()) {
                (Ok(left), Ok(right)) => left == right,
                _ => stored == candidate,
            }
        }
        (Some(stored), Some(candidate)) => stored == candidate,
        _ => false,
    }
}
