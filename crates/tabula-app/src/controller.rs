// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use crate::backend::{KeyMatch, TableBackend, uses_default};
use crate::error::{GridError, GridResult};
use crate::form::{FormModel, render_form};
use crate::model::{DEFAULT_PRIMARY_KEY, TableDescriptor, validate_identifier};
use crate::rows::RowStore;
use crate::translate::Translations;
use crate::validation::{
    ColumnIssue, is_blank, normalize_decimal, validate_input, validate_inputs,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerPhase {
    Uninitialized,
    StructureLoaded,
    InterfaceBuilt,
    Ready,
    Filtered,
    Reloading,
}

/// Where inserts and deletes land.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EditMode {
    /// Every insert and delete is written to the database at once.
    #[default]
    Direct,
    /// Inserts and deletes change only the grid until `save_all`.
    Staged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteFailure {
    pub row: usize,
    pub reason: String,
}

/// Outcome of a controller operation, phrased for the status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Inserted { row: usize },
    InsertStaged { row: usize },
    NothingToInsert,
    NothingSelected,
    Deleted {
        removed: usize,
        failures: Vec<DeleteFailure>,
    },
    DeleteStaged { removed: usize },
    Filtered {
        visible: usize,
        total: usize,
        skipped: Vec<ColumnIssue>,
    },
    Loaded { rows: usize },
    Reloaded { rows: usize },
    NothingToSave,
    ConfirmOverwrite { existing: u64 },
    Saved { rows: usize },
    TableCreated(String),
    TableDropped(String),
    Refreshed { tables: usize, skipped: usize },
}

impl Notice {
    pub fn message(&self) -> String {
        match self {
            Self::Inserted { row } => format!("record added as row {}", row + 1),
            Self::InsertStaged { row } => {
                format!("record added to the grid as row {}; save to write it", row + 1)
            }
            Self::NothingToInsert => "nothing to add; every field is blank".to_owned(),
            Self::NothingSelected => "no rows selected".to_owned(),
            Self::Deleted { removed, failures } if failures.is_empty() => {
                format!("deleted {removed} row(s)")
            }
            Self::Deleted { removed, failures } => {
                let reasons = failures
                    .iter()
                    .map(|failure| format!("row {}: {}", failure.row + 1, failure.reason))
                    .collect::<Vec<_>>()
                    .join("; ");
                format!(
                    "deleted {removed} row(s), {} failed ({reasons})",
                    failures.len()
                )
            }
            Self::DeleteStaged { removed } => {
                format!("removed {removed} row(s) from the grid; save to write the change")
            }
            Self::Filtered {
                visible,
                total,
                skipped,
            } if skipped.is_empty() => format!("showing {visible} of {total} rows"),
            Self::Filtered {
                visible,
                total,
                skipped,
            } => {
                let ignored = skipped
                    .iter()
                    .map(ColumnIssue::to_string)
                    .collect::<Vec<_>>()
                    .join("; ");
                format!("showing {visible} of {total} rows; ignored {ignored}")
            }
            Self::Loaded { rows } => format!("loaded {rows} row(s)"),
            Self::Reloaded { rows } => format!("reloaded {rows} row(s)"),
            Self::NothingToSave => "nothing to save".to_owned(),
            Self::ConfirmOverwrite { existing } => {
                format!("table already holds {existing} row(s); overwrite?")
            }
            Self::Saved { rows } => format!("saved {rows} row(s)"),
            Self::TableCreated(name) => format!("created table {name}"),
            Self::TableDropped(name) => format!("dropped table {name}"),
            Self::Refreshed { tables, skipped: 0 } => format!("loaded {tables} table(s)"),
            Self::Refreshed { tables, skipped } => {
                format!("loaded {tables} table(s), skipped {skipped}")
            }
        }
    }
}

/// Rows chosen for deletion, waiting for the user to confirm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDelete {
    table: String,
    rows: BTreeSet<usize>,
}

impl PendingDelete {
    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn prompt(&self) -> String {
        format!("delete {} row(s) from {}? (y/n)", self.rows.len(), self.table)
    }
}

/// One editable table: its structure, form, rows and input state.
#[derive(Debug, Clone)]
pub struct TableController {
    table: TableDescriptor,
    form: FormModel,
    store: RowStore,
    visibility: Vec<bool>,
    filter_inputs: Vec<String>,
    append_inputs: Vec<String>,
    filter_active: bool,
    visible: bool,
    edit_mode: EditMode,
    phase: ControllerPhase,
}

impl TableController {
    fn uninitialized(table: TableDescriptor) -> Self {
        Self {
            store: RowStore::new(table.column_count()),
            form: render_form(&table.display_name, &[]),
            table,
            visibility: Vec::new(),
            filter_inputs: Vec::new(),
            append_inputs: Vec::new(),
            filter_active: false,
            visible: false,
            edit_mode: EditMode::Direct,
            phase: ControllerPhase::Uninitialized,
        }
        .with_phase(ControllerPhase::StructureLoaded)
    }

    fn with_phase(mut self, phase: ControllerPhase) -> Self {
        self.set_phase(phase);
        self
    }

    fn set_phase(&mut self, phase: ControllerPhase) {
        debug!(table = %self.table.name, from = ?self.phase, to = ?phase, "controller phase");
        self.phase = phase;
    }

    fn build_interface(mut self) -> Self {
        self.form = render_form(&self.table.display_name, &self.table.columns);
        let count = self.table.column_count();
        self.filter_inputs = vec![String::new(); count];
        self.append_inputs = vec![String::new(); count];
        self.with_phase(ControllerPhase::InterfaceBuilt)
    }

    /// Creates `name` with `Field_1..Field_N` text columns and a serial key.
    /// The new table starts out empty; its structure is read back from the
    /// catalog so the key column is part of the grid.
    pub fn create(
        backend: &dyn TableBackend,
        name: &str,
        column_count: usize,
        translations: &Translations,
    ) -> GridResult<Self> {
        validate_identifier(name)?;
        let names = (1..=column_count.max(1))
            .map(|index| format!("Field_{index}"))
            .collect::<Vec<_>>();
        backend.create_table(name, &names)?;
        info!(table = name, columns = names.len(), "created table");

        let columns = backend.list_columns(name)?;
        if columns.is_empty() {
            return Err(GridError::EmptyResult(name.to_owned()));
        }
        let controller =
            Self::uninitialized(TableDescriptor::new(name, &columns, translations)).build_interface();
        Ok(controller.with_phase(ControllerPhase::Ready))
    }

    /// Builds a controller from the live catalog and loads every row.
    pub fn open(
        backend: &dyn TableBackend,
        name: &str,
        translations: &Translations,
    ) -> GridResult<Self> {
        validate_identifier(name)?;
        let columns = backend.list_columns(name)?;
        if columns.is_empty() {
            return Err(GridError::EmptyResult(name.to_owned()));
        }

        let mut controller =
            Self::uninitialized(TableDescriptor::new(name, &columns, translations)).build_interface();
        controller.load_rows(backend)?;
        controller.set_phase(ControllerPhase::Ready);
        Ok(controller)
    }

    fn load_rows(&mut self, backend: &dyn TableBackend) -> GridResult<usize> {
        let rows = backend.load_rows(&self.table.name, &self.table.columns)?;
        let mut store = RowStore::new(self.table.column_count());
        for row in rows {
            store.insert(row)?;
        }
        self.store = store;
        self.visibility = vec![true; self.store.count()];
        self.filter_active = false;
        info!(table = %self.table.name, rows = self.store.count(), "loaded rows");
        Ok(self.store.count())
    }

    pub fn insert(&mut self, backend: &dyn TableBackend) -> GridResult<Notice> {
        if self.append_inputs.iter().all(|input| is_blank(input)) {
            return Ok(Notice::NothingToInsert);
        }
        let values =
            validate_inputs(&self.append_inputs, &self.table.columns).map_err(GridError::Validation)?;

        if self.edit_mode == EditMode::Staged {
            return self.stage_insert(values);
        }

        let name = &self.table.name;
        let columns = &self.table.columns;
        if backend.count_matching(name, columns, &values)? > 0 {
            return Err(GridError::Duplicate(shown_values(&values)));
        }

        let row = backend.insert_row(name, columns, &values)?;
        self.store.insert(row)?;
        self.visibility.push(true);
        self.clear_append_inputs();
        info!(table = %self.table.name, "inserted row");
        Ok(Notice::Inserted {
            row: self.store.count() - 1,
        })
    }

    /// Appends to the grid only. Duplicates are checked against the grid
    /// since the database will be overwritten on save.
    fn stage_insert(&mut self, values: Vec<Option<String>>) -> GridResult<Notice> {
        let columns = &self.table.columns;
        let duplicate = self.store.rows().iter().any(|row| {
            columns
                .iter()
                .zip(&values)
                .zip(row)
                .all(|((column, value), cell)| {
                    uses_default(column, value.as_ref()) || value.as_deref().unwrap_or("") == cell
                })
        });
        if duplicate {
            return Err(GridError::Duplicate(shown_values(&values)));
        }

        let row = values.into_iter().map(Option::unwrap_or_default).collect();
        self.store.insert(row)?;
        self.visibility.push(true);
        self.clear_append_inputs();
        info!(table = %self.table.name, "staged row");
        Ok(Notice::InsertStaged {
            row: self.store.count() - 1,
        })
    }

    /// Keeps only selected rows that exist. `None` when nothing remains.
    pub fn request_delete(&self, selection: &BTreeSet<usize>) -> Option<PendingDelete> {
        let rows = selection
            .iter()
            .copied()
            .filter(|index| *index < self.store.count())
            .collect::<BTreeSet<_>>();
        (!rows.is_empty()).then(|| PendingDelete {
            table: self.table.name.clone(),
            rows,
        })
    }

    pub fn delete(
        &mut self,
        backend: &dyn TableBackend,
        pending: PendingDelete,
    ) -> GridResult<Notice> {
        if pending.table != self.table.name {
            return Err(GridError::UnknownTable(pending.table));
        }
        if self.edit_mode == EditMode::Staged {
            return Ok(self.stage_delete(&pending.rows));
        }
        let key_name = self.primary_key_name(backend)?;
        let key_index = self.table.column_index(&key_name);

        let mut removed = 0;
        let mut failures = Vec::new();
        for index in pending.rows.iter().rev().copied() {
            let Some(row) = self.store.get(index) else {
                continue;
            };
            let Some(key_index) = key_index else {
                failures.push(DeleteFailure {
                    row: index,
                    reason: format!("key column `{key_name}` is not loaded"),
                });
                continue;
            };
            let raw = &row[key_index];
            if is_blank(raw) {
                failures.push(DeleteFailure {
                    row: index,
                    reason: "row has no key value".to_owned(),
                });
                continue;
            }

            let column = &self.table.columns[key_index];
            let key = KeyMatch {
                column: column.original_name.clone(),
                udt_name: column.udt_name.clone(),
                value: if column.sql_type.is_numeric() {
                    normalize_decimal(raw)
                } else {
                    raw.clone()
                },
            };
            match backend.delete_by_key(&self.table.name, &key) {
                Ok(0) => failures.push(DeleteFailure {
                    row: index,
                    reason: "no matching row in the database".to_owned(),
                }),
                Ok(_) => {
                    self.store.remove(index);
                    if index < self.visibility.len() {
                        self.visibility.remove(index);
                    }
                    removed += 1;
                }
                Err(error) if error.is_connection() => {
                    warn!(table = %self.table.name, removed, %error, "delete aborted");
                    return Err(error);
                }
                Err(error) => failures.push(DeleteFailure {
                    row: index,
                    reason: error.to_string(),
                }),
            }
        }
        info!(table = %self.table.name, removed, failed = failures.len(), "deleted rows");
        Ok(Notice::Deleted { removed, failures })
    }

    fn stage_delete(&mut self, rows: &BTreeSet<usize>) -> Notice {
        let mut removed = 0;
        for index in rows.iter().rev().copied() {
            if self.store.remove(index).is_some() {
                if index < self.visibility.len() {
                    self.visibility.remove(index);
                }
                removed += 1;
            }
        }
        info!(table = %self.table.name, removed, "staged delete");
        Notice::DeleteStaged { removed }
    }

    fn primary_key_name(&self, backend: &dyn TableBackend) -> GridResult<String> {
        match backend.primary_key(&self.table.name) {
            Ok(Some(name)) => Ok(name),
            Ok(None) => {
                warn!(table = %self.table.name, "no primary key found; assuming `id`");
                Ok(DEFAULT_PRIMARY_KEY.to_owned())
            }
            Err(error) if error.is_connection() => Err(error),
            Err(error) => {
                warn!(table = %self.table.name, %error, "primary key lookup failed; assuming `id`");
                Ok(DEFAULT_PRIMARY_KEY.to_owned())
            }
        }
    }

    pub fn apply_filter(&mut self) -> Notice {
        let mut needles = Vec::new();
        let mut skipped = Vec::new();
        for (index, input) in self.filter_inputs.iter().enumerate() {
            let column = &self.table.columns[index];
            match validate_input(input, &column.sql_type) {
                Ok(Some(value)) => needles.push((index, value.to_lowercase())),
                Ok(None) => {}
                Err(error) => skipped.push(ColumnIssue {
                    column: column.display_name.clone(),
                    error,
                }),
            }
        }

        self.visibility = self
            .store
            .rows()
            .iter()
            .map(|row| {
                needles
                    .iter()
                    .all(|(index, needle)| row[*index].to_lowercase().contains(needle.as_str()))
            })
            .collect();
        self.filter_active = !needles.is_empty();
        let phase = if self.filter_active {
            ControllerPhase::Filtered
        } else {
            ControllerPhase::Ready
        };
        self.set_phase(phase);

        Notice::Filtered {
            visible: self.visible_count(),
            total: self.store.count(),
            skipped,
        }
    }

    /// Re-reads every row; filter inputs stay as typed.
    pub fn load(&mut self, backend: &dyn TableBackend) -> GridResult<Notice> {
        let rows = self.load_rows(backend)?;
        self.set_phase(ControllerPhase::Ready);
        Ok(Notice::Loaded { rows })
    }

    pub fn reload(&mut self, backend: &dyn TableBackend) -> GridResult<Notice> {
        self.set_phase(ControllerPhase::Reloading);
        self.store.clear();
        self.visibility.clear();
        for input in &mut self.filter_inputs {
            input.clear();
        }
        let loaded = self.load_rows(backend);
        self.set_phase(ControllerPhase::Ready);
        Ok(Notice::Reloaded { rows: loaded? })
    }

    /// Overwrites the table with the store. Asks for confirmation first when
    /// the table already has rows, unless `confirmed`. In staged mode the
    /// saved rows are read back so database defaults show up in the grid.
    pub fn save_all(&mut self, backend: &dyn TableBackend, confirmed: bool) -> GridResult<Notice> {
        if self.store.is_empty() {
            return Ok(Notice::NothingToSave);
        }
        if !confirmed {
            let existing = backend.row_count(&self.table.name)?;
            if existing > 0 {
                return Ok(Notice::ConfirmOverwrite { existing });
            }
        }

        let rows = self
            .store
            .rows()
            .iter()
            .filter(|row| !row.iter().all(|value| is_blank(value)))
            .map(|row| {
                row.iter()
                    .zip(&self.table.columns)
                    .map(|(value, column)| {
                        validate_input(value, &column.sql_type).unwrap_or_else(|_| Some(value.clone()))
                    })
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();

        match backend.replace_rows(&self.table.name, &self.table.columns, &rows) {
            Ok(saved) => {
                info!(table = %self.table.name, rows = saved, "saved all rows");
                if self.edit_mode == EditMode::Staged {
                    self.load_rows(backend)?;
                    self.set_phase(ControllerPhase::Ready);
                }
                Ok(Notice::Saved { rows: saved })
            }
            Err(error) => {
                warn!(table = %self.table.name, %error, "save failed; reloading");
                if let Err(reload_error) = self.reload(backend) {
                    warn!(table = %self.table.name, error = %reload_error, "reload after failed save");
                }
                Err(error)
            }
        }
    }

    pub fn show(&mut self) {
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn phase(&self) -> ControllerPhase {
        self.phase
    }

    pub fn edit_mode(&self) -> EditMode {
        self.edit_mode
    }

    pub fn set_edit_mode(&mut self, mode: EditMode) {
        self.edit_mode = mode;
    }

    pub fn name(&self) -> &str {
        &self.table.name
    }

    pub fn display_name(&self) -> &str {
        &self.table.display_name
    }

    pub fn table(&self) -> &TableDescriptor {
        &self.table
    }

    pub fn form(&self) -> &FormModel {
        &self.form
    }

    pub fn store(&self) -> &RowStore {
        &self.store
    }

    pub fn is_row_visible(&self, index: usize) -> bool {
        self.visibility.get(index).copied().unwrap_or(false)
    }

    /// Store indices of the rows the current filter lets through.
    pub fn visible_rows(&self) -> Vec<usize> {
        self.visibility
            .iter()
            .enumerate()
            .filter_map(|(index, visible)| visible.then_some(index))
            .collect()
    }

    pub fn visible_count(&self) -> usize {
        self.visibility.iter().filter(|visible| **visible).count()
    }

    pub fn filter_active(&self) -> bool {
        self.filter_active
    }

    pub fn filter_inputs(&self) -> &[String] {
        &self.filter_inputs
    }

    pub fn append_inputs(&self) -> &[String] {
        &self.append_inputs
    }

    pub fn filter_input_mut(&mut self, column: usize) -> Option<&mut String> {
        self.filter_inputs.get_mut(column)
    }

    pub fn append_input_mut(&mut self, column: usize) -> Option<&mut String> {
        self.append_inputs.get_mut(column)
    }

    pub fn set_filter_input(&mut self, column: usize, value: &str) {
        if let Some(input) = self.filter_inputs.get_mut(column) {
            *input = value.to_owned();
        }
    }

    pub fn set_append_input(&mut self, column: usize, value: &str) {
        if let Some(input) = self.append_inputs.get_mut(column) {
            *input = value.to_owned();
        }
    }

    pub fn clear_append_inputs(&mut self) {
        for input in &mut self.append_inputs {
            input.clear();
        }
    }
}

fn shown_values(values: &[Option<String>]) -> String {
    values
        .iter()
        .map(|value| value.as_deref().unwrap_or(""))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::{ControllerPhase, EditMode, Notice, TableController};
    use crate::backend::TableBackend;
    use crate::error::GridError;
    use crate::memory::MemoryBackend;
    use crate::model::CatalogColumn;
    use crate::translate::Translations;
    use anyhow::Result;
    use std::collections::BTreeSet;

    fn typed(name: &str, data_type: &str, udt: &str, has_default: bool) -> CatalogColumn {
        CatalogColumn {
            name: name.to_owned(),
            data_type: data_type.to_owned(),
            udt_name: udt.to_owned(),
            has_default,
        }
    }

    fn people() -> Result<MemoryBackend> {
        let backend = MemoryBackend::new();
        backend.add_table(
            "people",
            vec![
                typed("id", "integer", "int4", true),
                CatalogColumn::text("name"),
                typed("age", "integer", "int4", false),
                typed("score", "numeric", "numeric", false),
            ],
            Some("id"),
        );
        backend.push_values("people", &["", "Alice", "30", "1.5"])?;
        backend.push_values("people", &["", "Bob", "25", "2"])?;
        backend.push_values("people", &["", "alicia", "41", ""])?;
        Ok(backend)
    }

    fn open_people(backend: &MemoryBackend) -> Result<TableController> {
        Ok(TableController::open(
            backend,
            "people",
            &Translations::default(),
        )?)
    }

    #[test]
    fn open_loads_structure_and_rows() -> Result<()> {
        let backend = people()?;
        let controller = open_people(&backend)?;

        assert_eq!(controller.phase(), ControllerPhase::Ready);
        assert_eq!(controller.display_name(), "People");
        assert_eq!(controller.form().field_count(), 4);
        assert_eq!(controller.store().count(), 3);
        assert_eq!(controller.visible_count(), 3);
        assert_eq!(controller.store().rows()[0][1], "Alice");
        Ok(())
    }

    #[test]
    fn open_rejects_table_without_columns() -> Result<()> {
        let backend = people()?;
        let error = TableController::open(&backend, "ghost", &Translations::default())
            .expect_err("unknown table has no columns");
        assert_eq!(error, GridError::EmptyResult("ghost".to_owned()));
        Ok(())
    }

    #[test]
    fn create_coerces_zero_columns_to_one() -> Result<()> {
        let backend = MemoryBackend::new();
        let controller = TableController::create(&backend, "scratch", 0, &Translations::default())?;

        assert_eq!(controller.table().column_count(), 2);
        assert_eq!(controller.table().columns[0].original_name, "id");
        assert_eq!(controller.table().columns[1].original_name, "Field_1");
        assert_eq!(controller.phase(), ControllerPhase::Ready);
        assert!(controller.store().is_empty());
        assert_eq!(backend.list_columns("scratch")?.len(), 2);
        Ok(())
    }

    #[test]
    fn created_table_can_insert_and_delete_by_key() -> Result<()> {
        let backend = MemoryBackend::new();
        let mut controller = TableController::create(&backend, "notes", 1, &Translations::default())?;
        controller.set_append_input(1, "hello");

        assert_eq!(controller.insert(&backend)?, Notice::Inserted { row: 0 });
        assert_eq!(controller.store().rows()[0], vec!["1".to_owned(), "hello".to_owned()]);

        let pending = controller
            .request_delete(&BTreeSet::from([0]))
            .expect("one row selected");
        assert_eq!(
            controller.delete(&backend, pending)?,
            Notice::Deleted {
                removed: 1,
                failures: Vec::new()
            }
        );
        assert!(controller.store().is_empty());
        assert!(backend.rows_of("notes").is_empty());
        Ok(())
    }

    #[test]
    fn create_rejects_unsafe_names() {
        let backend = MemoryBackend::new();
        let error = TableController::create(&backend, "bad name", 2, &Translations::default())
            .expect_err("space is not allowed");
        assert!(matches!(error, GridError::InvalidIdentifier(_)));
    }

    #[test]
    fn insert_appends_returned_row_and_clears_inputs() -> Result<()> {
        let backend = people()?;
        let mut controller = open_people(&backend)?;
        controller.set_append_input(1, "Dana");
        controller.set_append_input(2, "52");
        controller.set_append_input(3, "3,75");

        let notice = controller.insert(&backend)?;
        assert_eq!(notice, Notice::Inserted { row: 3 });
        assert_eq!(
            controller.store().rows()[3],
            vec!["4".to_owned(), "Dana".to_owned(), "52".to_owned(), "3.75".to_owned()]
        );
        assert!(controller.append_inputs().iter().all(String::is_empty));
        assert_eq!(backend.rows_of("people").len(), 4);
        Ok(())
    }

    #[test]
    fn insert_with_all_blank_inputs_is_a_no_op() -> Result<()> {
        let backend = people()?;
        let mut controller = open_people(&backend)?;
        assert_eq!(controller.insert(&backend)?, Notice::NothingToInsert);
        assert_eq!(backend.rows_of("people").len(), 3);
        Ok(())
    }

    #[test]
    fn insert_reports_every_invalid_column_and_keeps_inputs() -> Result<()> {
        let backend = people()?;
        let mut controller = open_people(&backend)?;
        controller.set_append_input(1, "Eve");
        controller.set_append_input(2, "old");
        controller.set_append_input(3, "lots");

        let error = controller.insert(&backend).expect_err("two bad numbers");
        let GridError::Validation(issues) = error else {
            panic!("expected a validation error");
        };
        assert_eq!(issues.len(), 2);
        assert_eq!(controller.append_inputs()[2], "old");
        assert_eq!(controller.store().count(), 3);
        Ok(())
    }

    #[test]
    fn duplicate_insert_is_rejected_without_changes() -> Result<()> {
        let backend = people()?;
        let mut controller = open_people(&backend)?;
        controller.set_append_input(1, "Bob");
        controller.set_append_input(2, "25");
        controller.set_append_input(3, "2,0");

        let error = controller.insert(&backend).expect_err("Bob already exists");
        assert!(matches!(error, GridError::Duplicate(_)));
        assert_eq!(controller.store().count(), 3);
        assert_eq!(backend.rows_of("people").len(), 3);
        Ok(())
    }

    #[test]
    fn blank_cells_match_null_in_duplicate_check() -> Result<()> {
        let backend = people()?;
        let mut controller = open_people(&backend)?;
        controller.set_append_input(1, "alicia");
        controller.set_append_input(2, "41");

        let error = controller.insert(&backend).expect_err("null score matches");
        assert!(matches!(error, GridError::Duplicate(_)));
        Ok(())
    }

    #[test]
    fn filter_is_case_insensitive_and_never_mutates_rows() -> Result<()> {
        let backend = people()?;
        let mut controller = open_people(&backend)?;
        controller.set_filter_input(1, "ALI");

        let notice = controller.apply_filter();
        assert_eq!(
            notice,
            Notice::Filtered {
                visible: 2,
                total: 3,
                skipped: Vec::new()
            }
        );
        assert_eq!(controller.visible_rows(), vec![0, 2]);
        assert_eq!(controller.phase(), ControllerPhase::Filtered);
        assert_eq!(controller.store().count(), 3);

        controller.set_filter_input(1, "");
        controller.apply_filter();
        assert_eq!(controller.visible_count(), 3);
        assert_eq!(controller.phase(), ControllerPhase::Ready);
        Ok(())
    }

    #[test]
    fn invalid_filter_is_skipped_and_reported() -> Result<()> {
        let backend = people()?;
        let mut controller = open_people(&backend)?;
        controller.set_filter_input(2, "thirty");
        controller.set_filter_input(3, "1,5");

        let Notice::Filtered {
            visible, skipped, ..
        } = controller.apply_filter()
        else {
            panic!("expected a filter notice");
        };
        assert_eq!(visible, 1);
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].column, "Age");
        Ok(())
    }

    #[test]
    fn filter_ignores_rows_inserted_later_until_reapplied() -> Result<()> {
        let backend = people()?;
        let mut controller = open_people(&backend)?;
        controller.set_filter_input(1, "bob");
        controller.apply_filter();
        controller.set_append_input(1, "Carl");
        controller.insert(&backend)?;

        assert!(controller.is_row_visible(3));
        controller.apply_filter();
        assert!(!controller.is_row_visible(3));
        Ok(())
    }

    #[test]
    fn delete_requires_a_selection() -> Result<()> {
        let backend = people()?;
        let controller = open_people(&backend)?;
        assert!(controller.request_delete(&BTreeSet::new()).is_none());
        assert!(controller.request_delete(&BTreeSet::from([9])).is_none());
        Ok(())
    }

    #[test]
    fn delete_removes_confirmed_rows_from_store_and_database() -> Result<()> {
        let backend = people()?;
        let mut controller = open_people(&backend)?;
        let pending = controller
            .request_delete(&BTreeSet::from([0, 2]))
            .expect("two rows selected");
        assert_eq!(pending.len(), 2);

        let notice = controller.delete(&backend, pending)?;
        assert_eq!(
            notice,
            Notice::Deleted {
                removed: 2,
                failures: Vec::new()
            }
        );
        assert_eq!(controller.store().count(), 1);
        assert_eq!(controller.store().rows()[0][1], "Bob");
        assert_eq!(backend.rows_of("people").len(), 1);
        Ok(())
    }

    #[test]
    fn delete_keeps_rows_the_database_no_longer_has() -> Result<()> {
        let backend = people()?;
        let mut controller = open_people(&backend)?;
        backend.remove_where("people", "name", "Bob");
        let pending = controller
            .request_delete(&BTreeSet::from([1]))
            .expect("one row selected");

        let Notice::Deleted { removed, failures } = controller.delete(&backend, pending)? else {
            panic!("expected a delete notice");
        };
        assert_eq!(removed, 0);
        assert_eq!(failures.len(), 1);
        assert_eq!(controller.store().count(), 3);
        Ok(())
    }

    #[test]
    fn delete_without_key_column_fails_per_row() -> Result<()> {
        let backend = MemoryBackend::new();
        backend.add_table(
            "tags",
            vec![CatalogColumn::text("label")],
            None,
        );
        backend.push_values("tags", &["red"])?;
        let mut controller = TableController::open(&backend, "tags", &Translations::default())?;
        let pending = controller
            .request_delete(&BTreeSet::from([0]))
            .expect("one row selected");

        let notice = controller.delete(&backend, pending)?;
        assert!(notice.message().contains("key column `id` is not loaded"));
        assert_eq!(controller.store().count(), 1);
        Ok(())
    }

    #[test]
    fn lost_connection_stops_the_delete() -> Result<()> {
        let backend = people()?;
        let mut controller = open_people(&backend)?;
        let pending = controller
            .request_delete(&BTreeSet::from([0, 1, 2]))
            .expect("three rows selected");
        backend.go_offline_after(1);

        let error = controller
            .delete(&backend, pending)
            .expect_err("connection drops after the first delete");
        assert!(error.is_connection());
        assert_eq!(controller.store().count(), 2);
        assert_eq!(backend.rows_of("people").len(), 2);
        assert_eq!(controller.store().rows()[1][1], "Bob");
        Ok(())
    }

    #[test]
    fn load_keeps_filter_inputs_and_reload_resets_them() -> Result<()> {
        let backend = people()?;
        let mut controller = open_people(&backend)?;
        controller.set_filter_input(1, "bob");
        controller.apply_filter();
        backend.push_values("people", &["", "Zed", "19", ""])?;

        assert_eq!(controller.load(&backend)?, Notice::Loaded { rows: 4 });
        assert_eq!(controller.filter_inputs()[1], "bob");
        assert_eq!(controller.visible_count(), 4);

        backend.remove_where("people", "name", "Zed");
        assert_eq!(controller.reload(&backend)?, Notice::Reloaded { rows: 3 });
        assert!(controller.filter_inputs().iter().all(String::is_empty));
        assert_eq!(controller.phase(), ControllerPhase::Ready);
        Ok(())
    }

    #[test]
    fn save_all_asks_before_overwriting() -> Result<()> {
        let backend = people()?;
        let mut controller = open_people(&backend)?;

        assert_eq!(
            controller.save_all(&backend, false)?,
            Notice::ConfirmOverwrite { existing: 3 }
        );
        assert_eq!(controller.save_all(&backend, true)?, Notice::Saved { rows: 3 });
        assert_eq!(backend.rows_of("people").len(), 3);
        Ok(())
    }

    #[test]
    fn failed_save_reloads_from_database() -> Result<()> {
        let backend = people()?;
        let mut controller = open_people(&backend)?;
        controller.set_filter_input(1, "x");
        backend.set_fail_writes(true);

        let error = controller
            .save_all(&backend, true)
            .expect_err("writes are rejected");
        assert!(matches!(error, GridError::Persistence(_)));
        assert_eq!(controller.store().count(), 3);
        assert!(controller.filter_inputs()[1].is_empty());
        Ok(())
    }

    #[test]
    fn save_all_with_empty_store_does_nothing() -> Result<()> {
        let backend = MemoryBackend::new();
        let mut controller = TableController::create(&backend, "empty", 2, &Translations::default())?;
        assert_eq!(controller.save_all(&backend, false)?, Notice::NothingToSave);
        Ok(())
    }

    #[test]
    fn staged_edits_stay_in_the_grid_until_saved() -> Result<()> {
        let backend = people()?;
        let mut controller = open_people(&backend)?;
        controller.set_edit_mode(EditMode::Staged);
        controller.set_append_input(1, "Dana");
        controller.set_append_input(2, "52");
        controller.set_append_input(3, "3,75");

        let notice = controller.insert(&backend)?;
        assert_eq!(notice, Notice::InsertStaged { row: 3 });
        assert!(notice.message().contains("save to write it"));
        assert_eq!(controller.store().rows()[3][0], "");

        let pending = controller
            .request_delete(&BTreeSet::from([1]))
            .expect("one row selected");
        assert_eq!(
            controller.delete(&backend, pending)?,
            Notice::DeleteStaged { removed: 1 }
        );
        assert_eq!(controller.store().count(), 3);
        assert_eq!(backend.rows_of("people").len(), 3);
        assert_eq!(backend.rows_of("people")[1][1], "Bob");

        assert_eq!(controller.save_all(&backend, true)?, Notice::Saved { rows: 3 });
        let names = backend
            .rows_of("people")
            .into_iter()
            .map(|row| row[1].clone())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["Alice", "alicia", "Dana"]);
        assert_eq!(controller.store().rows()[2][0], "4");
        Ok(())
    }

    #[test]
    fn staged_insert_checks_duplicates_against_the_grid() -> Result<()> {
        let backend = people()?;
        let mut controller = open_people(&backend)?;
        controller.set_edit_mode(EditMode::Staged);
        controller.set_append_input(1, "Bob");
        controller.set_append_input(2, "25");
        controller.set_append_input(3, "2");

        let error = controller.insert(&backend).expect_err("Bob is already in the grid");
        assert!(matches!(error, GridError::Duplicate(_)));
        assert_eq!(controller.store().count(), 3);
        Ok(())
    }

    #[test]
    fn reload_discards_staged_rows() -> Result<()> {
        let backend = people()?;
        let mut controller = open_people(&backend)?;
        controller.set_edit_mode(EditMode::Staged);
        controller.set_append_input(1, "Eve");
        controller.insert(&backend)?;
        assert_eq!(controller.store().count(), 4);

        assert_eq!(controller.reload(&backend)?, Notice::Reloaded { rows: 3 });
        assert_eq!(controller.store().rows(), backend.rows_of("people").as_slice());
        assert_eq!(controller.edit_mode(), EditMode::Staged);
        Ok(())
    }

    #[test]
    fn show_and_hide_toggle_visibility_only() -> Result<()> {
        let backend = people()?;
        let mut controller = open_people(&backend)?;
        assert!(!controller.is_visible());
        controller.show();
        assert!(controller.is_visible());
        controller.hide();
        assert!(!controller.is_visible());
        assert_eq!(controller.store().count(), 3);
        Ok(())
    }

    #[test]
    fn connection_loss_surfaces_as_connection_error() -> Result<()> {
        let backend = people()?;
        let mut controller = open_people(&backend)?;
        backend.set_offline(true);
        let error = controller.load(&backend).expect_err("offline");
        assert!(error.is_connection());
        assert_eq!(controller.store().count(), 3);
        Ok(())
    }
}
