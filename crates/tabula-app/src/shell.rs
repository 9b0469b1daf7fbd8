// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use tracing::{info, warn};

use crate::backend::TableBackend;
use crate::controller::{EditMode, Notice, TableController};
use crate::error::{GridError, GridResult};
use crate::memory::MemoryBackend;
use crate::model::validate_identifier;
use crate::translate::Translations;

pub const OFFLINE_TABLE: &str = "test_table";
const OFFLINE_COLUMNS: [&str; 5] = ["field_1", "field_2", "field_3", "field_4", "field_5"];
const OFFLINE_ROW: [&str; 6] = ["", "One", "two", "three", "four", "five"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub name: Option<String>,
    pub label: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    pub skipped: Vec<String>,
}

impl LoadReport {
    pub fn notice(&self) -> Notice {
        Notice::Refreshed {
            tables: self.loaded,
            skipped: self.skipped.len(),
        }
    }
}

/// Owns the backend and one controller per table.
pub struct Shell {
    backend: Box<dyn TableBackend>,
    translations: Translations,
    tables: Vec<TableController>,
    active: Option<usize>,
    offline: bool,
    edit_mode: EditMode,
}

impl Shell {
    pub fn new(backend: Box<dyn TableBackend>, translations: Translations) -> Self {
        Self {
            backend,
            translations,
            tables: Vec::new(),
            active: None,
            offline: false,
            edit_mode: EditMode::Direct,
        }
    }

    /// Stand-in used when the database cannot be reached.
    pub fn offline_fallback(translations: Translations) -> GridResult<Self> {
        let backend = MemoryBackend::new();
        let columns = OFFLINE_COLUMNS.map(str::to_owned);
        backend.create_table(OFFLINE_TABLE, &columns)?;
        backend.push_values(OFFLINE_TABLE, &OFFLINE_ROW)?;

        let mut shell = Self::new(Box::new(backend), translations);
        shell.offline = true;
        shell.load_tables()?;
        Ok(shell)
    }

    pub fn is_offline(&self) -> bool {
        self.offline
    }

    pub fn edit_mode(&self) -> EditMode {
        self.edit_mode
    }

    /// Applies to every open table and to tables opened later.
    pub fn set_edit_mode(&mut self, mode: EditMode) {
        self.edit_mode = mode;
        for table in &mut self.tables {
            table.set_edit_mode(mode);
        }
        info!(?mode, "edit mode");
    }

    /// Opens every table the backend lists. Tables that fail to open are
    /// skipped and named in the report.
    pub fn load_tables(&mut self) -> GridResult<LoadReport> {
        let names = self.backend.list_tables()?;
        let mut report = LoadReport::default();
        for name in names {
            match TableController::open(self.backend.as_ref(), &name, &self.translations) {
                Ok(mut controller) => {
                    controller.set_edit_mode(self.edit_mode);
                    self.tables.push(controller);
                    report.loaded += 1;
                }
                Err(error) if error.is_connection() => return Err(error),
                Err(error) => {
                    warn!(table = %name, %error, "skipping table");
                    report.skipped.push(format!("{name}: {error}"));
                }
            }
        }
        info!(loaded = report.loaded, skipped = report.skipped.len(), "tables loaded");
        if self.active.is_none() && !self.tables.is_empty() {
            self.show_index(0);
        }
        Ok(report)
    }

    pub fn menu(&self) -> Vec<MenuEntry> {
        if self.tables.is_empty() {
            return vec![MenuEntry {
                name: None,
                label: "no tables".to_owned(),
                enabled: false,
            }];
        }
        self.tables
            .iter()
            .map(|table| MenuEntry {
                name: Some(table.name().to_owned()),
                label: table.display_name().to_owned(),
                enabled: true,
            })
            .collect()
    }

    pub fn show(&mut self, name: &str) -> GridResult<()> {
        let index = self
            .position(name)
            .ok_or_else(|| GridError::UnknownTable(name.to_owned()))?;
        self.show_index(index);
        Ok(())
    }

    pub fn show_index(&mut self, index: usize) {
        if index >= self.tables.len() {
            return;
        }
        for (position, table) in self.tables.iter_mut().enumerate() {
            if position == index {
                table.show();
            } else {
                table.hide();
            }
        }
        self.active = Some(index);
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn active(&self) -> Option<&TableController> {
        self.active.and_then(|index| self.tables.get(index))
    }

    pub fn active_mut(&mut self) -> Option<&mut TableController> {
        self.active.and_then(|index| self.tables.get_mut(index))
    }

    /// Runs `action` on the visible table with the shell's backend.
    pub fn with_active<T>(
        &mut self,
        action: impl FnOnce(&mut TableController, &dyn TableBackend) -> GridResult<T>,
    ) -> GridResult<T> {
        let index = self
            .active
            .ok_or_else(|| GridError::UnknownTable("(none)".to_owned()))?;
        let backend = self.backend.as_ref();
        let table = self
            .tables
            .get_mut(index)
            .ok_or_else(|| GridError::UnknownTable("(none)".to_owned()))?;
        action(table, backend)
    }

    pub fn table(&self, name: &str) -> Option<&TableController> {
        self.position(name).map(|index| &self.tables[index])
    }

    pub fn tables(&self) -> &[TableController] {
        &self.tables
    }

    pub fn backend(&self) -> &dyn TableBackend {
        self.backend.as_ref()
    }

    /// Drops every controller and rebuilds from the catalog, keeping the
    /// same table in view when it still exists.
    pub fn refresh(&mut self) -> GridResult<LoadReport> {
        let previous = self.active().map(|table| table.name().to_owned());
        self.tables.clear();
        self.active = None;
        let report = self.load_tables()?;
        if let Some(name) = previous
            && self.position(&name).is_some()
        {
            self.show(&name)?;
        }
        Ok(report)
    }

    pub fn create_table(&mut self, name: &str, column_count: usize) -> GridResult<Notice> {
        validate_identifier(name)?;
        TableController::create(
            self.backend.as_ref(),
            name,
            column_count,
            &self.translations,
        )?;
        self.refresh()?;
        self.show(name)?;
        Ok(Notice::TableCreated(name.to_owned()))
    }

    pub fn drop_table(&mut self, name: &str) -> GridResult<Notice> {
        validate_identifier(name)?;
        self.backend.drop_table(name)?;
        info!(table = name, "dropped table");
        self.refresh()?;
        Ok(Notice::TableDropped(name.to_owned()))
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.tables.iter().position(|table| table.name() == name)
    }
}
