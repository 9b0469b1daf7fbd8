// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::model::{ColumnDescriptor, SqlType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Decimal,
    Text,
}

impl FieldKind {
    pub fn for_type(sql_type: &SqlType) -> Self {
        if sql_type.is_integer() {
            Self::Integer
        } else if sql_type.is_numeric() {
            Self::Decimal
        } else {
            Self::Text
        }
    }

    pub const fn hint(self) -> &'static str {
        match self {
            Self::Integer => "whole number",
            Self::Decimal => "number, comma or dot",
            Self::Text => "text",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub column: usize,
    pub label: String,
    pub kind: FieldKind,
    pub type_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormAction {
    ApplyFilter,
    DeleteSelected,
    Insert,
    Load,
    Reload,
    SaveAll,
}

impl FormAction {
    pub const ALL: [Self; 6] = [
        Self::ApplyFilter,
        Self::DeleteSelected,
        Self::Insert,
        Self::Load,
        Self::Reload,
        Self::SaveAll,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::ApplyFilter => "apply filter",
            Self::DeleteSelected => "delete selected",
            Self::Insert => "add record",
            Self::Load => "load from db",
            Self::Reload => "reload",
            Self::SaveAll => "save all",
        }
    }
}

/// Layout-free description of one table's editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormModel {
    pub title: String,
    pub filter_fields: Vec<FormField>,
    pub append_fields: Vec<FormField>,
    pub actions: Vec<FormAction>,
}

impl FormModel {
    pub fn field_count(&self) -> usize {
        self.append_fields.len()
    }
}

pub fn render_form(table_display_name: &str, columns: &[ColumnDescriptor]) -> FormModel {
    let fields = columns
        .iter()
        .enumerate()
        .map(|(column, descriptor)| FormField {
            column,
            label: descriptor.display_name.clone(),
            kind: FieldKind::for_type(&descriptor.sql_type),
            type_name: descriptor.sql_type.as_str().to_owned(),
        })
        .collect::<Vec<_>>();

    FormModel {
        title: format!("Table: \"{table_display_name}\""),
        filter_fields: fields.clone(),
        append_fields: fields,
        actions: FormAction::ALL.to_vec(),
    }
}
