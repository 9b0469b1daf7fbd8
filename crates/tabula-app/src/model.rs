// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};

use crate::error::{GridError, GridResult};
use crate::translate::{NameKind, Translations};

pub type Row = Vec<String>;

pub const DEFAULT_PRIMARY_KEY: &str = "id";

pub fn is_safe_identifier(identifier: &str) -> bool {
    !identifier.is_empty()
        && identifier
            .bytes()
            .all(|byte| byte.is_ascii_alphanumeric() || byte == b'_')
}

pub fn validate_identifier(identifier: &str) -> GridResult<&str> {
    if is_safe_identifier(identifier) {
        Ok(identifier)
    } else {
        Err(GridError::InvalidIdentifier(identifier.to_owned()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SqlType {
    SmallInt,
    Integer,
    BigInt,
    Numeric,
    Decimal,
    Real,
    DoublePrecision,
    Text(String),
}

impl SqlType {
    pub fn parse(data_type: &str) -> Self {
        match data_type.trim().to_ascii_lowercase().as_str() {
            "smallint" => Self::SmallInt,
            "integer" => Self::Integer,
            "bigint" => Self::BigInt,
            "numeric" => Self::Numeric,
            "decimal" => Self::Decimal,
            "real" => Self::Real,
            "double precision" => Self::DoublePrecision,
            other => Self::Text(other.to_owned()),
        }
    }

    pub fn text() -> Self {
        Self::Text("text".to_owned())
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::SmallInt => "smallint",
            Self::Integer => "integer",
            Self::BigInt => "bigint",
            Self::Numeric => "numeric",
            Self::Decimal => "decimal",
            Self::Real => "real",
            Self::DoublePrecision => "double precision",
            Self::Text(raw) => raw,
        }
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, Self::Text(_))
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Self::SmallInt | Self::Integer | Self::BigInt)
    }
}

/// One column as reported by the catalog, before translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogColumn {
    pub name: String,
    pub data_type: String,
    pub udt_name: String,
    pub has_default: bool,
}

impl CatalogColumn {
    pub fn text(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: "text".to_owned(),
            udt_name: "text".to_owned(),
            has_default: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub original_name: String,
    pub display_name: String,
    pub sql_type: SqlType,
    pub udt_name: String,
    pub has_default: bool,
}

impl ColumnDescriptor {
    pub fn from_catalog(column: &CatalogColumn, translations: &Translations) -> Self {
        Self {
            original_name: column.name.clone(),
            display_name: translations.translate(NameKind::Column, &column.name),
            sql_type: SqlType::parse(&column.data_type),
            udt_name: column.udt_name.clone(),
            has_default: column.has_default,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    pub name: String,
    pub display_name: String,
    pub columns: Vec<ColumnDescriptor>,
}

impl TableDescriptor {
    pub fn new(name: &str, columns: &[CatalogColumn], translations: &Translations) -> Self {
        Self {
            name: name.to_owned(),
            display_name: translations.translate(NameKind::Table, name),
            columns: columns
                .iter()
                .map(|column| ColumnDescriptor::from_catalog(column, translations))
                .collect(),
        }
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, original_name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|column| column.original_name.eq_ignore_ascii_case(original_name))
    }
}
