// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

pub const DEFAULT_TRANSLATIONS_FILE: &str = "translations.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    Column,
    Table,
}

/// Display labels for raw identifiers, keyed by lower-cased original name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Translations {
    #[serde(default, alias = "Columns", alias = "COLUMNS")]
    columns: HashMap<String, String>,
    #[serde(default, alias = "Tables", alias = "TABLES")]
    tables: HashMap<String, String>,
}

impl Translations {
    pub fn from_maps<C, T>(columns: C, tables: T) -> Self
    where
        C: IntoIterator<Item = (String, String)>,
        T: IntoIterator<Item = (String, String)>,
    {
        Self {
            columns: lower_keys(columns),
            tables: lower_keys(tables),
        }
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let parsed: Self = serde_json::from_str(raw).context("parse translation document")?;
        Ok(Self::from_maps(parsed.columns, parsed.tables))
    }

    /// A missing file is an empty mapping, not an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no translation file");
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read translation file {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("load translations from {}", path.display()))
    }

    /// Degrades to identity formatting when the file cannot be used. The
    /// returned notice is meant for the user.
    pub fn load_or_empty(path: &Path) -> (Self, Option<String>) {
        match Self::load(path) {
            Ok(translations) => (translations, None),
            Err(error) => {
                warn!(path = %path.display(), error = %format!("{error:#}"), "translations unavailable");
                (
                    Self::default(),
                    Some(format!("translations ignored: {error:#}")),
                )
            }
        }
    }

    pub fn translate(&self, kind: NameKind, original: &str) -> String {
        let map = match kind {
            NameKind::Column => &self.columns,
            NameKind::Table => &self.tables,
        };
        map.get(&original.to_lowercase())
            .cloned()
            .unwrap_or_else(|| format_identifier(original))
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.tables.is_empty()
    }
}

/// `order_date` -> `Order date`.
pub fn format_identifier(name: &str) -> String {
    let spaced = name.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.as_str().to_lowercase().chars())
            .collect(),
        None => String::new(),
    }
}

fn lower_keys<I>(entries: I) -> HashMap<String, String>
where
    I: IntoIterator<Item = (String, String)>,
{
    entries
        .into_iter()
        .map(|(key, value)| (key.to_lowercase(), value))
        .collect()
}
