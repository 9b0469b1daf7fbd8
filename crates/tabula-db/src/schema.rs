// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use tabula_app::{CatalogColumn, GridError, GridResult};

/// Catalog queries. Every result column is cast to text; the schema and
/// table name are bound parameters.
pub const LIST_TABLES: &str = "
    SELECT table_name::text
    FROM information_schema.tables
    WHERE table_schema::text = $1::text
      AND table_type = 'BASE TABLE'
    ORDER BY table_name
";

pub const LIST_COLUMNS: &str = "
    SELECT column_name::text,
           data_type::text,
           udt_name::text,
           (column_default IS NOT NULL
             OR is_identity = 'YES'
             OR is_generated = 'ALWAYS')::text
    FROM information_schema.columns
    WHERE table_schema::text = $1::text
      AND table_name::text = $2::text
    ORDER BY ordinal_position
";

pub const PRIMARY_KEY: &str = "
    SELECT column_name::text
    FROM information_schema.key_column_usage
    WHERE table_schema::text = $1::text
      AND table_name::text = $2::text
      AND constraint_name::text LIKE '%pkey%'
    ORDER BY ordinal_position
    LIMIT 1
";

pub fn parse_columns(rows: Vec<Vec<String>>) -> GridResult<Vec<CatalogColumn>> {
    rows.into_iter()
        .map(|row| {
            let [name, data_type, udt_name, has_default]: [String; 4] =
                row.try_into().map_err(|row: Vec<String>| {
                    GridError::Schema(format!("expected 4 catalog fields, got {}", row.len()))
                })?;
            Ok(CatalogColumn {
                name,
                data_type,
                udt_name,
                has_default: has_default == "true",
            })
        })
        .collect()
}
