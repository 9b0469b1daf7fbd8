// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Statement builders. Identifiers are validated and double-quoted; values
//! are always bound as text parameters and cast to the column type on the
//! server.

use tabula_app::{
    ColumnDescriptor, DEFAULT_PRIMARY_KEY, GridResult, KeyMatch, SqlType, is_blank,
    normalize_decimal, uses_default, validate_identifier,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Option<String>>,
}

impl Statement {
    fn bare(sql: String) -> Self {
        Self {
            sql,
            params: Vec::new(),
        }
    }

    /// SQL text with parameters spelled out as literals, for logs. Each
    /// placeholder is replaced once; substituted values are never rescanned.
    pub fn preview(&self) -> String {
        let mut rendered = String::with_capacity(self.sql.len());
        let mut rest = self.sql.as_str();
        while let Some(start) = rest.find('$') {
            rendered.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            let digits = after
                .find(|ch: char| !ch.is_ascii_digit())
                .unwrap_or(after.len());
            let param = after[..digits]
                .parse::<usize>()
                .ok()
                .and_then(|number| number.checked_sub(1))
                .and_then(|index| self.params.get(index));
            match param {
                Some(Some(value)) => rendered.push_str(&quote_literal(value)),
                Some(None) => rendered.push_str("NULL"),
                None => rendered.push_str(&rest[start..start + 1 + digits]),
            }
            rest = &after[digits..];
        }
        rendered.push_str(rest);
        rendered
    }
}

pub fn quote_ident(identifier: &str) -> GridResult<String> {
    Ok(format!("\"{}\"", validate_identifier(identifier)?))
}

/// `"schema"."table"`.
pub fn qualify(schema: &str, table: &str) -> GridResult<String> {
    Ok(format!("{}.{}", quote_ident(schema)?, quote_ident(table)?))
}

pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Renders a user value as a SQL literal for `sql_type`.
///
/// Blank is `NULL`. Numeric input has comma decimals normalized and is
/// emitted bare when it parses; otherwise it falls back to a quoted literal.
pub fn format_value(value: &str, sql_type: &SqlType) -> String {
    if is_blank(value) {
        return "NULL".to_owned();
    }
    if !sql_type.is_numeric() {
        return quote_literal(value);
    }
    let normalized = normalize_decimal(value);
    let parses = if sql_type.is_integer() {
        normalized.parse::<i64>().is_ok()
    } else {
        normalized.parse::<f64>().is_ok_and(f64::is_finite)
    };
    if parses {
        normalized
    } else {
        quote_literal(value)
    }
}

fn cast_target(column: &ColumnDescriptor) -> GridResult<String> {
    if column.udt_name.is_empty() {
        Ok("text".to_owned())
    } else {
        quote_ident(&column.udt_name)
    }
}

fn placeholder(index: usize, column: &ColumnDescriptor) -> GridResult<String> {
    Ok(format!("${index}::text::{}", cast_target(column)?))
}

fn text_projection(columns: &[ColumnDescriptor]) -> GridResult<String> {
    let parts = columns
        .iter()
        .map(|column| Ok(format!("{}::text", quote_ident(&column.original_name)?)))
        .collect::<GridResult<Vec<_>>>()?;
    Ok(parts.join(", "))
}

pub fn select_rows(qualified: &str, columns: &[ColumnDescriptor]) -> GridResult<Statement> {
    Ok(Statement::bare(format!(
        "SELECT {} FROM {qualified}",
        text_projection(columns)?
    )))
}

pub fn count_rows(qualified: &str) -> Statement {
    Statement::bare(format!("SELECT count(*)::text FROM {qualified}"))
}

/// Counts rows equal to `values`, treating `NULL` as equal to `NULL`.
/// Blank inputs on defaulted columns are left out of the comparison.
pub fn count_matching(
    qualified: &str,
    columns: &[ColumnDescriptor],
    values: &[Option<String>],
) -> GridResult<Statement> {
    let mut predicates = Vec::new();
    let mut params = Vec::new();
    for (column, value) in columns.iter().zip(values) {
        if uses_default(column, value.as_ref()) {
            continue;
        }
        params.push(value.clone());
        predicates.push(format!(
            "{} IS NOT DISTINCT FROM {}",
            quote_ident(&column.original_name)?,
            placeholder(params.len(), column)?
        ));
    }
    let condition = if predicates.is_empty() {
        "TRUE".to_owned()
    } else {
        predicates.join(" AND ")
    };
    Ok(Statement {
        sql: format!("SELECT count(*)::text FROM {qualified} WHERE {condition}"),
        params,
    })
}

pub fn insert_row(
    qualified: &str,
    columns: &[ColumnDescriptor],
    values: &[Option<String>],
) -> GridResult<Statement> {
    let mut names = Vec::with_capacity(columns.len());
    let mut slots = Vec::with_capacity(columns.len());
    let mut params = Vec::new();
    for (column, value) in columns.iter().zip(values) {
        names.push(quote_ident(&column.original_name)?);
        if uses_default(column, value.as_ref()) {
            slots.push("DEFAULT".to_owned());
        } else {
            params.push(value.clone());
            slots.push(placeholder(params.len(), column)?);
        }
    }
    Ok(Statement {
        sql: format!(
            "INSERT INTO {qualified} ({}) VALUES ({}) RETURNING {}",
            names.join(", "),
            slots.join(", "),
            text_projection(columns)?
        ),
        params,
    })
}

pub fn delete_by_key(qualified: &str, key: &KeyMatch) -> GridResult<Statement> {
    let cast = if key.udt_name.is_empty() {
        "text".to_owned()
    } else {
        quote_ident(&key.udt_name)?
    };
    Ok(Statement {
        sql: format!(
            "DELETE FROM {qualified} WHERE {} = $1::text::{cast}",
            quote_ident(&key.column)?
        ),
        params: vec![Some(key.value.clone())],
    })
}

pub fn delete_all(qualified: &str) -> Statement {
    Statement::bare(format!("DELETE FROM {qualified}"))
}

pub fn create_table(qualified: &str, columns: &[String]) -> GridResult<Statement> {
    let mut definitions = vec![format!("{DEFAULT_PRIMARY_KEY} SERIAL PRIMARY KEY")];
    for column in columns {
        definitions.push(format!("{} TEXT", quote_ident(column)?));
    }
    Ok(Statement::bare(format!(
        "CREATE TABLE IF NOT EXISTS {qualified} ({})",
        definitions.join(", ")
    )))
}

pub fn drop_table(qualified: &str) -> Statement {
    Statement::bare(format!("DROP TABLE IF EXISTS {qualified}"))
}
