// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use tabula_app::{ColumnDescriptor, GridError, KeyMatch, SqlType};
use tabula_db::sql;

fn column(name: &str, sql_type: SqlType, udt: &str, has_default: bool) -> ColumnDescriptor {
    ColumnDescriptor {
        original_name: name.to_owned(),
        display_name: name.to_owned(),
        sql_type,
        udt_name: udt.to_owned(),
        has_default,
    }
}

fn people() -> Vec<ColumnDescriptor> {
    vec![
        column("id", SqlType::Integer, "int4", true),
        column("name", SqlType::text(), "text", false),
        column("score", SqlType::Numeric, "numeric", false),
    ]
}

#[test]
fn qualify_quotes_schema_and_table() -> Result<()> {
    assert_eq!(sql::qualify("public", "Orders")?, "\"public\".\"Orders\"");
    let error = sql::qualify("public", "orders x").expect_err("space in name");
    assert_eq!(error, GridError::InvalidIdentifier("orders x".to_owned()));
    Ok(())
}

#[test]
fn insert_uses_default_for_blank_serial_and_binds_the_rest() -> Result<()> {
    let statement = sql::insert_row(
        "\"public\".\"people\"",
        &people(),
        &[None, Some("Ann".to_owned()), None],
    )?;

    assert_eq!(
        statement.sql,
        "INSERT INTO \"public\".\"people\" (\"id\", \"name\", \"score\") \
         VALUES (DEFAULT, $1::text::\"text\", $2::text::\"numeric\") \
         RETURNING \"id\"::text, \"name\"::text, \"score\"::text"
    );
    assert_eq!(statement.params, vec![Some("Ann".to_owned()), None]);
    Ok(())
}

#[test]
fn explicit_key_value_is_bound_not_defaulted() -> Result<()> {
    let statement = sql::insert_row(
        "\"public\".\"people\"",
        &people(),
        &[Some("9".to_owned()), Some("Ann".to_owned()), Some("1.5".to_owned())],
    )?;
    assert!(statement.sql.contains("VALUES ($1::text::\"int4\""));
    assert_eq!(statement.params.len(), 3);
    Ok(())
}

#[test]
fn duplicate_check_skips_defaulted_blanks_and_matches_nulls() -> Result<()> {
    let statement = sql::count_matching(
        "\"public\".\"people\"",
        &people(),
        &[None, Some("Ann".to_owned()), None],
    )?;

    assert_eq!(
        statement.sql,
        "SELECT count(*)::text FROM \"public\".\"people\" WHERE \
         \"name\" IS NOT DISTINCT FROM $1::text::\"text\" AND \
         \"score\" IS NOT DISTINCT FROM $2::text::\"numeric\""
    );
    assert_eq!(statement.params, vec![Some("Ann".to_owned()), None]);
    Ok(())
}

#[test]
fn delete_binds_key_with_its_type() -> Result<()> {
    let statement = sql::delete_by_key(
        "\"public\".\"people\"",
        &KeyMatch {
            column: "id".to_owned(),
            udt_name: "int4".to_owned(),
            value: "12".to_owned(),
        },
    )?;
    assert_eq!(
        statement.sql,
        "DELETE FROM \"public\".\"people\" WHERE \"id\" = $1::text::\"int4\""
    );
    assert_eq!(statement.preview(), "DELETE FROM \"public\".\"people\" WHERE \"id\" = '12'::text::\"int4\"");
    Ok(())
}

#[test]
fn create_table_adds_serial_key_and_quoted_text_columns() -> Result<()> {
    let statement = sql::create_table(
        "\"public\".\"notes\"",
        &["Field_1".to_owned(), "Field_2".to_owned()],
    )?;
    assert_eq!(
        statement.sql,
        "CREATE TABLE IF NOT EXISTS \"public\".\"notes\" \
         (id SERIAL PRIMARY KEY, \"Field_1\" TEXT, \"Field_2\" TEXT)"
    );

    let error = sql::create_table("\"public\".\"notes\"", &["bad-name".to_owned()])
        .expect_err("dash is not allowed");
    assert!(matches!(error, GridError::InvalidIdentifier(_)));
    Ok(())
}

#[test]
fn preview_renders_null_and_escapes_quotes() -> Result<()> {
    let statement = sql::count_matching(
        "\"public\".\"people\"",
        &people(),
        &[Some("1".to_owned()), Some("O'Hara".to_owned()), None],
    )?;
    let preview = statement.preview();
    assert!(preview.contains("'O''Hara'::text::\"text\""));
    assert!(preview.contains("NULL::text::\"numeric\""));
    assert!(!preview.contains('$'));
    Ok(())
}

#[test]
fn hostile_values_never_reach_sql_text() -> Result<()> {
    let hostile = "'); DROP TABLE people; --";
    let statement = sql::insert_row(
        "\"public\".\"people\"",
        &people(),
        &[None, Some(hostile.to_owned()), None],
    )?;
    assert!(!statement.sql.contains("DROP"));
    assert_eq!(statement.params[0].as_deref(), Some(hostile));
    Ok(())
}

#[test]
fn select_projects_every_column_as_text() -> Result<()> {
    let statement = sql::select_rows("\"s\".\"people\"", &people())?;
    assert_eq!(
        statement.sql,
        "SELECT \"id\"::text, \"name\"::text, \"score\"::text FROM \"s\".\"people\""
    );
    Ok(())
}
