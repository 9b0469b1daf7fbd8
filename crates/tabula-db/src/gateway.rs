// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::error::Error as _;
use std::time::Duration;

use postgres::types::ToSql;
use postgres::{Client, NoTls};
use tabula_app::{
    CatalogColumn, ColumnDescriptor, GridError, GridResult, KeyMatch, Row, TableBackend,
    validate_identifier,
};
use tracing::{debug, info};

use crate::connection::{ConnectionConfig, DEFAULT_SCHEMA};
use crate::schema;
use crate::sql::{self, Statement};

/// PostgreSQL access. Every operation opens its own connection and drops it
/// before returning.
#[derive(Clone)]
pub struct PgGateway {
    config: postgres::Config,
    schema: String,
    label: String,
}

impl std::fmt::Debug for PgGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgGateway")
            .field("target", &self.label)
            .field("schema", &self.schema)
            .finish()
    }
}

impl PgGateway {
    pub fn new(settings: &ConnectionConfig, connect_timeout: Duration) -> GridResult<Self> {
        validate_identifier(&settings.schema)?;
        Ok(Self {
            config: settings.to_pg_config(connect_timeout),
            schema: settings.schema.clone(),
            label: settings.describe(),
        })
    }

    /// Builds a gateway from a `postgres://` URL or key=value string.
    pub fn from_url(url: &str, schema: Option<&str>) -> GridResult<Self> {
        let config = url
            .parse::<postgres::Config>()
            .map_err(|error| GridError::Connection(format!("invalid connection string: {error}")))?;
        let schema = schema.unwrap_or(DEFAULT_SCHEMA);
        validate_identifier(schema)?;
        Ok(Self {
            config,
            schema: schema.to_owned(),
            label: "connection string".to_owned(),
        })
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    fn connect(&self) -> GridResult<Client> {
        self.config
            .connect(NoTls)
            .map_err(|error| GridError::Connection(format!("{}: {error}", self.label)))
    }

    fn qualified(&self, table: &str) -> GridResult<String> {
        sql::qualify(&self.schema, table)
    }

    pub fn execute(&self, sql: &str, params: &[Option<String>]) -> GridResult<u64> {
        let mut client = self.connect()?;
        client
            .execute(sql, &bind(params))
            .map_err(|error| classify(error, GridError::Persistence))
    }

    /// Runs a query whose result columns are all text. `NULL` reads as "".
    pub fn query(&self, sql: &str, params: &[Option<String>]) -> GridResult<Vec<Row>> {
        let mut client = self.connect()?;
        query_text(&mut client, sql, params)
    }

    pub fn scalar(&self, sql: &str, params: &[Option<String>]) -> GridResult<Option<String>> {
        Ok(self
            .query(sql, params)?
            .into_iter()
            .next()
            .and_then(|row| row.into_iter().next()))
    }

    pub fn ping(&self) -> GridResult<()> {
        self.scalar("SELECT 1::text", &[]).map(|_| ())
    }

    fn run(&self, statement: &Statement) -> GridResult<u64> {
        debug!(statement = %statement.preview(), "execute");
        self.execute(&statement.sql, &statement.params)
    }

    fn fetch(&self, statement: &Statement) -> GridResult<Vec<Row>> {
        debug!(statement = %statement.preview(), "query");
        self.query(&statement.sql, &statement.params)
    }

    fn catalog(&self, sql: &str, params: &[Option<String>]) -> GridResult<Vec<Row>> {
        self.query(sql, params).map_err(|error| match error {
            GridError::Persistence(message) => GridError::Schema(message),
            other => other,
        })
    }

    fn count(&self, statement: &Statement) -> GridResult<u64> {
        let raw = self
            .fetch(statement)?
            .into_iter()
            .next()
            .and_then(|row| row.into_iter().next())
            .unwrap_or_default();
        raw.parse::<u64>()
            .map_err(|_| GridError::Persistence(format!("unexpected count {raw:?}")))
    }
}

impl TableBackend for PgGateway {
    fn ping(&self) -> GridResult<()> {
        PgGateway::ping(self)
    }

    fn list_tables(&self) -> GridResult<Vec<String>> {
        let rows = self.catalog(schema::LIST_TABLES, &[Some(self.schema.clone())])?;
        Ok(rows
            .into_iter()
            .filter_map(|row| row.into_iter().next())
            .collect())
    }

    fn list_columns(&self, table: &str) -> GridResult<Vec<CatalogColumn>> {
        let rows = self.catalog(
            schema::LIST_COLUMNS,
            &[Some(self.schema.clone()), Some(table.to_owned())],
        )?;
        schema::parse_columns(rows)
    }

    fn primary_key(&self, table: &str) -> GridResult<Option<String>> {
        let rows = self.catalog(
            schema::PRIMARY_KEY,
            &[Some(self.schema.clone()), Some(table.to_owned())],
        )?;
        Ok(rows.into_iter().next().and_then(|row| row.into_iter().next()))
    }

    fn load_rows(&self, table: &str, columns: &[ColumnDescriptor]) -> GridResult<Vec<Row>> {
        let statement = sql::select_rows(&self.qualified(table)?, columns)?;
        self.fetch(&statement)
    }

    fn row_count(&self, table: &str) -> GridResult<u64> {
        self.count(&sql::count_rows(&self.qualified(table)?))
    }

    fn count_matching(
        &self,
        table: &str,
        columns: &[ColumnDescriptor],
        values: &[Option<String>],
    ) -> GridResult<u64> {
        let statement = sql::count_matching(&self.qualified(table)?, columns, values)?;
        self.count(&statement)
    }

    fn insert_row(
        &self,
        table: &str,
        columns: &[ColumnDescriptor],
        values: &[Option<String>],
    ) -> GridResult<Row> {
        let statement = sql::insert_row(&self.qualified(table)?, columns, values)?;
        self.fetch(&statement)?
            .into_iter()
            .next()
            .ok_or_else(|| GridError::Persistence(format!("insert into {table} returned no row")))
    }

    fn delete_by_key(&self, table: &str, key: &KeyMatch) -> GridResult<u64> {
        self.run(&sql::delete_by_key(&self.qualified(table)?, key)?)
    }

    fn replace_rows(
        &self,
        table: &str,
        columns: &[ColumnDescriptor],
        rows: &[Vec<Option<String>>],
    ) -> GridResult<usize> {
        let qualified = self.qualified(table)?;
        let clear = sql::delete_all(&qualified);
        let inserts = rows
            .iter()
            .map(|values| sql::insert_row(&qualified, columns, values))
            .collect::<GridResult<Vec<_>>>()?;

        let mut client = self.connect()?;
        let mut transaction = client
            .transaction()
            .map_err(|error| classify(error, GridError::Persistence))?;
        debug!(statement = %clear.preview(), "execute");
        transaction
            .execute(&clear.sql, &[])
            .map_err(|error| classify(error, GridError::Persistence))?;
        for insert in &inserts {
            debug!(statement = %insert.preview(), "execute");
            transaction
                .execute(&insert.sql, &bind(&insert.params))
                .map_err(|error| classify(error, GridError::Persistence))?;
        }
        transaction
            .commit()
            .map_err(|error| classify(error, GridError::Persistence))?;
        info!(table, rows = inserts.len(), "replaced table contents");
        Ok(inserts.len())
    }

    fn create_table(&self, table: &str, columns: &[String]) -> GridResult<()> {
        self.run(&sql::create_table(&self.qualified(table)?, columns)?)
            .map(|_| ())
    }

    fn drop_table(&self, table: &str) -> GridResult<()> {
        self.run(&sql::drop_table(&self.qualified(table)?)).map(|_| ())
    }
}

fn bind(params: &[Option<String>]) -> Vec<&(dyn ToSql + Sync)> {
    params
        .iter()
        .map(|param| param as &(dyn ToSql + Sync))
        .collect()
}

fn query_text(client: &mut Client, sql: &str, params: &[Option<String>]) -> GridResult<Vec<Row>> {
    let rows = client
        .query(sql, &bind(params))
        .map_err(|error| classify(error, GridError::Persistence))?;
    rows.iter()
        .map(|row| {
            (0..row.len())
                .map(|index| {
                    row.try_get::<_, Option<String>>(index)
                        .map(Option::unwrap_or_default)
                        .map_err(|error| classify(error, GridError::Persistence))
                })
                .collect::<GridResult<Row>>()
        })
        .collect()
}

/// Lost or refused connections become `Connection`; server-side errors take
/// `kind` with the server's message.
fn classify(error: postgres::Error, kind: fn(String) -> GridError) -> GridError {
    if error.is_closed() || error.source().is_some_and(|source| source.is::<std::io::Error>()) {
        return GridError::Connection(error.to_string());
    }
    match error.as_db_error() {
        Some(db_error) => match db_error.detail() {
            Some(detail) => kind(format!("{} ({detail})", db_error.message())),
            None => kind(db_error.message().to_owned()),
        },
        None => kind(error.to_string()),
    }
}
