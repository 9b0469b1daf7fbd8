// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod connection;
pub mod gateway;
pub mod schema;
pub mod sql;

pub use connection::{ConnectionConfig, DEFAULT_SCHEMA, default_settings_path};
pub use gateway::PgGateway;

pub const APP_NAME: &str = "tabula";
