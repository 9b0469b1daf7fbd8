// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! The `key=value` connection settings file.
//!
//! ```text
//! # written on first run
//! Server=localhost
//! Port=5432
//! DatabaseName=postgres
//! UserLogin=postgres
//! UserPassword=
//! Schema=public
//! ```

use anyhow::{Context, Result, anyhow, bail};
use std::env;
use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::APP_NAME;

pub const DEFAULT_SCHEMA: &str = "public";
const SETTINGS_FILE: &str = "connection.conf";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub server: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    pub schema: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            server: "localhost".to_owned(),
            port: 5432,
            database: "postgres".to_owned(),
            user: "postgres".to_owned(),
            password: String::new(),
            schema: DEFAULT_SCHEMA.to_owned(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SettingKey {
    Server,
    Port,
    DatabaseName,
    UserLogin,
    UserPassword,
    Schema,
}

impl SettingKey {
    const REQUIRED: [Self; 5] = [
        Self::Server,
        Self::Port,
        Self::DatabaseName,
        Self::UserLogin,
        Self::UserPassword,
    ];

    fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "server" => Some(Self::Server),
            "port" => Some(Self::Port),
            "databasename" => Some(Self::DatabaseName),
            "userlogin" => Some(Self::UserLogin),
            "userpassword" => Some(Self::UserPassword),
            "schema" => Some(Self::Schema),
            _ => None,
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Server => "Server",
            Self::Port => "Port",
            Self::DatabaseName => "DatabaseName",
            Self::UserLogin => "UserLogin",
            Self::UserPassword => "UserPassword",
            Self::Schema => "Schema",
        }
    }
}

impl ConnectionConfig {
    pub fn parse(raw: &str) -> Result<Self> {
        let mut config = Self::default();
        let mut seen = Vec::new();
        for (index, line) in raw.lines().enumerate() {
            let line_number = index + 1;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let (key, value) = trimmed
                .split_once('=')
                .ok_or_else(|| anyhow!("line {line_number}: expected key=value, got {trimmed:?}"))?;
            let key = SettingKey::parse(key.trim()).ok_or_else(|| {
                anyhow!(
                    "line {line_number}: unknown key {:?}; expected one of Server, Port, DatabaseName, UserLogin, UserPassword, Schema",
                    key.trim()
                )
            })?;
            let value = value.trim().to_owned();
            match key {
                SettingKey::Server => config.server = value,
                SettingKey::Port => {
                    config.port = parse_port(&value)
                        .with_context(|| format!("line {line_number}: invalid Port"))?;
                }
                SettingKey::DatabaseName => config.database = value,
                SettingKey::UserLogin => config.user = value,
                SettingKey::UserPassword => config.password = value,
                SettingKey::Schema => config.schema = value,
            }
            seen.push(key);
        }

        let missing = SettingKey::REQUIRED
            .iter()
            .filter(|key| !seen.contains(key))
            .map(|key| key.as_str())
            .collect::<Vec<_>>();
        if !missing.is_empty() {
            bail!("missing connection settings: {}", missing.join(", "));
        }
        if !tabula_app::is_safe_identifier(&config.schema) {
            bail!(
                "Schema {:?} is not a plain identifier; use letters, digits and underscores",
                config.schema
            );
        }
        Ok(config)
    }

    pub fn render(&self) -> String {
        format!(
            "# {APP_NAME} connection settings\nServer={}\nPort={}\nDatabaseName={}\nUserLogin={}\nUserPassword={}\nSchema={}\n",
            self.server, self.port, self.database, self.user, self.password, self.schema
        )
    }

    /// `Ok(None)` when the file does not exist yet.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read connection settings {}", path.display()))?;
        Self::parse(&raw)
            .with_context(|| format!("invalid connection settings in {}", path.display()))
            .map(Some)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("create directory {}", parent.display()))?;
        }
        fs::write(path, self.render())
            .with_context(|| format!("write connection settings {}", path.display()))
    }

    /// Asks for each setting on `output`, reading answers from `input`.
    /// A blank answer or end of input keeps the shown default.
    pub fn prompt<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<Self> {
        let defaults = Self::default();
        let server = ask(input, output, "Server address", &defaults.server)?;
        let port = loop {
            let answer = ask(input, output, "Port", &defaults.port.to_string())?;
            match parse_port(&answer) {
                Ok(port) => break port,
                Err(error) => writeln!(output, "{error:#}").context("write prompt")?,
            }
        };
        let database = ask(input, output, "Database name", &defaults.database)?;
        let user = ask(input, output, "Login", &defaults.user)?;
        let password = ask(input, output, "Password", &defaults.password)?;

        Ok(Self {
            server,
            port,
            database,
            user,
            password,
            schema: defaults.schema,
        })
    }

    pub fn to_pg_config(&self, connect_timeout: Duration) -> postgres::Config {
        let mut config = postgres::Config::new();
        config
            .host(&self.server)
            .port(self.port)
            .dbname(&self.database)
            .user(&self.user)
            .password(&self.password)
            .application_name(APP_NAME)
            .connect_timeout(connect_timeout);
        config
    }

    /// `user@server:port/database`, without the password.
    pub fn describe(&self) -> String {
        format!(
            "{}@{}:{}/{}",
            self.user, self.server, self.port, self.database
        )
    }
}

pub fn default_settings_path() -> Result<PathBuf> {
    if let Some(override_path) = env::var_os("TABULA_CONNECTION_PATH") {
        return Ok(PathBuf::from(override_path));
    }
    let config_root = dirs::config_dir().ok_or_else(|| {
        anyhow!("cannot resolve config directory; set TABULA_CONNECTION_PATH to a writable path")
    })?;
    Ok(config_root.join(APP_NAME).join(SETTINGS_FILE))
}

fn parse_port(raw: &str) -> Result<u16> {
    let port = raw
        .trim()
        .parse::<u16>()
        .with_context(|| format!("port must be a number between 1 and 65535, got {raw:?}"))?;
    if port == 0 {
        bail!("port must be a number between 1 and 65535, got {raw:?}");
    }
    Ok(port)
}

fn ask<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    label: &str,
    default: &str,
) -> Result<String> {
    write!(output, "{label} [{default}]: ").context("write prompt")?;
    output.flush().context("flush prompt")?;
    let mut line = String::new();
    input.read_line(&mut line).context("read answer")?;
    let answer = line.trim();
    Ok(if answer.is_empty() {
        default.to_owned()
    } else {
        answer.to_owned()
    })
}
