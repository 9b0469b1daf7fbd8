// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tabula_app::{DEFAULT_TRANSLATIONS_FILE, EditMode, is_safe_identifier};

const CONFIG_VERSION: i64 = 1;
const DEFAULT_CONNECT_TIMEOUT: &str = "5s";
const DEFAULT_LOG_LEVEL: &str = "info";
const LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub connection: Connection,
    #[serde(default)]
    pub ui: Ui,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            connection: Connection::default(),
            ui: Ui::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Connection {
    pub settings_path: Option<String>,
    pub schema: Option<String>,
    pub connect_timeout: Option<String>,
}

impl Default for Connection {
    fn default() -> Self {
        Self {
            settings_path: None,
            schema: None,
            connect_timeout: Some(DEFAULT_CONNECT_TIMEOUT.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ui {
    pub translations_path: Option<String>,
    /// Keep inserts and deletes in the grid until the table is saved.
    pub staged_edits: Option<bool>,
}

impl Default for Ui {
    fn default() -> Self {
        Self {
            translations_path: Some(DEFAULT_TRANSLATIONS_FILE.to_owned()),
            staged_edits: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    pub level: Option<String>,
    pub file: Option<String>,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            level: Some(DEFAULT_LOG_LEVEL.to_owned()),
            file: None,
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("TABULA_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set TABULA_CONFIG_PATH to the config file")
        })?;
        Ok(config_root.join(tabula_db::APP_NAME).join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} has no version; add `version = 1` and put values under [connection], [ui], and [log]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(schema) = &self.connection.schema
            && !is_safe_identifier(schema)
        {
            bail!(
                "connection.schema in {} must use letters, digits and underscores, got {:?}",
                path.display(),
                schema
            );
        }

        if let Some(timeout) = &self.connection.connect_timeout {
            let parsed = parse_duration(timeout)?;
            if parsed <= Duration::ZERO {
                bail!(
                    "connection.connect_timeout in {} must be positive, got {}",
                    path.display(),
                    timeout
                );
            }
        }

        if let Some(level) = &self.log.level
            && !LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str())
        {
            bail!(
                "log.level in {} must be one of {}, got {:?}",
                path.display(),
                LOG_LEVELS.join(", "),
                level
            );
        }

        Ok(())
    }

    pub fn settings_path(&self) -> Result<PathBuf> {
        match &self.connection.settings_path {
            Some(path) => Ok(PathBuf::from(path)),
            None => tabula_db::default_settings_path(),
        }
    }

    /// Overrides the schema stored in the connection settings file.
    pub fn schema(&self) -> Option<&str> {
        self.connection.schema.as_deref()
    }

    pub fn connect_timeout(&self) -> Result<Duration> {
        parse_duration(
            self.connection
                .connect_timeout
                .as_deref()
                .unwrap_or(DEFAULT_CONNECT_TIMEOUT),
        )
    }

    pub fn translations_path(&self) -> PathBuf {
        PathBuf::from(
            self.ui
                .translations_path
                .as_deref()
                .unwrap_or(DEFAULT_TRANSLATIONS_FILE),
        )
    }

    pub fn edit_mode(&self) -> EditMode {
        if self.ui.staged_edits.unwrap_or(false) {
            EditMode::Staged
        } else {
            EditMode::Direct
        }
    }

    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_file(&self) -> Result<PathBuf> {
        if let Some(path) = &self.log.file {
            return Ok(PathBuf::from(path));
        }
        let root = dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .ok_or_else(|| anyhow!("cannot resolve a log directory; set [log].file"))?;
        Ok(root.join(tabula_db::APP_NAME).join("tabula.log"))
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# tabula config\n# Place this file at: {}\n\nversion = 1\n\n[connection]\n# Optional. Default is the platform config dir (for example ~/.config/tabula/connection.conf)\n# settings_path = \"/absolute/path/to/connection.conf\"\n# Optional. Overrides Schema= in the settings file\n# schema = \"public\"\nconnect_timeout = \"{}\"\n\n[ui]\ntranslations_path = \"{}\"\n# Optional. Keep adds and deletes in the grid until saved with `s`\n# staged_edits = true\n\n[log]\nlevel = \"{}\"\n# file = \"/absolute/path/to/tabula.log\"\n",
            path.display(),
            DEFAULT_CONNECT_TIMEOUT,
            DEFAULT_TRANSLATIONS_FILE,
            DEFAULT_LOG_LEVEL,
        )
    }
}

fn parse_duration(raw: &str) -> Result<Duration> {
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(mins * 60));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 500ms or 5s)")
}
