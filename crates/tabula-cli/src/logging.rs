// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use std::env;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

/// The terminal belongs to the TUI, so events go to a file.
pub fn init(config: &Config) -> Result<PathBuf> {
    let path = config.log_file()?;
    let file = open_log_file(&path)?;
    let filter = build_filter(config.log_level(), env::var("RUST_LOG").ok().as_deref())?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(Mutex::new(file)),
        )
        .try_init()
        .map_err(|error| anyhow!("install log subscriber: {error}"))?;
    Ok(path)
}

/// `RUST_LOG` wins over the configured level when it parses.
fn build_filter(level: &str, rust_log: Option<&str>) -> Result<EnvFilter> {
    if let Some(directives) = rust_log.filter(|raw| !raw.trim().is_empty())
        && let Ok(filter) = EnvFilter::try_new(directives)
    {
        return Ok(filter);
    }
    EnvFilter::try_new(level).with_context(|| format!("invalid log level {level:?}"))
}

fn open_log_file(path: &Path) -> Result<fs::File> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create log directory {}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::{build_filter, open_log_file};
    use anyhow::Result;

    #[test]
    fn configured_level_is_used_without_rust_log() -> Result<()> {
        let filter = build_filter("debug", None)?;
        assert_eq!(filter.to_string(), "debug");
        Ok(())
    }

    #[test]
    fn rust_log_overrides_configured_level() -> Result<()> {
        let filter = build_filter("info", Some("tabula_db=trace"))?;
        assert_eq!(filter.to_string(), "tabula_db=trace");
        Ok(())
    }

    #[test]
    fn blank_rust_log_falls_back_to_config() -> Result<()> {
        let filter = build_filter("warn", Some("  "))?;
        assert_eq!(filter.to_string(), "warn");
        Ok(())
    }

    #[test]
    fn log_file_parent_is_created() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("nested").join("tabula.log");
        open_log_file(&path)?;
        assert!(path.exists());
        Ok(())
    }
}
