// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use std::fs;
use std::io::{BufRead, Write};
use std::path::Path;
use tabula_db::{ConnectionConfig, PgGateway};
use tracing::{info, warn};

use crate::config::Config;

/// Reads the settings file, or prompts and writes it when absent. With
/// `reconfigure` set the existing file is discarded first.
pub fn resolve_settings<R: BufRead, W: Write>(
    path: &Path,
    reconfigure: bool,
    input: &mut R,
    output: &mut W,
) -> Result<ConnectionConfig> {
    if reconfigure && path.exists() {
        fs::remove_file(path)
            .with_context(|| format!("remove connection settings {}", path.display()))?;
        info!(path = %path.display(), "discarded connection settings");
    }

    if let Some(settings) = ConnectionConfig::load(path)? {
        return Ok(settings);
    }

    writeln!(output, "connection settings ({})", path.display()).context("write prompt")?;
    let settings = ConnectionConfig::prompt(input, output)?;
    settings.write(path)?;
    info!(path = %path.display(), target = %settings.describe(), "saved connection settings");
    Ok(settings)
}

fn apply_overrides(config: &Config, mut settings: ConnectionConfig) -> ConnectionConfig {
    if let Some(schema) = config.schema() {
        settings.schema = schema.to_owned();
    }
    settings
}

/// `None` means the user declined to reconfigure after a failed ping and
/// the caller should fall back to offline mode.
pub fn connect<R: BufRead, W: Write>(
    config: &Config,
    mut reconfigure: bool,
    input: &mut R,
    output: &mut W,
) -> Result<Option<PgGateway>> {
    let path = config.settings_path()?;
    let timeout = config.connect_timeout()?;
    loop {
        let settings = apply_overrides(config, resolve_settings(&path, reconfigure, input, output)?);
        let gateway = PgGateway::new(&settings, timeout)
            .with_context(|| format!("connection settings in {}", path.display()))?;

        match gateway.ping() {
            Ok(()) => {
                info!(target = %settings.describe(), schema = %settings.schema, "connected");
                return Ok(Some(gateway));
            }
            Err(error) => {
                warn!(target = %settings.describe(), %error, "connection check failed");
                writeln!(output, "{error}").context("write prompt")?;
                if ask_yes_no(input, output, "reconfigure connection settings?")? {
                    reconfigure = true;
                    continue;
                }
                return Ok(None);
            }
        }
    }
}

/// Non-interactive variant for `--check`.
pub fn check(config: &Config) -> Result<String> {
    let path = config.settings_path()?;
    let Some(settings) = ConnectionConfig::load(&path)? else {
        bail!(
            "no connection settings at {}; run tabula once to create them",
            path.display()
        );
    };
    let settings = apply_overrides(config, settings);
    let gateway = PgGateway::new(&settings, config.connect_timeout()?)?;
    gateway
        .ping()
        .with_context(|| format!("connect with settings from {}", path.display()))?;
    Ok(settings.describe())
}

/// End of input counts as no.
pub fn ask_yes_no<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    question: &str,
) -> Result<bool> {
    loop {
        write!(output, "{question} [y/n]: ").context("write prompt")?;
        output.flush().context("flush prompt")?;
        let mut answer = String::new();
        if input.read_line(&mut answer).context("read answer")? == 0 {
            return Ok(false);
        }
        match answer.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            _ => {}
        }
    }
}
