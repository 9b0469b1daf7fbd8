// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod demo;
mod logging;
mod setup;

use anyhow::{Context, Result};
use config::Config;
use std::env;
use std::io;
use std::path::PathBuf;
use tabula_app::{AppState, Shell, Translations};
use tracing::info;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `tabula --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;
    let log_path = logging::init(&config).context("set up logging")?;
    info!(log = %log_path.display(), config = %options.config_path.display(), "starting");

    if options.check_only {
        let target = setup::check(&config)?;
        println!("ok: {target}");
        return Ok(());
    }

    let (translations, translation_notice) =
        Translations::load_or_empty(&config.translations_path());
    let mut notices = Vec::new();
    notices.extend(translation_notice);

    let mut shell = if options.demo {
        let mut shell = Shell::new(Box::new(demo::backend()?), translations);
        shell.load_tables().context("load demo tables")?;
        shell
    } else {
        open_shell(&config, options.reconfigure, translations, &mut notices)?
    };
    shell.set_edit_mode(config.edit_mode());
    if shell.tables().is_empty() {
        notices.push("no tables found; press n to create one".to_owned());
    }

    let mut state = AppState::default();
    tabula_tui::run_app(&mut state, &mut shell, &notices)
}

fn open_shell(
    config: &Config,
    reconfigure: bool,
    translations: Translations,
    notices: &mut Vec<String>,
) -> Result<Shell> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();
    let Some(gateway) = setup::connect(config, reconfigure, &mut input, &mut output)? else {
        return Shell::offline_fallback(translations).context("build offline table");
    };

    let label = gateway.label().to_owned();
    let mut shell = Shell::new(Box::new(gateway), translations);
    let report = shell
        .load_tables()
        .with_context(|| format!("load tables from {label}"))?;
    if !report.skipped.is_empty() {
        notices.push(report.notice().message());
    }
    Ok(shell)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    demo: bool,
    print_example: bool,
    check_only: bool,
    reconfigure: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        print_config_path: false,
        demo: false,
        print_example: false,
        check_only: false,
        reconfigure: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--reconfigure" => {
                options.reconfigure = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow::anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    if options.demo && options.reconfigure {
        return Err(anyhow::anyhow!(
            "--demo does not use connection settings; drop --reconfigure"
        ));
    }

    Ok(options)
}

fn print_help() {
    println!("tabula: edit PostgreSQL tables from the terminal");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --demo                   Launch with seeded demo tables (in-memory)");
    println!("  --check                  Validate config + connection settings + connectivity");
    println!("  --reconfigure            Discard saved connection settings and prompt again");
    println!("  --help                   Show this help");
}

#[cfg(test)]
mod tests {
    use super::{CliOptions, parse_cli_args};
    use anyhow::Result;
    use std::path::PathBuf;

    fn default_options_path() -> PathBuf {
        PathBuf::from("/tmp/tabula-config.toml")
    }

    #[test]
    fn parse_cli_args_defaults_to_provided_config_path() -> Result<()> {
        let options = parse_cli_args(Vec::<String>::new(), default_options_path())?;
        assert_eq!(
            options,
            CliOptions {
                config_path: default_options_path(),
                print_config_path: false,
                demo: false,
                print_example: false,
                check_only: false,
                reconfigure: false,
                show_help: false,
            }
        );
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_config_path_override() -> Result<()> {
        let options = parse_cli_args(
            vec!["--config", "/custom/config.toml"],
            default_options_path(),
        )?;
        assert_eq!(options.config_path, PathBuf::from("/custom/config.toml"));
        Ok(())
    }

    #[test]
    fn parse_cli_args_errors_for_missing_config_value() {
        let error = parse_cli_args(vec!["--config"], default_options_path())
            .expect_err("missing config value should fail");
        assert!(error.to_string().contains("--config requires a file path"));
    }

    #[test]
    fn parse_cli_args_errors_for_unknown_argument() {
        let error = parse_cli_args(vec!["--wat"], default_options_path())
            .expect_err("unknown arg should fail");
        let message = error.to_string();
        assert!(message.contains("unknown argument"));
        assert!(message.contains("--help"));
    }

    #[test]
    fn parse_cli_args_sets_print_check_and_reconfigure_flags() -> Result<()> {
        let options = parse_cli_args(
            vec![
                "--print-config-path",
                "--print-example-config",
                "--check",
                "--reconfigure",
            ],
            default_options_path(),
        )?;
        assert!(options.print_config_path);
        assert!(options.print_example);
        assert!(options.check_only);
        assert!(options.reconfigure);
        assert!(!options.demo);
        assert!(!options.show_help);
        Ok(())
    }

    #[test]
    fn parse_cli_args_rejects_demo_with_reconfigure() {
        let error = parse_cli_args(vec!["--demo", "--reconfigure"], default_options_path())
            .expect_err("demo has no settings to reconfigure");
        assert!(error.to_string().contains("--demo"));
    }

    #[test]
    fn parse_cli_args_sets_help_flag_for_long_and_short_variants() -> Result<()> {
        let long = parse_cli_args(vec!["--help"], default_options_path())?;
        assert!(long.show_help);

        let short = parse_cli_args(vec!["-h"], default_options_path())?;
        assert!(short.show_help);
        Ok(())
    }
}
