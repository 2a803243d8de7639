// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod runtime;

use anyhow::{Context, Result, anyhow};
use carebase_app::AppState;
use carebase_db::Store;
use config::Config;
use runtime::DbRuntime;
use std::env;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

const MEMORY_DB: &str = ":memory:";

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
            "load config {}; run `carebase --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;

    let db_path = if options.demo {
        PathBuf::from(MEMORY_DB)
    } else {
        config.db_path()?
    };
    if options.print_db_path {
        println!("{}", db_path.display());
        return Ok(());
    }

    let log_path = init_logging(&config)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        db = %db_path.display(),
        log = %log_path.display(),
        demo = options.demo,
        "starting carebase"
    );

    let store = if options.demo {
        Store::open_memory()?
    } else {
        Store::open(&db_path).with_context(|| {
            format!(
                "open database {} -- if this path is wrong, set [storage].db_path or CAREBASE_DB_PATH",
                db_path.display()
            )
        })?
    };
    store.bootstrap()?;
    if options.demo {
        store.seed_demo_data()?;
    }

    if options.check_only {
        info!("startup check passed");
        return Ok(());
    }

    let mut state = AppState::default();
    let mut runtime = DbRuntime::new(&store);
    let result = carebase_tui::run_app(&mut state, &mut runtime, config.table_options());
    info!("carebase exited");
    result
}

/// Routes `tracing` output to the log file; the terminal belongs to the TUI.
fn init_logging(config: &Config) -> Result<PathBuf> {
    let path = config.log_path()?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("open log file {}", path.display()))?;

    let rust_log = env::var("RUST_LOG").ok();
    let filter = log_filter(rust_log.as_deref(), config.log_level(), &path)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|error| anyhow!("initialize logging: {error}"))?;
    Ok(path)
}

fn log_filter(rust_log: Option<&str>, level: &str, log_path: &Path) -> Result<EnvFilter> {
    match rust_log.map(str::trim).filter(|directives| !directives.is_empty()) {
        Some(directives) => EnvFilter::try_new(directives)
            .with_context(|| format!("invalid RUST_LOG filter {directives:?}")),
        None => EnvFilter::try_new(level).with_context(|| {
            format!(
                "invalid log.level {level:?} for {}; use a filter such as \"info\"",
                log_path.display()
            )
        }),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    print_db_path: bool,
    demo: bool,
    print_example: bool,
    check_only: bool,
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
        print_db_path: false,
        demo: false,
        print_example: false,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-path" => {
                options.print_db_path = true;
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
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("carebase - hospital records in the terminal");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-path             Print resolved database path");
    println!("  --print-example-config   Print a config template");
    println!("  --demo                   Launch with demo accounts and records (in-memory)");
    println!("  --check                  Validate config and database, then exit");
    println!("  --help                   Show this help");
}

#[cfg(test)]
mod tests {
    use super::{CliOptions, log_filter, parse_cli_args};
    use anyhow::Result;
    use std::path::{Path, PathBuf};

    fn default_options_path() -> PathBuf {
        PathBuf::from("/tmp/carebase-config.toml")
    }

    #[test]
    fn parse_cli_args_defaults_to_provided_config_path() -> Result<()> {
        let options = parse_cli_args(Vec::<String>::new(), default_options_path())?;
        assert_eq!(
            options,
            CliOptions {
                config_path: default_options_path(),
                print_config_path: false,
                print_db_path: false,
                demo: false,
                print_example: false,
                check_only: false,
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
        let error = parse_cli_args(vec!["--ward"], default_options_path())
            .expect_err("unknown arg should fail");
        let message = error.to_string();
        assert!(message.contains("unknown argument"));
        assert!(message.contains("--help"));
    }

    #[test]
    fn parse_cli_args_sets_demo_check_and_print_flags() -> Result<()> {
        let options = parse_cli_args(
            vec!["--demo", "--check", "--print-path", "-h"],
            default_options_path(),
        )?;
        assert!(options.demo);
        assert!(options.check_only);
        assert!(options.print_db_path);
        assert!(options.show_help);
        assert!(!options.print_example);
        assert!(!options.print_config_path);
        Ok(())
    }

    #[test]
    fn rust_log_overrides_configured_level() -> Result<()> {
        let path = Path::new("/tmp/carebase.log");
        let filter = log_filter(Some("carebase_db=trace"), "info", path)?;
        assert_eq!(filter.to_string(), "carebase_db=trace");

        let filter = log_filter(Some("  "), "warn", path)?;
        assert_eq!(filter.to_string(), "warn");

        let filter = log_filter(None, "debug", path)?;
        assert_eq!(filter.to_string(), "debug");
        Ok(())
    }

    #[test]
    fn invalid_log_level_is_reported() {
        let error = log_filter(None, "carebase=loud", Path::new("/tmp/carebase.log"))
            .expect_err("bad directive should fail");
        assert!(error.to_string().contains("invalid log.level"));
    }
}
