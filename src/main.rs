//! layered-config
//!
//! Command-line access to a layered per-key configuration: reads resolve
//! through the primary store, the secondary store and the default tree.

use anyhow::{Result, bail};
use clap::Parser;
use layered_config::cli::{Cli, Command, parse_value_arg};
use layered_config::config::ConfigLoader;
use layered_config::format::{
    OutputFormat, format_entries_markdown, format_listing_markdown, format_resolved_markdown,
};
use layered_config::logging::{LogLevelFilter, Logger};
use layered_config::{ConfigResolver, StoreTier};
use serde::Serialize;
use serde_json::{Value, json};
use std::fs::OpenOptions;
use std::sync::Arc;
use tracing::{Level, debug};
use tracing_subscriber::FmtSubscriber;

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run(cli: &Cli, resolver: &mut ConfigResolver) -> Result<()> {
    let format: OutputFormat = cli.format.into();

    match &cli.command {
        Command::Get { path, from, source } => {
            let resolved = match from {
                Some(tier) => {
                    let tier: StoreTier = (*tier).into();
                    resolver.get_from(tier, path).map(|value| layered_config::Resolved {
                        source: tier.into(),
                        value,
                    })
                }
                None => resolver.resolve(path),
            };
            match (format, resolved) {
                (OutputFormat::Json, Some(resolved)) if *source => print_json(&resolved)?,
                (OutputFormat::Json, Some(resolved)) => print_json(&resolved.value)?,
                (OutputFormat::Json, None) => print_json(&Value::Null)?,
                (OutputFormat::Markdown, Some(resolved)) => {
                    print!("{}", format_resolved_markdown(path, &resolved))
                }
                (OutputFormat::Markdown, None) => println!("- **{}**: _unset_", path),
            }
        }
        Command::Set { path, value, to } => {
            let value = parse_value_arg(value);
            let persisted = match to {
                Some(tier) => match layered_config::ConfigValue::try_from(value) {
                    Ok(value) => resolver.set_in((*tier).into(), path, value),
                    Err(e) => bail!("invalid value for {}: {}", path, e),
                },
                None => resolver.set_json(path, value),
            };
            match format {
                OutputFormat::Json => print_json(&json!({"path": path, "persisted": persisted}))?,
                OutputFormat::Markdown if persisted => println!("Saved **{}**.", path),
                OutputFormat::Markdown => println!("**{}** was not persisted.", path),
            }
            if !persisted {
                bail!("no store accepted the value for {}", path);
            }
        }
        Command::List { tier } => match (format, tier) {
            (OutputFormat::Json, Some(tier)) => print_json(&resolver.list_tier((*tier).into()))?,
            (OutputFormat::Json, None) => print_json(&resolver.list())?,
            (OutputFormat::Markdown, Some(tier)) => {
                let tier: StoreTier = (*tier).into();
                print!(
                    "{}",
                    format_entries_markdown(&tier.to_string(), &resolver.list_tier(tier))
                );
            }
            (OutputFormat::Markdown, None) => print!("{}", format_listing_markdown(&resolver.list())),
        },
        Command::Clear { tier } => {
            let cleared: Vec<StoreTier> = match tier {
                Some(tier) => vec![(*tier).into()],
                None => vec![StoreTier::Primary, StoreTier::Secondary],
            };
            for tier in &cleared {
                resolver.clear_tier(*tier);
            }
            let namespace = resolver.codec().namespace();
            match format {
                OutputFormat::Json => {
                    print_json(&json!({"namespace": namespace, "cleared": cleared}))?
                }
                OutputFormat::Markdown => {
                    let names: Vec<String> = cleared.iter().map(|t| t.to_string()).collect();
                    println!("Cleared `{}` entries from {}.", namespace, names.join(" and "));
                }
            }
        }
        Command::Key { path } => {
            let Some(key) = resolver.key_for(path) else {
                bail!("invalid path: {:?}", path);
            };
            match format {
                OutputFormat::Json => print_json(&json!({"path": path, "key": key.as_str()}))?,
                OutputFormat::Markdown => println!("`{}` → `{}`", path, key),
            }
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on --log option
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    match cli.log.as_str() {
        "0" | "off" => {
            // No logging
        }
        "1" | "stdout" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stdout)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        "2" | "stderr" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        filename => {
            // Log to file (append mode)
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(filename)?;
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(file)
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }

    // An explicit config file is picked up by the loader through the environment
    // SAFETY: single-threaded at this point, before any store is opened
    if let Some(config_path) = &cli.config {
        unsafe {
            std::env::set_var("LAYERED_CONFIG_PATH", config_path);
        }
    }
    let mut loader = ConfigLoader::load()?;
    if let Some(path) = loader.config_path() {
        debug!(path = %path.display(), "using config file");
    }

    // CLI overrides
    let config = loader.config_mut();
    if let Some(namespace) = &cli.namespace {
        config.namespace = namespace.clone();
    }
    if let Some(dir) = &cli.primary_dir {
        config.primary.dir = dir.into();
    }
    if let Some(db_path) = &cli.secondary_db {
        config.secondary.db_path = db_path.into();
    }
    if cli.no_primary {
        config.primary.enabled = false;
    }
    if cli.no_secondary {
        config.secondary.enabled = false;
    }

    let defaults = loader.load_defaults()?;
    let config = loader.config();
    let level_filter = Arc::new(LogLevelFilter::new(config.log_level));
    let logger = Logger::new().with_level_filter(level_filter);

    let mut resolver = ConfigResolver::open(config, defaults, &logger);
    run(&cli, &mut resolver)
}
