//! CLI command definitions for layered-config
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;

/// Persistent tier selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TierArg {
    Primary,
    Secondary,
}

impl From<TierArg> for crate::resolver::StoreTier {
    fn from(tier: TierArg) -> Self {
        match tier {
            TierArg::Primary => crate::resolver::StoreTier::Primary,
            TierArg::Secondary => crate::resolver::StoreTier::Secondary,
        }
    }
}

/// Output format selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum FormatArg {
    #[default]
    Json,
    Markdown,
}

impl From<FormatArg> for crate::format::OutputFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Json => crate::format::OutputFormat::Json,
            FormatArg::Markdown => crate::format::OutputFormat::Markdown,
        }
    }
}

/// Layered per-key configuration store
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Storage key namespace (overrides config)
    #[arg(short, long, global = true)]
    pub namespace: Option<String>,

    /// Primary store directory (overrides config)
    #[arg(long, global = true)]
    pub primary_dir: Option<String>,

    /// Secondary store database file (overrides config)
    #[arg(long, global = true)]
    pub secondary_db: Option<String>,

    /// Run without the primary store
    #[arg(long, global = true)]
    pub no_primary: bool,

    /// Run without the secondary store
    #[arg(long, global = true)]
    pub no_secondary: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = FormatArg::Json, global = true)]
    pub format: FormatArg,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Read a value through the priority chain
    Get {
        /// Dotted path, e.g. media.volume
        path: String,

        /// Read a single persistent tier instead of the whole chain
        #[arg(long, value_enum)]
        from: Option<TierArg>,

        /// Report which tier answered
        #[arg(long)]
        source: bool,
    },

    /// Write a value
    Set {
        /// Dotted path, e.g. media.volume
        path: String,

        /// Value as JSON; anything that is not valid JSON is taken as a string
        value: String,

        /// Write to a single persistent tier, with no fallback
        #[arg(long, value_enum)]
        to: Option<TierArg>,
    },

    /// List persisted entries per tier and the default tree
    List {
        /// Only list one persistent tier
        #[arg(long, value_enum)]
        tier: Option<TierArg>,
    },

    /// Remove this namespace's persisted entries
    Clear {
        /// Only clear one persistent tier
        #[arg(long, value_enum)]
        tier: Option<TierArg>,
    },

    /// Show the storage key for a path
    Key {
        /// Dotted path, e.g. media.volume
        path: String,
    },
}

/// Interpret a command-line value: JSON when it parses, a plain string
/// otherwise.
pub fn parse_value_arg(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn value_args_prefer_json() {
        assert_eq!(parse_value_arg("0.5"), json!(0.5));
        assert_eq!(parse_value_arg("true"), json!(true));
        assert_eq!(parse_value_arg("{\"a\":[1]}"), json!({"a": [1]}));
        assert_eq!(parse_value_arg("space"), json!("space"));
        assert_eq!(parse_value_arg("null"), Value::Null);
    }

    #[test]
    fn parses_set_with_tier() {
        let cli = Cli::try_parse_from([
            "layered-config",
            "--no-primary",
            "set",
            "media.volume",
            "0.5",
            "--to",
            "secondary",
        ])
        .unwrap();
        assert!(cli.no_primary);
        match cli.command {
            Command::Set { path, value, to } => {
                assert_eq!(path, "media.volume");
                assert_eq!(value, "0.5");
                assert_eq!(to, Some(TierArg::Secondary));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["layered-config", "list", "--format", "markdown"]).unwrap();
        assert_eq!(cli.format, FormatArg::Markdown);
        assert!(matches!(cli.command, Command::List { tier: None }));
    }
}
