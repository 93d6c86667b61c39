//! Command line front end.

mod batch;
mod repl;

use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::app::AnnotatorApp;
use crate::config::{AnnotatorConfig, LogLevel};

#[derive(Debug, Parser)]
#[command(name = "pollen-annotator")]
#[command(about = "Tile pollen slide scans and annotate pollen grains with bounding boxes")]
#[command(version)]
pub struct Cli {
    /// Configuration file (default: <config dir>/pollen-annotator/config.json)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level, overriding the configuration file
    #[arg(long, global = true, value_enum)]
    log_level: Option<LogLevel>,

    /// More verbose logging (repeatable)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Annotate crops interactively, resuming the saved session.
    Annotate {
        #[arg(value_name = "ROOT")]
        root: PathBuf,
    },
    /// List the crops of every probe directory.
    Tiles {
        #[arg(value_name = "ROOT")]
        root: PathBuf,
    },
    /// Write every crop of every probe directory as a PNG.
    Crops {
        #[arg(value_name = "ROOT")]
        root: PathBuf,
        /// Output directory (default: each probe directory's images/)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Export the saved session's boxes as CSV.
    Export {
        #[arg(value_name = "ROOT")]
        root: PathBuf,
        #[arg(value_name = "CSV")]
        output: PathBuf,
    },
    /// Check crop names and label tables for inconsistencies.
    Audit {
        #[arg(value_name = "ROOT")]
        root: PathBuf,
    },
    /// Print the effective configuration as JSON.
    Config,
}

pub fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    let config = AnnotatorConfig::load_or_default(cli.config.as_deref())
        .context("failed to load configuration")?;
    let level = cli.log_level.unwrap_or(config.log_level).raised(cli.verbose);
    init_logging(level);

    match cli.command {
        Commands::Annotate { root } => {
            let mut app = AnnotatorApp::open(&root, config)
                .with_context(|| format!("failed to open {}", root.display()))?;
            let stdin = std::io::stdin();
            repl::run(&mut app, stdin.lock(), std::io::stdout())
        }
        Commands::Tiles { root } => batch::run_tiles(&root, &config),
        Commands::Crops { root, output } => batch::run_crops(&root, output.as_deref(), &config),
        Commands::Export { root, output } => batch::run_export(&root, &output, &config),
        Commands::Audit { root } => batch::run_audit(&root, &config),
        Commands::Config => {
            println!("{}", config.to_json()?);
            Ok(())
        }
    }
}

/// Initialise `env_logger` at `level`; `RUST_LOG` still takes precedence.
fn init_logging(level: LogLevel) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level.to_level_filter());
    builder.parse_default_env();
    if builder.try_init().is_err() {
        log::debug!("Logger already initialised");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["pollen-annotator", "tiles", "/data", "-vv", "--log-level", "warn"]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.log_level, Some(LogLevel::Warn));
        assert!(matches!(cli.command, Commands::Tiles { .. }));
    }

    #[test]
    fn test_parse_export() {
        let cli = Cli::parse_from(["pollen-annotator", "--config", "c.json", "export", "/data", "out.csv"]);
        assert_eq!(cli.config, Some(PathBuf::from("c.json")));
        match cli.command {
            Commands::Export { root, output } => {
                assert_eq!(root, PathBuf::from("/data"));
                assert_eq!(output, PathBuf::from("out.csv"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
