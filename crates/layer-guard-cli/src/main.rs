//! layer-guard CLI tool.
//!
//! Usage:
//! ```bash
//! layer-guard check [OPTIONS] [PATH]
//! layer-guard debug-layer [LAYER]
//! layer-guard list-collectors
//! layer-guard init
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config_resolver;

use commands::check::CheckOptions;

/// Architectural layer enforcement for PHP projects
#[derive(Parser)]
#[command(name = "layer-guard")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check dependencies against the ruleset
    Check {
        /// Project root (default: current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Abort on the first file that fails to parse
        #[arg(long)]
        fail_fast: bool,

        /// Exit non-zero on uncovered dependencies too
        #[arg(long)]
        fail_on_uncovered: bool,

        /// List uncovered dependencies
        #[arg(long)]
        report_uncovered: bool,

        /// List allowed dependencies
        #[arg(long)]
        report_allowed: bool,
    },

    /// List the symbols collected into a layer (default: every layer)
    DebugLayer {
        /// Layer name
        layer: Option<String>,

        /// Project root
        #[arg(long, default_value = ".")]
        path: PathBuf,
    },

    /// List available collector types
    ListCollectors,

    /// Initialize configuration file
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },
}

/// Output format for check results.
#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output.
    Json,
    /// One-line-per-record compact format.
    Compact,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Check {
            path,
            format,
            fail_fast,
            fail_on_uncovered,
            report_uncovered,
            report_allowed,
        } => {
            let source = config_resolver::resolve(&path, cli.config.as_deref());
            let options = CheckOptions {
                format,
                fail_fast,
                fail_on_uncovered,
                report_uncovered,
                report_allowed,
            };
            if !commands::check::run(&path, &source, options)? {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::DebugLayer { layer, path } => {
            let source = config_resolver::resolve(&path, cli.config.as_deref());
            commands::debug_layer::run(&path, &source, layer.as_deref())
        }
        Commands::ListCollectors => {
            commands::list_collectors::run();
            Ok(())
        }
        Commands::Init { force } => commands::init::run(force),
    }
}
