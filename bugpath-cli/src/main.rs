//! bugpath CLI - annotate static-analysis bug paths for tree display

#![deny(warnings)]

// Global invariants enforced:
// - Deterministic output ordering
// - Identical input yields byte-for-byte identical output

use anyhow::Context;
use bugpath_core::config::{self, ConfigOverrides, ResolvedConfig};
use bugpath_core::{annotate_path, render_json, render_jsonl, render_text};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bugpath")]
#[command(about = "Annotate static-analysis bug paths with call-stack nesting")]
#[command(version = env!("BUGPATH_VERSION"))]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Annotate report bundles (JSON files or directories of them)
    Annotate {
        /// Report bundle files or directories
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,

        /// Path to config file (default: auto-discover)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Comma-separated band colours (overrides config file)
        #[arg(long, value_delimiter = ',')]
        palette: Option<Vec<String>>,

        /// Fix-it marker substring (overrides config file)
        #[arg(long)]
        fixit_marker: Option<String>,

        /// Report `Returned allocated memory` with no open call as a mismatch
        #[arg(long)]
        strict_allocation_returns: bool,

        /// Spaces per indentation level in text output (overrides config file)
        #[arg(long)]
        indent_width: Option<usize>,
    },
    /// Validate a configuration file
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Validate a config file without annotating anything
    Validate {
        /// Path to config file (default: auto-discover from current directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Show the resolved configuration (merged defaults + config file)
    Show {
        /// Path to config file (default: auto-discover from current directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Jsonl,
}

fn init_logging(verbose: u8, quiet: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if quiet {
        builder.filter_level(log::LevelFilter::Error);
    } else if verbose >= 2 {
        builder.filter_level(log::LevelFilter::Debug);
    } else if verbose == 1 {
        builder.filter_level(log::LevelFilter::Info);
    }
    builder.format_timestamp(None);
    builder.init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let cwd = std::env::current_dir()?;

    match cli.command {
        Commands::Annotate {
            paths,
            format,
            config: config_path,
            palette,
            fixit_marker,
            strict_allocation_returns,
            indent_width,
        } => {
            // CLI flags override config file values; the merge is validated as a whole
            let overrides = ConfigOverrides {
                palette,
                fixit_marker,
                strict_allocation_returns,
                indent_width,
            };
            let resolved =
                config::load_and_resolve_with_overrides(&cwd, config_path.as_deref(), overrides)
                    .context("failed to load configuration")?;

            if let Some(path) = &resolved.config_path {
                log::info!("Using config: {}", path.display());
            }

            let mut reports = Vec::new();
            for path in &paths {
                let normalized = if path.is_relative() {
                    cwd.join(path)
                } else {
                    path.clone()
                };
                reports.extend(annotate_path(&normalized, &resolved)?);
            }

            let mismatches: usize = reports.iter().map(|r| r.mismatches.len()).sum();
            log::info!(
                "annotated {} report(s), {} stack mismatch(es)",
                reports.len(),
                mismatches
            );

            match format {
                OutputFormat::Text => print!("{}", render_text(&reports, resolved.indent_width)),
                OutputFormat::Json => println!("{}", render_json(&reports)?),
                OutputFormat::Jsonl => print!("{}", render_jsonl(&reports)?),
            }
        }
        Commands::Config { action } => match action {
            ConfigAction::Validate { path } => {
                let resolved = config::load_and_resolve(&cwd, path.as_deref())?;
                match &resolved.config_path {
                    Some(p) => println!("Config valid: {}", p.display()),
                    None => println!("No config file found, using defaults"),
                }
            }
            ConfigAction::Show { path } => {
                let resolved = config::load_and_resolve(&cwd, path.as_deref())?;
                print_resolved_config(&resolved);
            }
        },
    }

    Ok(())
}

fn print_resolved_config(resolved: &ResolvedConfig) {
    match &resolved.config_path {
        Some(p) => println!("Config file: {}", p.display()),
        None => println!("Config file: (defaults)"),
    }
    println!("Palette: {}", resolved.palette.colors().join(", "));
    println!("Fix-it marker: {:?}", resolved.fixit_marker);
    println!(
        "Strict allocation returns: {}",
        resolved.strict_allocation_returns
    );
    println!("Indent width: {}", resolved.indent_width);
    println!(
        "Exclude patterns: {}",
        if resolved.exclude.is_some() {
            "custom"
        } else {
            "(none)"
        }
    );
}
