//! YANG Proto Generator CLI
//!
//! Generates proto3 files from a parsed YANG schema tree and checks existing
//! output for drift.
//!
//! Usage:
//!   yang-protogen generate --input schema.json --out proto
//!   yang-protogen check --input schema.json --out proto
//!   yang-protogen config

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;
use yang_protogen::drift::{detect_drift, DriftStatus};
use yang_protogen::{ProtoGenerator, Proto3Output, ProtogenConfig, ProtogenError, SchemaTree, TagLedger};

#[derive(Parser)]
#[command(name = "yang-protogen")]
#[command(about = "Generate Protocol Buffer definitions from YANG schema trees")]
#[command(version)]
struct Cli {
    /// Configuration file, layered over protogen.toml and the environment
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate one .proto file per package
    Generate {
        /// Schema tree in JSON form
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory (overrides [output].dir)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Enable path compression
        #[arg(long)]
        compress: bool,
    },

    /// Regenerate in memory and compare with files on disk
    Check {
        /// Schema tree in JSON form
        #[arg(short, long)]
        input: PathBuf,

        /// Directory holding previously generated files
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Enable path compression
        #[arg(long)]
        compress: bool,
    },

    /// Show the effective configuration
    Config {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<String>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Returns false when the command completed but found a problem
fn run(cli: Cli) -> Result<bool> {
    let mut config = ProtogenConfig::load_from(cli.config.as_deref())
        .context("failed to load configuration")?;

    match cli.command {
        Commands::Generate { input, out, compress } => {
            config.generator.compress_paths |= compress;
            let out_dir = out.unwrap_or_else(|| config.output.dir.clone());
            let mut ledger = load_ledger(&config)?;

            let output = generate(&config, &input, &mut ledger)?;
            let written = output
                .write_to(&out_dir)
                .with_context(|| format!("failed to write to {}", out_dir.display()))?;

            if let Some(path) = &config.generator.tag_ledger {
                ledger
                    .save(path)
                    .with_context(|| format!("failed to save tag ledger {}", path.display()))?;
            }

            for path in &written {
                println!("  📄 {}", path.display());
            }
            println!("✅ Generated {} file(s) in {}", written.len(), out_dir.display());
            Ok(true)
        }

        Commands::Check { input, out, compress } => {
            config.generator.compress_paths |= compress;
            let out_dir = out.unwrap_or_else(|| config.output.dir.clone());
            let mut ledger = load_ledger(&config)?;

            let output = generate(&config, &input, &mut ledger)?;
            let report = detect_drift(&output, &out_dir)
                .with_context(|| format!("failed to read {}", out_dir.display()))?;

            let mut drifted = 0;
            for file in &report {
                match &file.status {
                    DriftStatus::Unchanged => {
                        println!("  ✅ {}", file.path.display());
                    }
                    DriftStatus::Missing => {
                        drifted += 1;
                        println!("  ❌ {} - missing", file.path.display());
                    }
                    DriftStatus::Changed { added, removed } => {
                        drifted += 1;
                        println!(
                            "  ❌ {} - {} line(s) added, {} removed",
                            file.path.display(),
                            added,
                            removed
                        );
                        print!("{}", file.diff);
                    }
                }
            }

            println!();
            if drifted > 0 {
                println!("❌ {} of {} file(s) out of date", drifted, report.len());
                Ok(false)
            } else {
                println!("✅ All {} file(s) up to date", report.len());
                Ok(true)
            }
        }

        Commands::Config { output } => {
            match output {
                Some(path) => {
                    config
                        .save(&path)
                        .with_context(|| format!("failed to write {}", path))?;
                    println!("✅ Configuration written to {}", path);
                }
                None => print!("{}", config.to_toml()?),
            }
            Ok(true)
        }
    }
}

fn load_ledger(config: &ProtogenConfig) -> Result<TagLedger> {
    match &config.generator.tag_ledger {
        Some(path) => TagLedger::load(path)
            .with_context(|| format!("failed to load tag ledger {}", path.display())),
        None => Ok(TagLedger::new()),
    }
}

fn generate(config: &ProtogenConfig, input: &Path, ledger: &mut TagLedger) -> Result<Proto3Output> {
    let json = std::fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let tree = SchemaTree::from_json(&json)
        .with_context(|| format!("failed to parse schema tree {}", input.display()))?;
    info!(module = %tree.module_name(), nodes = tree.len(), "loaded schema tree");

    let generator =
        ProtoGenerator::new(config.generator.clone()).with_sources(config.sources.clone());
    let output = generator
        .generate(&tree, ledger)
        .map_err(ProtogenError::from)?;
    Ok(output)
}
