// CLI Interface
//
// This module provides the command-line interface for LeChamp.

use crate::config::ReconcileConfig;
use crate::output::Outputs;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use legraphe::normalize::normalize_label;
use legraphe::{ClientSchema, MappingEntry, Model, Reconciler, Reconciliation};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// LeChamp - Field Mapping Reconciliation
#[derive(Parser, Debug)]
#[command(name = "lechamp")]
#[command(author = "LeChamp Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Reconcile two client field schemas with CSL into one label mapping", long_about = None)]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(global = true, long = "config", short = 'c')]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(global = true, long = "verbose", short = 'v')]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Schema inputs shared by every command
#[derive(clap::Args, Debug, Clone)]
pub struct SchemaArgs {
    /// Normalized schema of model A
    #[arg(long = "model-a", value_name = "SCHEMA")]
    pub model_a: PathBuf,

    /// Normalized schema of model B
    #[arg(long = "model-b", value_name = "SCHEMA")]
    pub model_b: PathBuf,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full reconciliation and write every output
    Reconcile {
        /// Input schemas
        #[command(flatten)]
        schemas: SchemaArgs,

        /// Output directory (overrides the configuration)
        #[arg(long = "out-dir", value_name = "DIR")]
        out_dir: Option<PathBuf>,
    },

    /// Run the reconciliation and print one mapping entry as JSON
    Lookup {
        /// Label text, literal or normalized
        #[arg(value_name = "LABEL")]
        label: String,

        /// Input schemas
        #[command(flatten)]
        schemas: SchemaArgs,
    },
}

impl Cli {
    /// Run the CLI
    pub fn run(self) -> Result<()> {
        init_logging_impl(self.verbose);

        let config = ReconcileConfig::load(self.config.as_deref())?;

        match self.command {
            Commands::Reconcile { schemas, out_dir } => cmd_reconcile_impl(&schemas, out_dir, config),
            Commands::Lookup { label, schemas } => cmd_lookup_impl(&label, &schemas),
        }
    }
}

/// Initialize logging implementation
///
/// `RUST_LOG` wins when set; otherwise `--verbose` selects debug level.
fn init_logging_impl(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// Read and parse one schema file
pub fn read_schema(path: &Path) -> Result<ClientSchema> {
    let file = File::open(path).with_context(|| format!("Failed to open schema: {:?}", path))?;
    ClientSchema::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse schema: {:?}", path))
}

/// Load both schemas and finalize the run
pub fn reconcile_files(schemas: &SchemaArgs) -> Result<Reconciliation> {
    let mut run = Reconciler::new();
    for (model, path) in [(Model::A, &schemas.model_a), (Model::B, &schemas.model_b)] {
        let schema = read_schema(path)?;
        run.load(&schema, model)
            .with_context(|| format!("Failed to load {} schema {:?}", model, path))?;
    }
    run.finalize().context("Reconciliation failed")
}

/// Reconcile command implementation
fn cmd_reconcile_impl(schemas: &SchemaArgs, out_dir: Option<PathBuf>, mut config: ReconcileConfig) -> Result<()> {
    if let Some(dir) = out_dir {
        config.output.directory = dir;
    }

    let result = reconcile_files(schemas)?;
    let outputs = Outputs::render(&result, &config)?;
    outputs.write()?;

    info!(
        labels = result.table().len(),
        conflicts = result.conflicts().len(),
        hop_throughs = result.hop_throughs().len(),
        "reconcile complete"
    );

    println!("\n✓ Reconciliation complete!");
    println!("  Labels: {}", result.table().len());
    println!("  Conflicts removed: {}", result.conflicts().len());
    println!("  Hop-throughs added: {}", result.hop_throughs().len());
    println!("  Multi-line fields purged: {}", result.purged());
    for path in outputs.paths() {
        println!("  Wrote: {}", path.display());
    }

    Ok(())
}

/// Lookup command implementation
fn cmd_lookup_impl(label: &str, schemas: &SchemaArgs) -> Result<()> {
    let result = reconcile_files(schemas)?;
    let entry = find_entry(&result, label)?;

    let json = serde_json::to_string_pretty(entry).context("Failed to serialize mapping entry")?;
    println!("{}", json);

    Ok(())
}

/// Mapping entry for a literal label, falling back to its normalized form
pub fn find_entry<'a>(result: &'a Reconciliation, label: &str) -> Result<&'a MappingEntry> {
    result
        .lookup(label)
        .or_else(|| result.lookup(&normalize_label(label)))
        .with_context(|| format!("No mapping entry for label `{}`", label))
}
