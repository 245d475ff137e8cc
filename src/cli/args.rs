//! Command line argument parsing for the Shrike CLI using clap.

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Shrike - exact batch vector similarity search
#[derive(Parser, Debug, Clone)]
#[command(name = "shrike")]
#[command(about = "An exact batch vector similarity search tool")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "Shrike Contributors")]
#[command(long_about = None)]
pub struct ShrikeArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl ShrikeArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1, // Default to normal
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create a new workspace
    Create(CreateArgs),

    /// Add entries to a workspace
    Add(AddArgs),

    /// Search a workspace
    Search(SearchArgs),

    /// Show workspace statistics
    Stats(StatsArgs),

    /// Evaluate top-1 retrieval accuracy against labeled queries
    Evaluate(EvaluateArgs),
}

/// Arguments for creating a workspace
#[derive(Parser, Debug, Clone)]
pub struct CreateArgs {
    /// Path to the workspace directory
    #[arg(value_name = "WORKSPACE")]
    pub workspace: PathBuf,

    /// Fix the embedding dimension up front
    #[arg(short, long, value_name = "DIM")]
    pub dimension: Option<usize>,

    /// Overwrite an existing workspace
    #[arg(long)]
    pub force: bool,
}

/// Arguments for adding entries
#[derive(Parser, Debug, Clone)]
pub struct AddArgs {
    /// Path to the workspace directory
    #[arg(value_name = "WORKSPACE")]
    pub workspace: PathBuf,

    /// Entry file path (JSONL, one {"embedding": [...], "payload": "..."} per line)
    #[arg(value_name = "ENTRY_FILE")]
    pub entry_file: PathBuf,

    /// Batch size for bulk ingestion
    #[arg(short, long, default_value = "64")]
    pub batch_size: usize,

    /// Journal detail lines per batch
    #[arg(long, value_name = "N")]
    pub log_entries: Option<usize>,
}

/// Arguments for searching
#[derive(Parser, Debug, Clone)]
pub struct SearchArgs {
    /// Path to the workspace directory
    #[arg(value_name = "WORKSPACE")]
    pub workspace: PathBuf,

    /// Query vector as comma-separated components
    #[arg(long, value_name = "V1,V2,...", conflicts_with = "query_file")]
    pub vector: Option<String>,

    /// Query file path (JSONL, one {"embedding": [...]} per line)
    #[arg(long, value_name = "QUERY_FILE")]
    pub query_file: Option<PathBuf>,

    /// Number of matches to return per query
    #[arg(short = 'k', long, default_value = "5")]
    pub top_k: usize,

    /// Include stored embeddings in the results
    #[arg(long)]
    pub include_embeddings: bool,

    /// Journal detail lines for this request
    #[arg(long, value_name = "N")]
    pub log_entries: Option<usize>,
}

/// Arguments for workspace statistics
#[derive(Parser, Debug, Clone)]
pub struct StatsArgs {
    /// Path to the workspace directory
    #[arg(value_name = "WORKSPACE")]
    pub workspace: PathBuf,
}

/// Arguments for retrieval evaluation
#[derive(Parser, Debug, Clone)]
pub struct EvaluateArgs {
    /// Path to the workspace directory
    #[arg(value_name = "WORKSPACE")]
    pub workspace: PathBuf,

    /// Labeled query file path (JSONL, one {"embedding": [...], "label": "..."} per line)
    #[arg(value_name = "QUERY_FILE")]
    pub query_file: PathBuf,

    /// Batch size for query batches
    #[arg(short, long, default_value = "64")]
    pub batch_size: usize,
}

/// Output formats for CLI
#[derive(ValueEnum, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}
