//! # Toposig CLI Module
//!
//! This module implements the CLI interface for toposig.
//!
//! ## Available Commands
//!
//! - `id` - Print signature identifier and tokens per node
//! - `report` - Signature groups and topic index of one snapshot
//! - `diff` - Signature and topic count differences
//! - `similar` - Near-match pairs between changed signatures
//! - `match` - Name-agnostic node matching with endpoint and edge changes

mod commands;

use crate::config::ReportConfig;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use toposig_core::ToposigError;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Toposig - topology signatures for pub/sub graph snapshots
///
/// Groups nodes by an order-independent fingerprint of their interface and
/// compares snapshots without relying on node names.
#[derive(Parser, Debug)]
#[command(name = "toposig")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Suppress informational log output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// TOML file with report limits and thresholds
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print signature identifier and tokens per node
    Id {
        /// Snapshot JSON file
        snapshot: PathBuf,

        /// Only this fully-qualified node name
        #[arg(short, long)]
        node: Option<String>,
    },

    /// Signature groups and topic index of one snapshot
    Report {
        /// Snapshot JSON file
        snapshot: PathBuf,

        /// Write the report here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Signature and topic pub/sub count differences
    Diff {
        /// Old snapshot JSON file
        old: PathBuf,

        /// New snapshot JSON file
        new: PathBuf,

        /// Only compare topics matching this regular expression
        #[arg(long)]
        topic_filter: Option<String>,

        /// Write the report here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Near-match pairs between changed signatures
    Similar {
        /// Old snapshot JSON file
        old: PathBuf,

        /// New snapshot JSON file
        new: PathBuf,

        /// Compare endpoints together with their types
        #[arg(long)]
        include_types: bool,

        /// Minimum Jaccard similarity of a reported pair
        #[arg(long)]
        min_similarity: Option<f64>,

        /// Write the report here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Name-agnostic node matching with endpoint and edge changes
    Match {
        /// Old snapshot JSON file
        old: PathBuf,

        /// New snapshot JSON file
        new: PathBuf,

        /// Minimum similarity for the similarity matching stage
        #[arg(long)]
        min_similarity: Option<f64>,

        /// Required lead of the best candidate over the runner-up
        #[arg(long)]
        min_margin: Option<f64>,

        /// Write the report here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), ToposigError> {
    let config = ReportConfig::load(cli.config.as_deref())?;
    let json_mode = cli.json;

    match cli.command {
        Commands::Id { snapshot, node } => cmd_id(&config, json_mode, &snapshot, node.as_deref()),
        Commands::Report { snapshot, out } => cmd_report(&config, json_mode, &snapshot, out.as_deref()),
        Commands::Diff {
            old,
            new,
            topic_filter,
            out,
        } => cmd_diff(
            &config,
            json_mode,
            &old,
            &new,
            topic_filter.as_deref(),
            out.as_deref(),
        ),
        Commands::Similar {
            old,
            new,
            include_types,
            min_similarity,
            out,
        } => cmd_similar(
            &config,
            json_mode,
            &old,
            &new,
            include_types,
            min_similarity,
            out.as_deref(),
        ),
        Commands::Match {
            old,
            new,
            min_similarity,
            min_margin,
            out,
        } => cmd_match(
            &config,
            json_mode,
            &old,
            &new,
            min_similarity,
            min_margin,
            out.as_deref(),
        ),
    }
}

// =============================================================================
// TESTS
// =============================================================================
