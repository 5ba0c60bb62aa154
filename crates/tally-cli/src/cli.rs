//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Tally - Categorize bank transactions
#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Transaction categorizer with personal learning", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Directory for learning state (defaults to the platform data directory)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Categorizer config override file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Categorize a transaction file
    ///
    /// CSV columns: date,description,amount[,direction]. JSON: an array of
    /// transaction objects.
    Categorize {
        /// CSV or JSON file
        #[arg(short, long)]
        file: PathBuf,

        /// Input format: csv or json (inferred from the extension if omitted)
        #[arg(long)]
        format: Option<String>,

        /// Write categorized transactions and the run summary as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip the remote classifier even if one is configured
        #[arg(long)]
        no_remote: bool,

        /// Print the review queue after the run
        #[arg(long)]
        review: bool,
    },

    /// Inspect the local rule engine
    Rules {
        #[command(subcommand)]
        action: RulesAction,
    },

    /// Remote classifier commands
    Remote {
        #[command(subcommand)]
        action: RemoteAction,
    },

    /// Manage personal learning state
    Learn {
        #[command(subcommand)]
        action: Option<LearnAction>,
    },

    /// Show configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
pub enum RulesAction {
    /// Show how the rule engine classifies a description
    Test {
        /// Transaction description
        description: String,

        /// Transaction amount
        #[arg(short, long, default_value = "0")]
        amount: f64,
    },
}

#[derive(Subcommand)]
pub enum RemoteAction {
    /// Send the fixed two-item probe to the configured classifier
    Probe,
}

#[derive(Subcommand)]
pub enum LearnAction {
    /// Teach a correction
    Correct {
        /// Transaction description
        description: String,

        /// Transaction amount
        #[arg(short, long)]
        amount: f64,

        /// Correct category
        #[arg(short, long)]
        to: String,

        /// Category it had before (defaults to the rule engine's answer)
        #[arg(short, long)]
        from: Option<String>,
    },

    /// Confirm a categorization
    Confirm {
        /// Transaction description
        description: String,

        /// Transaction amount
        #[arg(short, long)]
        amount: f64,

        /// Confirmed category
        #[arg(short, long)]
        category: String,
    },

    /// Show learned merchants and patterns
    Show {
        /// Maximum rows per table
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Predict a category from learning state alone
    Predict {
        /// Transaction description
        description: String,

        /// Transaction amount
        #[arg(short, long, default_value = "0")]
        amount: f64,
    },

    /// Forget everything learned
    Clear {
        /// Skip confirmation
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,

    /// Print the override and learning state paths
    Path,

    /// Print the embedded default config file
    Default,
}
