//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::import::ImportArgs;
use crate::commands::issues::IssuesArgs;

/// Per-user issue activity from an issue-tracker corpus.
///
/// Imports corpus dumps into a local database and summarizes which issues a
/// user opened, closed, or commented on within a time window.
#[derive(Debug, Parser)]
#[command(name = "ws", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Import issue documents (JSONL) into the local corpus.
    Import(ImportArgs),

    /// Show what the local corpus contains.
    Status,

    /// Summarize issue activity within a time window.
    Issues(IssuesArgs),
}
