//! Work stats CLI library.
//!
//! This crate provides the CLI interface for building and querying a local
//! issue-tracker corpus.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands};
pub use config::Config;
