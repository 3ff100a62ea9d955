//! CLI subcommand implementations.

pub mod import;
pub mod issues;
pub mod status;
pub mod util;
