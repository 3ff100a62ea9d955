//! Status command for showing what the local corpus holds.

use std::io::Write;

use anyhow::{Context, Result};

use ws_db::Database;

use crate::Config;

pub fn run<W: Write>(writer: &mut W, config: &Config) -> Result<()> {
    let db = Database::open(&config.database_path)
        .with_context(|| format!("failed to open {}", config.database_path.display()))?;
    let stats = db.corpus_stats()?;

    writeln!(writer, "Work stats status")?;
    writeln!(writer, "Database: {}", config.database_path.display())?;

    if stats.issues == 0 {
        writeln!(writer, "No issues imported.")?;
        return Ok(());
    }

    writeln!(writer, "Repositories: {}", stats.repositories)?;
    writeln!(writer, "Issues: {}", stats.issues)?;
    writeln!(writer, "Events: {}", stats.events)?;
    writeln!(writer, "Comments: {}", stats.comments)?;

    Ok(())
}
