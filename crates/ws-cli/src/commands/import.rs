//! Import command for loading corpus dumps into the local `SQLite` store.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use ws_db::{Database, IssueDocument};

use crate::Config;

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// Read issue documents from this file instead of stdin.
    #[arg(long)]
    pub file: Option<PathBuf>,
}

/// Imports every document and returns the number of issues written.
pub fn run(args: &ImportArgs, config: &Config) -> Result<usize> {
    let documents = match &args.file {
        Some(path) => {
            let file =
                File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
            parse_documents(BufReader::new(file))?
        }
        None => parse_documents(io::stdin().lock())?,
    };

    let mut db = Database::open(&config.database_path)
        .with_context(|| format!("failed to open {}", config.database_path.display()))?;
    let imported = db
        .import_issues(&documents)
        .context("failed to import issue documents")?;
    Ok(imported)
}

fn parse_documents<R: BufRead>(reader: R) -> Result<Vec<IssueDocument>> {
    let mut documents = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("failed to read line {}", idx + 1))?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let document: IssueDocument = serde_json::from_str(trimmed)
            .with_context(|| format!("invalid JSON on line {}", idx + 1))?;
        document
            .repository()
            .with_context(|| format!("invalid issue on line {}", idx + 1))?;
        documents.push(document);
    }
    Ok(documents)
}
