//! Import subcommand for task-thread-sync CLI
//!
//! Loads a sheet grid (a JSON array of rows, header row first) into the
//! local database, replacing its contents.

use crate::source::Grid;
use anyhow::{Context, Result, bail};
use clap::Args;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Arguments for the import subcommand
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Path to the grid file to import
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Validate the file without modifying the database
    #[arg(long)]
    pub dry_run: bool,
}

impl ImportArgs {
    /// Describe the import mode for logging
    pub fn import_mode(&self) -> &'static str {
        if self.dry_run { "dry-run" } else { "replace" }
    }
}

fn cell_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Parse grid JSON. Numbers and booleans become their text; null is empty.
pub fn parse_grid(content: &str) -> Result<Grid> {
    let value: Value = serde_json::from_str(content).context("grid file is not valid JSON")?;
    let Value::Array(rows) = value else {
        bail!("grid file must be a JSON array of rows");
    };

    let mut table = Vec::with_capacity(rows.len());
    for (i, row) in rows.into_iter().enumerate() {
        let Value::Array(cells) = row else {
            bail!("row {} is not an array", i);
        };
        table.push(cells.into_iter().map(cell_text).collect());
    }
    Ok(Grid::from_table(table))
}

pub fn read_grid(path: &Path) -> Result<Grid> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_grid(&content)
}
