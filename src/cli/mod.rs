//! CLI command definitions for task-thread-sync
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

pub mod import;
pub mod sync;

use clap::{Args, Parser, Subcommand};
use import::ImportArgs;
use std::path::PathBuf;
use sync::SyncArgs;

/// Sync a project/task sheet into one forum thread per project
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (skips tier merging)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to a local sheet database (selects the local backend)
    #[arg(short, long, global = true)]
    pub database: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the HTTP sync trigger (default if no subcommand given)
    Serve(ServeArgs),

    /// Run one sync cycle and print the result as JSON
    Sync(SyncArgs),

    /// Load a sheet grid from a JSON file into the local database
    Import(ImportArgs),
}

/// Arguments for the serve subcommand
#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Port to listen on (overrides config and PORT)
    #[arg(short, long)]
    pub port: Option<u16>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sync_with_window() {
        let cli = Cli::parse_from([
            "task-thread-sync",
            "--database",
            "rows.db",
            "sync",
            "--cursor",
            "2",
            "--limit",
            "5",
        ]);
        assert_eq!(cli.database, Some(PathBuf::from("rows.db")));
        match cli.command {
            Some(Command::Sync(args)) => {
                assert_eq!(args.cursor, 2);
                assert_eq!(args.limit, Some(5));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_no_subcommand_defaults() {
        let cli = Cli::parse_from(["task-thread-sync"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.log, "2");
        assert!(!cli.verbose);
    }

    #[test]
    fn test_parse_serve_port() {
        let cli = Cli::parse_from(["task-thread-sync", "serve", "--port", "8080"]);
        match cli.command {
            Some(Command::Serve(args)) => assert_eq!(args.port, Some(8080)),
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
