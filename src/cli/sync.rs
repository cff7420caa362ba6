//! Sync subcommand: one cycle from the command line.

use crate::types::PageRequest;
use clap::Args;

/// Arguments for the sync subcommand
#[derive(Args, Debug, Default)]
pub struct SyncArgs {
    /// Skip this many projects
    #[arg(long, default_value_t = 0)]
    pub cursor: usize,

    /// Process at most this many projects
    #[arg(long)]
    pub limit: Option<usize>,
}

impl SyncArgs {
    pub fn page(&self) -> PageRequest {
        PageRequest {
            cursor: self.cursor,
            limit: self.limit,
        }
    }
}
