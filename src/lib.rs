//! Task Thread Sync Library
//!
//! This module exports the core components for testing and integration.

pub mod chat;
pub mod cli;
pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod logging;
pub mod server;
pub mod snapshot;
pub mod source;
pub mod sync;
pub mod types;
