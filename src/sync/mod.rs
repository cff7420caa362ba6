//! Thread synchronization and the sync cycle, plus wiring from config.

pub mod orchestrator;
pub mod thread;

pub use orchestrator::Orchestrator;
pub use thread::{ThreadOutcome, ThreadSynchronizer};

use crate::chat::DiscordForumClient;
use crate::clock::{Clock, SystemClock, offset_from_minutes};
use crate::config::{Config, SourceBackend};
use crate::db::Database;
use crate::error::SyncResultOf;
use crate::format::MessageFormatter;
use crate::snapshot::{DueSoonDetector, SnapshotBuilder};
use crate::source::{GridSource, SheetsBackend, TaskSource};
use std::sync::Arc;

/// Data source for the configured backend. Each call gets a fresh row cache.
pub fn source_from_config(config: &Config) -> SyncResultOf<Arc<dyn TaskSource>> {
    let layout = config.source.columns.clone();
    Ok(match config.source.backend {
        SourceBackend::Sheets => Arc::new(GridSource::new(
            SheetsBackend::from_config(&config.source)?,
            layout,
        )),
        SourceBackend::Local => Arc::new(GridSource::new(
            Database::open(&config.source.db_path)?,
            layout,
        )),
    })
}

/// Wire a complete orchestrator. Fails fast on missing credentials.
pub fn orchestrator_from_config(config: &Config) -> SyncResultOf<Orchestrator> {
    config.validate_for_sync()?;

    let source = source_from_config(config)?;
    let offset = offset_from_minutes(config.format.utc_offset_minutes);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let mut builder = SnapshotBuilder::new(Arc::clone(&source))
        .with_clock(Arc::clone(&clock))
        .with_offset(offset);
    if let Some(detector) = DueSoonDetector::new(config.markers.deadline_window_days, clock, offset) {
        builder = builder.with_detector(Arc::new(detector));
    }

    let client = DiscordForumClient::from_config(&config.discord)?;
    let synchronizer = ThreadSynchronizer::new(
        Arc::new(client),
        Arc::clone(&source),
        MessageFormatter::from_config(config),
    );

    Ok(Orchestrator::new(source, builder, synchronizer))
}
