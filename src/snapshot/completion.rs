//! Completion counts over a project's children.

use crate::types::{CompletionMetrics, RawChildRow, TaskStatus};
use chrono::{DateTime, Utc};

/// Count completed children. An empty set is 0%.
pub fn calculate(children: &[RawChildRow], now: DateTime<Utc>) -> CompletionMetrics {
    let total = children.len();
    let done = children
        .iter()
        .filter(|c| TaskStatus::parse(&c.status).is_completed())
        .count();
    let percentage = if total == 0 {
        0
    } else {
        (done as f64 * 100.0 / total as f64).round() as u8
    };

    CompletionMetrics {
        total,
        done,
        percentage,
        updated_at: now,
    }
}
