//! Change markers attached to valid children.

use crate::clock::{Clock, local_today, parse_due_date};
use crate::types::{ChildTask, Marker};
use chrono::FixedOffset;
use std::sync::Arc;

/// Optional capability that tags children with detected changes.
pub trait ChangeDetector: Send + Sync {
    fn markers_for(&self, project_id: &str, child: &ChildTask) -> Vec<Marker>;
}

/// Detector used when none is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoChanges;

impl ChangeDetector for NoChanges {
    fn markers_for(&self, _project_id: &str, _child: &ChildTask) -> Vec<Marker> {
        Vec::new()
    }
}

/// Tags incomplete children due between today and `window_days` from now.
pub struct DueSoonDetector {
    window_days: u32,
    clock: Arc<dyn Clock>,
    offset: FixedOffset,
}

impl DueSoonDetector {
    /// `None` when `window_days` is 0.
    pub fn new(window_days: u32, clock: Arc<dyn Clock>, offset: FixedOffset) -> Option<Self> {
        (window_days > 0).then(|| Self {
            window_days,
            clock,
            offset,
        })
    }
}

impl ChangeDetector for DueSoonDetector {
    fn markers_for(&self, _project_id: &str, child: &ChildTask) -> Vec<Marker> {
        if child.status.is_completed() {
            return Vec::new();
        }
        let Some(due) = parse_due_date(&child.due_date, self.offset) else {
            return Vec::new();
        };
        let days_left = (due - local_today(self.clock.now(), self.offset)).num_days();
        if (0..=i64::from(self.window_days)).contains(&days_left) {
            vec![Marker::Deadline]
        } else {
            Vec::new()
        }
    }
}

/// Attach markers to every child in place.
pub fn annotate(detector: &dyn ChangeDetector, project_id: &str, children: &mut [ChildTask]) {
    for child in children.iter_mut() {
        child.markers = detector.markers_for(project_id, child);
    }
}
