//! On-schedule / delayed classification.

use crate::clock::parse_due_date;
use crate::types::{ChildTask, ProgressStatus};
use chrono::{FixedOffset, NaiveDate};

/// `Delayed` when any incomplete child is due strictly before `today`.
///
/// Empty or unparseable due dates never count as overdue.
pub fn classify(children: &[ChildTask], today: NaiveDate, offset: FixedOffset) -> ProgressStatus {
    let overdue = children
        .iter()
        .filter(|c| !c.status.is_completed())
        .filter_map(|c| parse_due_date(&c.due_date, offset))
        .any(|due| due < today);

    if overdue {
        ProgressStatus::Delayed
    } else {
        ProgressStatus::OnSchedule
    }
}
