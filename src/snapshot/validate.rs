//! Required-field validation of raw child rows.

use crate::source::HeaderLabels;
use crate::types::{ChildTask, InvalidChild, RawChildRow, TaskField};

/// Split `children` into valid tasks and invalid entries, each in input order.
///
/// A field is missing when its trimmed value is empty. The reason of an
/// invalid entry names every missing field by display label.
pub fn partition(
    children: &[RawChildRow],
    required: &[TaskField],
    labels: &HeaderLabels,
) -> (Vec<ChildTask>, Vec<InvalidChild>) {
    let mut valid = Vec::new();
    let mut invalid = Vec::new();

    for child in children {
        let missing: Vec<&str> = required
            .iter()
            .filter(|field| child.field(**field).trim().is_empty())
            .map(|field| labels.label_for(field.key()))
            .collect();

        if missing.is_empty() {
            valid.push(ChildTask::from_valid_row(child));
        } else {
            let task_id = child.task_id.trim();
            invalid.push(InvalidChild {
                task_id: if task_id.is_empty() {
                    "unknown".to_string()
                } else {
                    task_id.to_string()
                },
                title: child.title.trim().to_string(),
                reason: format!("missing required fields: {}", missing.join(", ")),
            });
        }
    }

    (valid, invalid)
}
