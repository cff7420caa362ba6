//! Thread message rendering.
//!
//! Two modes: the initial message (thread creation and starter rewrite)
//! carries only aggregate counts; the status update adds the progress label,
//! the in-progress task list and one block per invalid task. Header text and
//! every block description are cut to `max_len` characters independently.

use crate::chat::{Embed, EmbedField, MessagePayload};
use crate::clock::{format_timestamp, offset_from_minutes};
use crate::config::Config;
use crate::types::{ChildTask, Marker, ProgressStatus, ProjectSnapshot, TaskStatus};
use chrono::FixedOffset;

const COLOR_ON_SCHEDULE: u32 = 0x2ECC71;
const COLOR_DELAYED: u32 = 0xE74C3C;
const COLOR_INVALID: u32 = 0xF1C40F;

/// Discord rejects embed titles longer than this.
pub const MAX_EMBED_TITLE_CHARS: usize = 256;

/// Cut `text` to at most `max` characters.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}

fn marker_glyph(marker: &Marker) -> &'static str {
    match marker {
        Marker::Deadline => "⚠",
        Marker::StatusChanged => "ℹ",
        Marker::Other(_) => "",
    }
}

/// Space-joined glyphs in input order; unknown markers give empty segments.
pub fn marker_glyphs(markers: &[Marker]) -> String {
    markers
        .iter()
        .map(marker_glyph)
        .collect::<Vec<_>>()
        .join(" ")
}

/// `"{title} | {percentage}%"`, falling back to the project id for untitled projects.
pub fn thread_name(snapshot: &ProjectSnapshot) -> String {
    let title = if snapshot.title.trim().is_empty() {
        &snapshot.project_id
    } else {
        &snapshot.title
    };
    format!("{} | {}%", title, snapshot.completion.percentage)
}

fn task_line(child: &ChildTask) -> String {
    let glyphs = marker_glyphs(&child.markers);
    let lead = if glyphs.is_empty() {
        String::new()
    } else {
        format!("{} ", glyphs)
    };
    format!(
        "{}{} {} / {} / {} / {}",
        lead,
        child.task_id,
        child.title,
        child.assignee.as_deref().unwrap_or("unassigned"),
        if child.due_date.is_empty() {
            "unscheduled"
        } else {
            &child.due_date
        },
        child.status
    )
}

/// Renders snapshots into thread messages.
#[derive(Debug, Clone)]
pub struct MessageFormatter {
    max_len: usize,
    offset: FixedOffset,
    delay_mention: Option<String>,
}

impl MessageFormatter {
    pub fn new(max_len: usize, offset: FixedOffset) -> Self {
        Self {
            max_len,
            offset,
            delay_mention: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.format.max_content_length,
            offset_from_minutes(config.format.utc_offset_minutes),
        )
        .with_delay_mention(config.discord.delay_mention.clone())
    }

    /// User id (or a preformatted `<@...>` mention) prefixed to delayed updates.
    pub fn with_delay_mention(mut self, mention: Option<String>) -> Self {
        self.delay_mention = mention.filter(|m| !m.trim().is_empty());
        self
    }

    fn cut(&self, text: &str) -> String {
        truncate_chars(text, self.max_len)
    }

    fn counts_line(snapshot: &ProjectSnapshot) -> String {
        let c = &snapshot.completion;
        format!("{}% complete ({}/{})", c.percentage, c.done, c.total)
    }

    fn summary_block(snapshot: &ProjectSnapshot, color: u32) -> Embed {
        let c = &snapshot.completion;
        Embed {
            title: "Summary".to_string(),
            color: Some(color),
            fields: vec![
                EmbedField::inline("Total", c.total.to_string()),
                EmbedField::inline("Done", c.done.to_string()),
                EmbedField::inline("Remaining", c.remaining().to_string()),
            ],
            ..Default::default()
        }
    }

    /// Aggregate-only message used for thread creation and the starter post.
    pub fn render_initial(&self, snapshot: &ProjectSnapshot) -> MessagePayload {
        let header = format!(
            "{}\nLast synced: {}",
            Self::counts_line(snapshot),
            format_timestamp(snapshot.timestamp, self.offset)
        );

        MessagePayload {
            content: self.cut(&header),
            embeds: vec![Self::summary_block(snapshot, COLOR_ON_SCHEDULE)],
        }
    }

    /// Per-cycle status post with task detail.
    pub fn render_status_update(&self, snapshot: &ProjectSnapshot) -> MessagePayload {
        let delayed = snapshot.progress_status == ProgressStatus::Delayed;

        let mut header = String::new();
        if delayed && let Some(mention) = &self.delay_mention {
            if mention.starts_with("<@") {
                header.push_str(mention);
            } else {
                header.push_str(&format!("<@{}>", mention));
            }
            header.push(' ');
        }
        header.push_str(&format!(
            "**{}** | {}\nLast synced: {}",
            snapshot.progress_status.label(),
            Self::counts_line(snapshot),
            format_timestamp(snapshot.timestamp, self.offset)
        ));
        if !snapshot.invalid_children.is_empty() {
            header.push_str(&format!(
                "\nWarning: {} task(s) have missing required fields.",
                snapshot.invalid_children.len()
            ));
        }

        let lines: Vec<String> = snapshot
            .children
            .iter()
            .filter(|c| c.status == TaskStatus::InProgress)
            .map(task_line)
            .collect();
        let description = if lines.is_empty() {
            "no in-progress tasks".to_string()
        } else {
            lines.join("\n")
        };

        let mut embeds = vec![Embed {
            title: "In progress".to_string(),
            description: self.cut(&description),
            color: Some(if delayed { COLOR_DELAYED } else { COLOR_ON_SCHEDULE }),
            ..Default::default()
        }];

        embeds.extend(snapshot.invalid_children.iter().map(|invalid| {
            let title = if invalid.title.is_empty() {
                invalid.task_id.clone()
            } else {
                format!("{} ({})", invalid.title, invalid.task_id)
            };
            Embed {
                title: truncate_chars(&self.cut(&title), MAX_EMBED_TITLE_CHARS),
                description: self.cut(&invalid.reason),
                color: Some(COLOR_INVALID),
                ..Default::default()
            }
        }));

        MessagePayload {
            content: self.cut(&header),
            embeds,
        }
    }
}
