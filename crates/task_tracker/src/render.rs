//! Text rendering for tasks and statistics.
//!
//! Everything here returns a `String` so the interactive loop decides where
//! it goes and tests can compare output directly.

use task_tracker_core::config::{Config, Palette};
use task_tracker_core::model::Task;
use task_tracker_core::task_api::{TaskStats, percent};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime, UtcOffset};

const DATE_FORMAT: &[BorrowedFormatItem<'_>] =
    format_description!("[month repr:short] [day padding:none], [year]");
const DATE_TIME_FORMAT: &[BorrowedFormatItem<'_>] = format_description!(
    "[month repr:short] [day padding:none], [year], [hour repr:12 padding:none]:[minute] [period]"
);

const DONE_GLYPH: &str = "✓";
const PENDING_GLYPH: &str = "○";
pub const EMPTY_LIST_MESSAGE: &str = "No tasks found.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateStyle {
    Hidden,
    Date,
    DateTime,
}

#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub show_category: bool,
    pub created: DateStyle,
    /// Offset used to show creation timestamps.
    pub offset: UtcOffset,
    /// Reference day for the overdue marker.
    pub today: Date,
}

impl RenderOptions {
    /// Options for the given config, using the local offset (UTC when unknown).
    pub fn from_config(config: &Config, created: DateStyle) -> Self {
        let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
        Self {
            show_category: config.show_categories,
            created: if config.show_dates {
                created
            } else {
                DateStyle::Hidden
            },
            offset,
            today: OffsetDateTime::now_utc().to_offset(offset).date(),
        }
    }

    pub fn with_created(self, created: DateStyle) -> Self {
        if self.created == DateStyle::Hidden {
            self
        } else {
            Self { created, ..self }
        }
    }
}

fn format_created(task: &Task, options: &RenderOptions) -> Option<String> {
    let local = task.created_at().to_offset(options.offset);
    let format = match options.created {
        DateStyle::Hidden => return None,
        DateStyle::Date => DATE_FORMAT,
        DateStyle::DateTime => DATE_TIME_FORMAT,
    };
    Some(local.format(format).unwrap_or_else(|_| local.to_string()))
}

fn format_date(date: Date) -> String {
    date.format(DATE_FORMAT)
        .unwrap_or_else(|_| date.to_string())
}

/// One task: glyph, title, optional tags, then the description on its own line.
pub fn render_task(task: &Task, palette: &Palette, options: &RenderOptions) -> String {
    let (status, title) = if task.completed() {
        (
            palette.paint(palette.success, DONE_GLYPH),
            palette.mutedize(task.title()),
        )
    } else {
        (
            palette.paint(palette.warning, PENDING_GLYPH),
            palette.paint(palette.emphasis, task.title()),
        )
    };

    let mut line = format!("{status} {title}");

    if options.show_category {
        let category = task.category();
        line.push(' ');
        line.push_str(&palette.paint(palette.category(category), &format!("[{category}]")));
    }

    if let Some(created) = format_created(task, options) {
        line.push(' ');
        line.push_str(&palette.mutedize(&format!("(created: {created})")));
    }

    if let Some(due) = task.due_date() {
        line.push(' ');
        if task.is_overdue(options.today) {
            line.push_str(&palette.paint(
                palette.error,
                &format!("(due: {}, overdue)", format_date(due)),
            ));
        } else {
            line.push_str(&palette.mutedize(&format!("(due: {})", format_date(due))));
        }
    }

    if !task.description().is_empty() {
        line.push_str("\n   ");
        line.push_str(&palette.mutedize(task.description()));
    }

    line
}

pub fn render_task_list(tasks: &[Task], palette: &Palette, options: &RenderOptions) -> String {
    if tasks.is_empty() {
        return palette.paint(palette.warning, EMPTY_LIST_MESSAGE);
    }

    tasks
        .iter()
        .enumerate()
        .map(|(index, task)| {
            format!(
                "{}. {}",
                palette.paint(palette.info, &(index + 1).to_string()),
                render_task(task, palette, options)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_summary(stats: &TaskStats, palette: &Palette) -> String {
    format!(
        "{}{}{}",
        palette.paint(palette.info, &format!("Stats: {} total, ", stats.total)),
        palette.paint(palette.success, &format!("{} completed, ", stats.completed)),
        palette.paint(palette.warning, &format!("{} remaining", stats.pending)),
    )
}

pub fn render_stats(stats: &TaskStats, palette: &Palette) -> String {
    if stats.total == 0 {
        return palette.paint(palette.warning, EMPTY_LIST_MESSAGE);
    }

    let label = |text: &str| palette.paint(palette.warning, text);
    let value = |count: usize| palette.paint(palette.success, &count.to_string());

    let mut lines = vec![
        format!("{} {}", label("Total Tasks:"), value(stats.total)),
        format!(
            "{} {} ({}%)",
            label("Completed:"),
            value(stats.completed),
            percent(stats.completed, stats.total)
        ),
        format!(
            "{} {} ({}%)",
            label("Pending:"),
            value(stats.pending),
            percent(stats.pending, stats.total)
        ),
        String::new(),
        label("Tasks by Category:"),
    ];

    for (category, count) in &stats.by_category {
        lines.push(format!(
            "{}: {} ({}%)",
            palette.paint(palette.category(*category), category.as_str()),
            value(*count),
            percent(*count, stats.total)
        ));
    }

    lines.join("\n")
}
