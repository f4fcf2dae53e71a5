use std::io::{self, IsTerminal, Write};

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use unicode_width::UnicodeWidthStr;

use crate::datetime::format_local_date;
use crate::error::ValidationErrors;
use crate::filter::FilterCriteria;
use crate::sort::SortKey;
use crate::store::Stats;
use crate::task::{DueStatus, Priority, Task};

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
    urgent_days: i64,
    tz: Tz,
}

impl Renderer {
    /// Colour is only emitted when enabled and stdout is a terminal.
    pub fn new(color: bool, urgent_days: i64, tz: Tz) -> Self {
        Self {
            color: color && io::stdout().is_terminal(),
            urgent_days,
            tz,
        }
    }

    pub fn plain(urgent_days: i64, tz: Tz) -> Self {
        Self {
            color: false,
            urgent_days,
            tz,
        }
    }

    #[tracing::instrument(skip_all, fields(rows = tasks.len()))]
    pub fn print_view<W: Write>(
        &self,
        out: &mut W,
        tasks: &[&Task],
        stats: Stats,
        filters: &FilterCriteria,
        sort: Option<SortKey>,
        now: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        writeln!(
            out,
            "{} of {} tasks completed",
            stats.completed, stats.total
        )?;
        writeln!(
            out,
            "sort: {}  filter: {}",
            sort.map_or("manual", SortKey::as_str),
            describe_filters(filters)
        )?;

        if tasks.is_empty() {
            if stats.total == 0 {
                writeln!(out, "No tasks yet.")?;
            } else {
                writeln!(out, "No tasks match the current filter.")?;
            }
            return Ok(());
        }

        let headers = ["#", "Done", "Priority", "Category", "Due", "Title"]
            .into_iter()
            .map(str::to_string)
            .collect();

        let mut rows = Vec::with_capacity(tasks.len());
        for (idx, task) in tasks.iter().enumerate() {
            let due_text = format_local_date(task.due_date, self.tz);
            let due = match task.due_status(now, self.urgent_days) {
                Some(DueStatus::Overdue) => self.paint(&format!("{due_text} overdue"), "31"),
                Some(DueStatus::Urgent) => self.paint(&format!("{due_text} urgent"), "33"),
                Some(DueStatus::Upcoming) | None => due_text,
            };

            let done = if task.completed { "x" } else { " " }.to_string();
            let priority = self.paint(task.priority.label(), priority_color(task.priority));

            rows.push(vec![
                (idx + 1).to_string(),
                done,
                priority,
                task.category.to_string(),
                due,
                task.title.clone(),
            ]);
        }

        write_table(out, headers, rows)
    }

    #[tracing::instrument(skip_all, fields(id = %task.id))]
    pub fn print_task_info<W: Write>(
        &self,
        out: &mut W,
        task: &Task,
        now: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        writeln!(out, "id          {}", task.id)?;
        writeln!(out, "title       {}", task.title)?;
        writeln!(
            out,
            "description {}",
            task.description.as_deref().unwrap_or_default()
        )?;
        writeln!(out, "category    {}", task.category)?;
        writeln!(out, "priority    {}", task.priority)?;
        writeln!(out, "due         {}", format_local_date(task.due_date, self.tz))?;
        writeln!(out, "days left   {}", task.days_until_due(now))?;
        if let Some(status) = task.due_status(now, self.urgent_days) {
            writeln!(out, "status      {status:?}")?;
        }
        writeln!(out, "completed   {}", if task.completed { "yes" } else { "no" })?;
        writeln!(out, "created     {}", format_local_date(task.created_at, self.tz))?;
        Ok(())
    }

    pub fn print_validation_errors<W: Write>(
        &self,
        out: &mut W,
        errors: &ValidationErrors,
    ) -> anyhow::Result<()> {
        for (field, err) in errors.iter() {
            let line = format!("{field}: {err}");
            writeln!(out, "{}", self.paint(&line, "31"))?;
        }
        Ok(())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

const fn priority_color(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "31",
        Priority::Medium => "33",
        Priority::Low => "32",
    }
}

fn describe_filters(filters: &FilterCriteria) -> String {
    if filters.is_empty() {
        return "none".to_string();
    }

    let mut parts = Vec::new();
    if let Some(search) = &filters.search {
        parts.push(format!("search:\"{search}\""));
    }
    if let Some(category) = filters.category {
        parts.push(format!("category:{category}"));
    }
    if let Some(priority) = filters.priority {
        parts.push(format!("priority:{priority}"));
    }
    parts.join(" ")
}

fn write_table<W: Write>(
    writer: &mut W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let mut widths: Vec<usize> = headers
        .iter()
        .map(|header| UnicodeWidthStr::width(header.as_str()))
        .collect();

    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for (header, width) in headers.iter().zip(&widths) {
        write!(writer, "{header:width$} ", width = *width)?;
    }
    writeln!(writer)?;

    for width in &widths {
        write!(writer, "{:-<width$} ", "", width = *width)?;
    }
    writeln!(writer)?;

    for row in rows {
        for (cell, width) in row.iter().zip(&widths) {
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = width.saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
