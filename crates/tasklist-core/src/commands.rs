use std::io::Write;

use anyhow::{Context, anyhow};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::{debug, info, instrument};

use crate::board::Board;
use crate::cli::Invocation;
use crate::config::Config;
use crate::datetime::parse_date_expr;
use crate::filter::FilterCriteria;
use crate::render::Renderer;
use crate::reorder::ReorderOutcome;
use crate::sort::SortKey;
use crate::task::{Category, DueStatus, Priority, TaskId};
use crate::validate::{TaskInput, TaskPatch};

/// Everything a command needs besides the board itself.
pub struct Session<'a, W: Write> {
    pub cfg: &'a Config,
    pub renderer: &'a Renderer,
    pub out: &'a mut W,
    pub now: DateTime<Utc>,
    pub tz: Tz,
    pub urgent_days: i64,
}

#[instrument(skip(board, ctx, inv), fields(command = %inv.command))]
pub fn dispatch<W: Write>(
    board: &mut Board,
    ctx: &mut Session<'_, W>,
    inv: &Invocation,
) -> anyhow::Result<()> {
    debug!(args = ?inv.command_args, "dispatching command");
    let args = inv.command_args.as_slice();

    match inv.command.as_str() {
        "add" => cmd_add(board, ctx, args),
        "edit" => cmd_edit(board, ctx, args),
        "done" => cmd_done(board, ctx, args),
        "delete" => cmd_delete(board, ctx, args),
        "filter" => cmd_filter(board, ctx, args),
        "sort" => cmd_sort(board, ctx, args),
        "move" => cmd_move(board, ctx, args),
        "list" => cmd_list(board, ctx),
        "info" => cmd_info(board, ctx, args),
        "stats" => cmd_stats(board, ctx),
        "export" => cmd_export(board, ctx),
        "config" => cmd_config(ctx),
        "help" => cmd_help(ctx),
        other => Err(anyhow!("unknown command: {other}")),
    }
}

/// `key:value` words recognised by `add` and `edit`; other words form the
/// title.
#[derive(Debug, Default)]
struct TaskMods {
    title_words: Vec<String>,
    title: Option<String>,
    description: Option<Option<String>>,
    category: Option<Category>,
    priority: Option<Priority>,
    due: Option<Option<DateTime<Utc>>>,
}

impl TaskMods {
    fn title(&self) -> Option<String> {
        if self.title_words.is_empty() {
            self.title.clone()
        } else {
            Some(self.title_words.join(" "))
        }
    }
}

fn parse_task_mods(args: &[String], now: DateTime<Utc>, tz: Tz) -> anyhow::Result<TaskMods> {
    let mut mods = TaskMods::default();

    for arg in args {
        let Some((key, value)) = arg.split_once(':') else {
            mods.title_words.push(arg.clone());
            continue;
        };

        match key.to_ascii_lowercase().as_str() {
            "title" => mods.title = Some(value.to_string()),
            "desc" | "description" => {
                mods.description = Some(Some(value.to_string()).filter(|v| !v.trim().is_empty()));
            }
            "cat" | "category" => mods.category = Some(value.parse()?),
            "pri" | "priority" => mods.priority = Some(value.parse()?),
            "due" => {
                mods.due = Some(if value.trim().is_empty() {
                    None
                } else {
                    Some(
                        parse_date_expr(value, now, tz)
                            .with_context(|| format!("invalid due date: {value}"))?,
                    )
                });
            }
            _ => mods.title_words.push(arg.clone()),
        }
    }

    Ok(mods)
}

/// Parses a 1-based view position into a zero-based index.
fn parse_position(raw: &str) -> anyhow::Result<usize> {
    let position: usize = raw
        .trim()
        .parse()
        .with_context(|| format!("expected a task position, got: {raw}"))?;
    position
        .checked_sub(1)
        .ok_or_else(|| anyhow!("task positions start at 1"))
}

fn resolve_position(board: &Board, args: &[String]) -> anyhow::Result<(usize, TaskId)> {
    let raw = args
        .first()
        .ok_or_else(|| anyhow!("a task position is required"))?;
    let index = parse_position(raw)?;
    let id = board
        .task_at(index)
        .ok_or_else(|| anyhow!("no task at position {raw} in the current view"))?;
    Ok((index, id))
}

#[instrument(skip_all)]
fn cmd_add<W: Write>(
    board: &mut Board,
    ctx: &mut Session<'_, W>,
    args: &[String],
) -> anyhow::Result<()> {
    info!("command add");

    let mods = parse_task_mods(args, ctx.now, ctx.tz)?;
    let input = TaskInput {
        title: mods.title().unwrap_or_default(),
        description: mods.description.clone().flatten(),
        category: mods.category.unwrap_or_default(),
        priority: mods.priority.unwrap_or_default(),
        due_date: mods.due.flatten(),
    };

    match board.create_task(input, ctx.now) {
        Ok(task) => {
            writeln!(ctx.out, "Created task '{}'.", task.title)?;
            Ok(())
        }
        Err(errors) => {
            ctx.renderer.print_validation_errors(ctx.out, &errors)?;
            Err(anyhow::Error::new(errors).context("task was not created"))
        }
    }
}

#[instrument(skip_all)]
fn cmd_edit<W: Write>(
    board: &mut Board,
    ctx: &mut Session<'_, W>,
    args: &[String],
) -> anyhow::Result<()> {
    info!("command edit");

    let (index, id) = resolve_position(board, args)?;
    let mods = parse_task_mods(args.get(1..).unwrap_or_default(), ctx.now, ctx.tz)?;
    if mods.due == Some(None) {
        return Err(anyhow!("due date cannot be removed"));
    }

    let patch = TaskPatch {
        title: mods.title(),
        description: mods.description,
        category: mods.category,
        priority: mods.priority,
        due_date: mods.due.flatten(),
    };
    if patch.is_empty() {
        return Err(anyhow!("edit requires at least one change"));
    }

    match board.update_task(id, patch, ctx.now) {
        Ok(_) => {
            writeln!(ctx.out, "Updated task {}.", index + 1)?;
            Ok(())
        }
        Err(errors) => {
            ctx.renderer.print_validation_errors(ctx.out, &errors)?;
            Err(anyhow::Error::new(errors).context("task was not updated"))
        }
    }
}

#[instrument(skip_all)]
fn cmd_done<W: Write>(
    board: &mut Board,
    ctx: &mut Session<'_, W>,
    args: &[String],
) -> anyhow::Result<()> {
    let (index, id) = resolve_position(board, args)?;
    board.toggle_completed(id);

    let completed = board.store().get(id).is_some_and(|task| task.completed);
    let state = if completed { "completed" } else { "reopened" };
    writeln!(ctx.out, "Task {} {state}.", index + 1)?;
    Ok(())
}

#[instrument(skip_all)]
fn cmd_delete<W: Write>(
    board: &mut Board,
    ctx: &mut Session<'_, W>,
    args: &[String],
) -> anyhow::Result<()> {
    let (index, id) = resolve_position(board, args)?;
    let title = board
        .store()
        .get(id)
        .map(|task| task.title.clone())
        .unwrap_or_default();
    board.delete_task(id);
    writeln!(ctx.out, "Deleted task {} '{title}'.", index + 1)?;
    Ok(())
}

#[instrument(skip_all)]
fn cmd_filter<W: Write>(
    board: &mut Board,
    ctx: &mut Session<'_, W>,
    args: &[String],
) -> anyhow::Result<()> {
    let criteria = match args {
        [] => FilterCriteria::default(),
        [only] if only.eq_ignore_ascii_case("clear") => FilterCriteria::default(),
        terms => FilterCriteria::parse(terms)?,
    };
    info!(?criteria, "filters changed");
    board.set_filters(criteria);
    cmd_list(board, ctx)
}

#[instrument(skip_all)]
fn cmd_sort<W: Write>(
    board: &mut Board,
    ctx: &mut Session<'_, W>,
    args: &[String],
) -> anyhow::Result<()> {
    let raw = args
        .first()
        .ok_or_else(|| anyhow!("sort requires priority, due, created or manual"))?;
    let key = SortKey::parse_selection(raw)?;
    info!(?key, "sort key changed");
    board.set_sort_key(key);
    cmd_list(board, ctx)
}

#[instrument(skip_all)]
fn cmd_move<W: Write>(
    board: &mut Board,
    ctx: &mut Session<'_, W>,
    args: &[String],
) -> anyhow::Result<()> {
    let raw_source = args
        .first()
        .ok_or_else(|| anyhow!("move requires a source position"))?;
    let source = parse_position(raw_source)?;
    let destination = match args.get(1).map(String::as_str) {
        None | Some("-") => None,
        Some(raw) => Some(parse_position(raw)?),
    };

    let outcome = board.reorder(source, destination);
    debug!(?outcome, "reorder finished");

    match outcome {
        ReorderOutcome::Applied {
            source,
            destination,
        } => {
            writeln!(
                ctx.out,
                "Moved task {} to position {}.",
                source + 1,
                destination + 1
            )?;
            Ok(())
        }
        ReorderOutcome::Cancelled => {
            writeln!(ctx.out, "Move cancelled.")?;
            Ok(())
        }
        ReorderOutcome::SourceOutOfRange => Err(anyhow!(
            "no task at position {raw_source} in the current view"
        )),
    }
}

fn cmd_list<W: Write>(board: &Board, ctx: &mut Session<'_, W>) -> anyhow::Result<()> {
    let view = board.projected_view();
    ctx.renderer.print_view(
        ctx.out,
        &view,
        board.stats(),
        board.filters(),
        board.sort_key(),
        ctx.now,
    )
}

fn cmd_info<W: Write>(
    board: &Board,
    ctx: &mut Session<'_, W>,
    args: &[String],
) -> anyhow::Result<()> {
    let (_, id) = resolve_position(board, args)?;
    let task = board
        .store()
        .get(id)
        .ok_or_else(|| anyhow!("task vanished: {id}"))?;
    ctx.renderer.print_task_info(ctx.out, task, ctx.now)
}

fn cmd_stats<W: Write>(board: &Board, ctx: &mut Session<'_, W>) -> anyhow::Result<()> {
    let stats = board.stats();
    let tasks = board.store().as_slice();
    let overdue = tasks
        .iter()
        .filter(|t| t.due_status(ctx.now, ctx.urgent_days) == Some(DueStatus::Overdue))
        .count();
    let urgent = tasks
        .iter()
        .filter(|t| t.due_status(ctx.now, ctx.urgent_days) == Some(DueStatus::Urgent))
        .count();

    writeln!(
        ctx.out,
        "{} of {} tasks completed",
        stats.completed, stats.total
    )?;
    writeln!(ctx.out, "pending  {}", stats.total - stats.completed)?;
    writeln!(ctx.out, "urgent   {urgent}")?;
    writeln!(ctx.out, "overdue  {overdue}")?;
    Ok(())
}

fn cmd_export<W: Write>(board: &Board, ctx: &mut Session<'_, W>) -> anyhow::Result<()> {
    let view = board.projected_view();
    let json = serde_json::to_string_pretty(&view).context("failed to serialize view")?;
    writeln!(ctx.out, "{json}")?;
    Ok(())
}

fn cmd_config<W: Write>(ctx: &mut Session<'_, W>) -> anyhow::Result<()> {
    let mut entries: Vec<_> = ctx.cfg.iter().collect();
    entries.sort();
    for (key, value) in entries {
        writeln!(ctx.out, "{key} = {value}")?;
    }
    Ok(())
}

fn cmd_help<W: Write>(ctx: &mut Session<'_, W>) -> anyhow::Result<()> {
    let text = "\
Commands (positions refer to the list as currently shown, starting at 1):
  add <title> [desc:<text>] [cat:<category>] [pri:<priority>] due:<date>
  edit <pos> [<title>] [desc:<text>] [cat:<category>] [pri:<priority>] [due:<date>]
  done <pos>                 toggle completion
  delete <pos>
  filter [search:<text>] [cat:<category|all>] [pri:<priority|all>] | filter clear
  sort priority|due|created|manual
  move <from> [<to>|-]       '-' or no target cancels the move
  list | info <pos> | stats | export | config | help

Categories: personal, professional, other
Priorities: high, medium, low
Dates: now, today, tomorrow, friday, +3d, +2h, 2026-05-01, 2026-05-01 14:30";
    writeln!(ctx.out, "{text}")?;
    Ok(())
}
