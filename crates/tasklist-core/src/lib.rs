pub mod board;
pub mod cli;
pub mod commands;
pub mod config;
pub mod datetime;
pub mod error;
pub mod filter;
pub mod render;
pub mod reorder;
pub mod sort;
pub mod store;
pub mod task;
pub mod validate;
pub mod view;

use std::ffi::OsString;
use std::fs::File;
use std::io::{
  self,
  BufRead,
  BufReader,
  Write
};

use anyhow::Context;
use chrono::Utc;
use chrono_tz::Tz;
use clap::Parser;
use tracing::{
  debug,
  info,
  warn
};

use crate::board::Board;
use crate::cli::Invocation;
use crate::commands::Session;
use crate::config::Config;
use crate::render::Renderer;

/// How a session reacts to a failing command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnError {
  Continue,
  Stop
}

/// Per-session summary returned by [`run_session`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionReport {
  pub executed: usize,
  pub failed: usize
}

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let pre = cli::preprocess_args(&raw_args);
  let cli = cli::GlobalCli::parse_from(
    pre.cleaned_args
  );

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting tasklist"
  );
  debug!(?pre.rc_overrides, "preprocessed rc overrides");

  let mut cfg = Config::load(
    cli.tasklistrc.as_deref()
  )?;
  cfg.apply_overrides(
    pre.rc_overrides.into_iter().chain(
      cli
        .rc_overrides
        .into_iter()
        .map(|kv| (kv.key, kv.value))
    )
  );

  let tz = datetime::resolve_timezone(
    cfg.timezone().as_deref()
  );
  let urgent_days = cfg.urgent_days()?;
  let mut board =
    Board::new(cfg.default_sort()?);
  let renderer =
    Renderer::new(cfg.color(), urgent_days, tz);

  let on_error = if cli.fail_fast {
    OnError::Stop
  } else {
    OnError::Continue
  };

  let stdout = io::stdout();
  let mut out = stdout.lock();

  let report = if !cli.rest.is_empty() {
    let tokens = cli
      .rest
      .iter()
      .map(|arg| {
        arg.to_string_lossy().into_owned()
      })
      .collect();
    let inv = Invocation::from_tokens(tokens)?;
    let mut session = Session {
      cfg: &cfg,
      renderer: &renderer,
      out: &mut out,
      now: Utc::now(),
      tz,
      urgent_days
    };
    commands::dispatch(
      &mut board,
      &mut session,
      &inv
    )?;
    SessionReport {
      executed: 1,
      failed: 0
    }
  } else if let Some(path) = &cli.file {
    let file =
      File::open(path).with_context(|| {
        format!(
          "failed to open session file {}",
          path.display()
        )
      })?;
    run_session(
      &mut board,
      &cfg,
      &renderer,
      tz,
      BufReader::new(file),
      &mut out,
      on_error
    )?
  } else {
    run_session(
      &mut board,
      &cfg,
      &renderer,
      tz,
      io::stdin().lock(),
      &mut out,
      on_error
    )?
  };

  info!(
    executed = report.executed,
    failed = report.failed,
    "done"
  );

  if report.failed > 0
    && on_error == OnError::Stop
  {
    anyhow::bail!(
      "session stopped after a failing \
       command"
    );
  }
  Ok(())
}

/// Runs one command per input line against `board`.
///
/// Failing commands are reported on stderr; the session carries on unless
/// `on_error` is [`OnError::Stop`]. Only I/O failures on `input` or
/// `out` abort with an error.
#[tracing::instrument(skip_all)]
pub fn run_session<R, W>(
  board: &mut Board,
  cfg: &Config,
  renderer: &Renderer,
  tz: Tz,
  input: R,
  out: &mut W,
  on_error: OnError
) -> anyhow::Result<SessionReport>
where
  R: BufRead,
  W: Write
{
  let urgent_days = cfg.urgent_days()?;
  let mut report =
    SessionReport::default();

  for (line_num, line) in
    input.lines().enumerate()
  {
    let line = line.with_context(|| {
      format!(
        "failed to read session line {}",
        line_num + 1
      )
    })?;

    let result = Invocation::parse_line(
      &line
    )
    .and_then(|parsed| {
      let Some(inv) = parsed else {
        return Ok(false);
      };
      let mut session = Session {
        cfg,
        renderer,
        out: &mut *out,
        now: Utc::now(),
        tz,
        urgent_days
      };
      commands::dispatch(
        board,
        &mut session,
        &inv
      )
      .map(|()| true)
    });

    match result {
      | Ok(false) => {}
      | Ok(true) => report.executed += 1,
      | Err(err) => {
        report.executed += 1;
        report.failed += 1;
        warn!(
          line = line_num + 1,
          error = %err,
          "command failed"
        );
        eprintln!(
          "error: line {}: {err:#}",
          line_num + 1
        );
        if on_error == OnError::Stop {
          break;
        }
      }
    }
  }

  out.flush()?;
  Ok(report)
}
