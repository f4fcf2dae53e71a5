use std::collections::HashMap;
use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow
};
use tracing::{
  debug,
  info,
  trace,
  warn
};

use crate::sort::SortKey;

pub const RC_ENV_VAR: &str = "TASKLISTRC";
const RC_FILE_NAME: &str = ".tasklistrc";
const DEFAULT_URGENT_DAYS: i64 = 2;

#[derive(Debug, Clone)]
pub struct Config {
  map: HashMap<String, String>,
  pub loaded_files: Vec<PathBuf>
}

impl Default for Config {
  fn default() -> Self {
    let map = [
      ("default.sort", "manual"),
      ("color", "on"),
      ("urgent.days", "2")
    ]
    .into_iter()
    .map(|(k, v)| {
      (k.to_string(), v.to_string())
    })
    .collect();

    Self {
      map,
      loaded_files: vec![]
    }
  }
}

impl Config {
  #[tracing::instrument(skip(
    rc_override
  ))]
  pub fn load(
    rc_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let mut cfg = Self::default();

    let rc = resolve_rc_path(rc_override)?;
    if let Some(path) = rc {
      info!(rc = %path.display(), "loading rc file");
      cfg.load_file(&path)?;
    } else {
      debug!(
        "no rc file found; using \
         defaults"
      );
    }

    Ok(cfg)
  }

  /// Parses rc text directly; `include` lines resolve against `base_dir`.
  pub fn from_text(
    text: &str,
    base_dir: &Path
  ) -> anyhow::Result<Self> {
    let mut cfg = Self::default();
    cfg.apply_text(
      text,
      base_dir,
      "<inline>"
    )?;
    Ok(cfg)
  }

  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (k, v) in overrides {
      let key = k
        .strip_prefix("rc.")
        .unwrap_or(&k)
        .to_string();
      debug!(key = %key, value = %v, "applying override");
      self.map.insert(key, v);
    }
  }

  pub fn get(
    &self,
    key: &str
  ) -> Option<String> {
    self.map.get(key).cloned()
  }

  pub fn get_bool(
    &self,
    key: &str
  ) -> Option<bool> {
    self
      .map
      .get(key)
      .map(|v| parse_bool(v))
  }

  /// Sort selection the board starts with; `manual` means none.
  pub fn default_sort(
    &self
  ) -> anyhow::Result<Option<SortKey>> {
    let raw = self
      .get("default.sort")
      .unwrap_or_else(|| {
        "manual".to_string()
      });
    SortKey::parse_selection(&raw)
      .context("invalid default.sort")
  }

  pub fn color(&self) -> bool {
    self.get_bool("color").unwrap_or(true)
  }

  /// Days before the due date at which a task counts as urgent.
  pub fn urgent_days(
    &self
  ) -> anyhow::Result<i64> {
    match self.get("urgent.days") {
      | None => Ok(DEFAULT_URGENT_DAYS),
      | Some(raw) => {
        let days: i64 = raw
          .trim()
          .parse()
          .with_context(|| {
            format!(
              "invalid urgent.days: \
               {raw}"
            )
          })?;
        if days < 0 {
          return Err(anyhow!(
            "urgent.days must not be \
             negative: {days}"
          ));
        }
        Ok(days)
      }
    }
  }

  pub fn timezone(
    &self
  ) -> Option<String> {
    self.get("timezone")
  }

  pub fn iter(
    &self
  ) -> impl Iterator<Item = (&String, &String)>
  {
    self.map.iter()
  }

  #[tracing::instrument(skip(self))]
  fn load_file(
    &mut self,
    path: &Path
  ) -> anyhow::Result<()> {
    let path = expand_tilde(path);
    let text =
      fs::read_to_string(&path)
        .with_context(|| {
          format!(
            "failed to read {}",
            path.display()
          )
        })?;

    self
      .loaded_files
      .push(path.clone());

    let base_dir = path
      .parent()
      .map(Path::to_path_buf)
      .unwrap_or_else(|| {
        PathBuf::from(".")
      });

    self.apply_text(
      &text,
      &base_dir,
      &path.display().to_string()
    )
  }

  fn apply_text(
    &mut self,
    text: &str,
    base_dir: &Path,
    origin: &str
  ) -> anyhow::Result<()> {
    for (line_num, raw_line) in
      text.lines().enumerate()
    {
      let line = raw_line
        .split_once('#')
        .map_or(raw_line, |(before, _)| {
          before
        })
        .trim();
      if line.is_empty() {
        continue;
      }

      if let Some(include_rest) =
        line.strip_prefix("include ")
      {
        let include_path =
          resolve_include_path(
            base_dir,
            include_rest.trim()
          )?;
        debug!(
            origin,
            include = %include_path.display(),
            line = line_num + 1,
            "processing include"
        );

        if include_path.exists() {
          self
            .load_file(&include_path)?;
        } else {
          warn!(include = %include_path.display(), "include file does not exist; skipping");
        }
        continue;
      }

      let (k, v) = line
        .split_once('=')
        .ok_or_else(|| {
          anyhow!(
            "invalid config line \
             {}:{}: {}",
            origin,
            line_num + 1,
            raw_line
          )
        })?;

      let key = k.trim().to_string();
      let value = v.trim().to_string();
      trace!(key = %key, value = %value, "loaded config key");
      self.map.insert(key, value);
    }

    Ok(())
  }
}

#[tracing::instrument(skip(
  override_path
))]
fn resolve_rc_path(
  override_path: Option<&Path>
) -> anyhow::Result<Option<PathBuf>> {
  if let Some(path) = override_path {
    return Ok(Some(path.to_path_buf()));
  }

  if let Ok(rc_env) =
    std::env::var(RC_ENV_VAR)
  {
    if rc_env == "/dev/null" {
      return Ok(None);
    }
    return Ok(Some(PathBuf::from(
      rc_env
    )));
  }

  let Some(home) = dirs::home_dir()
  else {
    warn!(
      "cannot determine home \
       directory; skipping rc lookup"
    );
    return Ok(None);
  };
  let candidate = home.join(RC_FILE_NAME);
  if candidate.exists() {
    return Ok(Some(candidate));
  }

  Ok(None)
}

fn resolve_include_path(
  base_dir: &Path,
  include: &str
) -> anyhow::Result<PathBuf> {
  if include.trim().is_empty() {
    return Err(anyhow!(
      "include path cannot be empty"
    ));
  }

  let expanded =
    expand_tilde(Path::new(include));
  if expanded.is_absolute() {
    Ok(expanded)
  } else {
    Ok(base_dir.join(expanded))
  }
}

fn expand_tilde(
  path: &Path
) -> PathBuf {
  let text = path.to_string_lossy();
  if let Some(rest) =
    text.strip_prefix("~/")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}

fn parse_bool(s: &str) -> bool {
  matches!(
    s.trim()
      .to_ascii_lowercase()
      .as_str(),
    "1" | "y" | "yes" | "on" | "true"
  )
}

#[cfg(test)]
mod tests {
  use std::fs;
  use std::path::Path;

  use tempfile::tempdir;

  use super::Config;
  use crate::sort::SortKey;

  #[test]
  fn defaults_apply_without_rc() {
    let cfg = Config::default();
    assert_eq!(
      cfg.default_sort().unwrap(),
      None
    );
    assert!(cfg.color());
    assert_eq!(cfg.urgent_days().unwrap(), 2);
    assert_eq!(cfg.timezone(), None);
  }

  #[test]
  fn parses_keys_and_comments() {
    let cfg = Config::from_text(
      "# board defaults\n\
       default.sort = due   # soonest first\n\
       color=off\n\
       urgent.days = 5\n",
      Path::new(".")
    )
    .unwrap();

    assert_eq!(
      cfg.default_sort().unwrap(),
      Some(SortKey::DueDate)
    );
    assert!(!cfg.color());
    assert_eq!(cfg.urgent_days().unwrap(), 5);
  }

  #[test]
  fn overrides_win_and_strip_rc_prefix() {
    let mut cfg = Config::default();
    cfg.apply_overrides([(
      "rc.default.sort".to_string(),
      "priority".to_string()
    )]);
    assert_eq!(
      cfg.default_sort().unwrap(),
      Some(SortKey::Priority)
    );
  }

  #[test]
  fn rejects_malformed_lines_and_values() {
    assert!(
      Config::from_text(
        "color on",
        Path::new(".")
      )
      .is_err()
    );

    let cfg = Config::from_text(
      "urgent.days = -1\n\
       default.sort = alphabetical",
      Path::new(".")
    )
    .unwrap();
    assert!(cfg.urgent_days().is_err());
    assert!(cfg.default_sort().is_err());
  }

  #[test]
  fn loads_file_with_include() {
    let dir = tempdir().unwrap();
    fs::write(
      dir.path().join("extra.rc"),
      "timezone = Europe/Paris\n"
    )
    .unwrap();
    let main = dir.path().join("main.rc");
    fs::write(
      &main,
      "include extra.rc\ncolor = no\n"
    )
    .unwrap();

    let cfg =
      Config::load(Some(&main)).unwrap();

    assert_eq!(
      cfg.timezone().as_deref(),
      Some("Europe/Paris")
    );
    assert!(!cfg.color());
    assert_eq!(cfg.loaded_files.len(), 2);
  }
}
