use anyhow::{
  Context,
  anyhow
};
use chrono::{
  DateTime,
  Datelike,
  Duration,
  LocalResult,
  NaiveDate,
  NaiveDateTime,
  TimeDelta,
  TimeZone,
  Utc,
  Weekday
};
use chrono_tz::Tz;
use regex::Regex;

pub const TIMEZONE_ENV_VAR: &str =
  "TASKLIST_TIMEZONE";

/// Picks the zone used to read local date expressions.
///
/// The environment wins over the configured value; UTC is the fallback.
pub fn resolve_timezone(
  configured: Option<&str>
) -> Tz {
  if let Ok(raw) =
    std::env::var(TIMEZONE_ENV_VAR)
    && let Some(tz) =
      parse_timezone(&raw, TIMEZONE_ENV_VAR)
  {
    return tz;
  }

  if let Some(raw) = configured
    && let Some(tz) =
      parse_timezone(raw, "config")
  {
    return tz;
  }

  chrono_tz::UTC
}

fn parse_timezone(
  raw: &str,
  source: &str
) -> Option<Tz> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    tracing::warn!(
      source,
      "timezone source was empty"
    );
    return None;
  }

  match trimmed.parse::<Tz>() {
    | Ok(tz) => {
      tracing::info!(
        source,
        timezone = %trimmed,
        "configured timezone"
      );
      Some(tz)
    }
    | Err(err) => {
      tracing::error!(
        source,
        timezone = %trimmed,
        error = %err,
        "failed to parse timezone id"
      );
      None
    }
  }
}

#[must_use]
pub fn format_local_date(
  dt: DateTime<Utc>,
  tz: Tz
) -> String {
  dt.with_timezone(&tz)
    .format("%Y-%m-%d %H:%M")
    .to_string()
}

fn to_utc_from_local(
  local_naive: NaiveDateTime,
  tz: Tz,
  context: &str
) -> anyhow::Result<DateTime<Utc>> {
  match tz.from_local_datetime(&local_naive)
  {
    | LocalResult::Single(local_dt) => {
      Ok(local_dt.with_timezone(&Utc))
    }
    | LocalResult::Ambiguous(
      first,
      second
    ) => {
      tracing::warn!(
        context,
        first = %first,
        second = %second,
        "ambiguous local datetime; using earliest"
      );
      Ok(first.min(second).with_timezone(&Utc))
    }
    | LocalResult::None => {
      Err(anyhow!(
        "local datetime does not \
         exist in timezone {tz}: \
         {context}"
      ))
    }
  }
}

fn local_midnight(
  date: NaiveDate,
  tz: Tz,
  context: &str
) -> anyhow::Result<DateTime<Utc>> {
  let midnight = date
    .and_hms_opt(0, 0, 0)
    .ok_or_else(|| {
      anyhow!(
        "failed to construct midnight \
         for {context}"
      )
    })?;
  to_utc_from_local(midnight, tz, context)
}

/// Reads a due-date expression typed by the user.
#[tracing::instrument(skip(now), fields(input = input))]
pub fn parse_date_expr(
  input: &str,
  now: DateTime<Utc>,
  tz: Tz
) -> anyhow::Result<DateTime<Utc>> {
  let token = input.trim();
  let lower = token.to_ascii_lowercase();
  let local_today =
    now.with_timezone(&tz).date_naive();

  match lower.as_str() {
    | "now" => return Ok(now),
    | "today" => {
      return local_midnight(
        local_today,
        tz,
        "today"
      );
    }
    | "tomorrow" => {
      let date = local_today
        .succ_opt()
        .ok_or_else(|| {
          anyhow!("date out of range")
        })?;
      return local_midnight(
        date, tz, "tomorrow"
      );
    }
    | _ => {}
  }

  if let Some(target) =
    parse_weekday_name(&lower)
  {
    return local_midnight(
      next_weekday_date(
        local_today,
        target
      ),
      tz,
      "weekday-name"
    );
  }

  let rel_re = Regex::new(
    r"^\+?(?P<num>\d+)(?P<unit>[dhmw])$"
  )
  .map_err(|e| {
    anyhow!(
      "internal regex compile failure: \
       {e}"
    )
  })?;

  if let Some(caps) = rel_re.captures(&lower)
  {
    let num: i64 = caps
      .name("num")
      .map(|m| m.as_str())
      .ok_or_else(|| {
        anyhow!("missing relative amount")
      })?
      .parse()
      .context("invalid relative number")?;
    let unit = caps
      .name("unit")
      .map(|m| m.as_str())
      .ok_or_else(|| {
        anyhow!("missing relative unit")
      })?;

    let duration = match unit {
      | "w" => TimeDelta::try_weeks(num),
      | "d" => TimeDelta::try_days(num),
      | "h" => TimeDelta::try_hours(num),
      | "m" => TimeDelta::try_minutes(num),
      | _ => {
        return Err(anyhow!(
          "unknown relative unit: {unit}"
        ));
      }
    };
    return duration
      .and_then(|delta| {
        now.checked_add_signed(delta)
      })
      .ok_or_else(|| {
        anyhow!(
          "relative date out of range: \
           {input}"
        )
      });
  }

  if let Ok(dt) =
    DateTime::parse_from_rfc3339(token)
  {
    return Ok(dt.with_timezone(&Utc));
  }

  if let Ok(date) =
    NaiveDate::parse_from_str(
      token, "%Y-%m-%d"
    )
  {
    return local_midnight(date, tz, "date");
  }

  for fmt in
    ["%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"]
  {
    if let Ok(ndt) =
      NaiveDateTime::parse_from_str(
        token, fmt
      )
    {
      return to_utc_from_local(ndt, tz, fmt);
    }
  }

  Err(anyhow!(
    "unrecognized date expression: \
     {input}"
  ))
  .with_context(|| {
    "supported formats: now, today, \
     tomorrow, weekday names (e.g. \
     friday), +Nw/+Nd/+Nh/+Nm, RFC3339, \
     YYYY-MM-DD, YYYY-MM-DDTHH:MM, \
     YYYY-MM-DD HH:MM"
  })
}

fn parse_weekday_name(
  token: &str
) -> Option<Weekday> {
  match token.trim() {
    | "monday" | "mon" => {
      Some(Weekday::Mon)
    }
    | "tuesday" | "tue" | "tues" => {
      Some(Weekday::Tue)
    }
    | "wednesday" | "wed" => {
      Some(Weekday::Wed)
    }
    | "thursday" | "thu" | "thurs" => {
      Some(Weekday::Thu)
    }
    | "friday" | "fri" => {
      Some(Weekday::Fri)
    }
    | "saturday" | "sat" => {
      Some(Weekday::Sat)
    }
    | "sunday" | "sun" => {
      Some(Weekday::Sun)
    }
    | _ => None
  }
}

/// Strictly after `from`: asking for today's weekday gives next week.
fn next_weekday_date(
  from: NaiveDate,
  target: Weekday
) -> NaiveDate {
  let from_idx = i64::from(
    from.weekday().num_days_from_monday()
  );
  let target_idx = i64::from(
    target.num_days_from_monday()
  );
  let mut delta =
    (7 + target_idx - from_idx) % 7;
  if delta == 0 {
    delta = 7;
  }
  from
    .checked_add_signed(Duration::days(
      delta
    ))
    .unwrap_or(from)
}

#[cfg(test)]
mod tests {
  use chrono::{
    DateTime,
    Duration,
    TimeZone,
    Utc
  };

  use super::{
    format_local_date,
    parse_date_expr
  };

  fn now() -> DateTime<Utc> {
    Utc
      .with_ymd_and_hms(
        2026, 2, 17, 12, 0, 0
      )
      .single()
      .expect("valid now")
  }

  #[test]
  fn relative_offsets_add_to_now() {
    let tz = chrono_tz::UTC;
    assert_eq!(
      parse_date_expr("+3d", now(), tz)
        .expect("parse +3d"),
      now() + Duration::days(3)
    );
    assert_eq!(
      parse_date_expr("90m", now(), tz)
        .expect("parse 90m"),
      now() + Duration::minutes(90)
    );
  }

  #[test]
  fn weekday_is_strictly_ahead() {
    let parsed = parse_date_expr(
      "tuesday",
      now(),
      chrono_tz::UTC
    )
    .expect("parse weekday");
    assert_eq!(
      format_local_date(
        parsed,
        chrono_tz::UTC
      ),
      "2026-02-24 00:00"
    );
  }

  #[test]
  fn local_dates_use_the_given_zone() {
    let tz = chrono_tz::Europe::Paris;
    let parsed = parse_date_expr(
      "2026-03-01 09:30",
      now(),
      tz
    )
    .expect("parse local datetime");
    assert_eq!(
      parsed,
      Utc
        .with_ymd_and_hms(
          2026, 3, 1, 8, 30, 0
        )
        .single()
        .expect("valid expected")
    );
  }

  #[test]
  fn tomorrow_is_next_local_midnight() {
    let parsed = parse_date_expr(
      "tomorrow",
      now(),
      chrono_tz::UTC
    )
    .expect("parse tomorrow");
    assert_eq!(
      format_local_date(
        parsed,
        chrono_tz::UTC
      ),
      "2026-02-18 00:00"
    );
  }

  #[test]
  fn huge_offsets_are_errors() {
    for expr in [
      "+999999999d",
      "+99999999999999w",
      "99999999999999999h"
    ] {
      assert!(
        parse_date_expr(
          expr,
          now(),
          chrono_tz::UTC
        )
        .is_err(),
        "{expr} should be rejected"
      );
    }
  }

  #[test]
  fn garbage_is_rejected() {
    assert!(
      parse_date_expr(
        "someday",
        now(),
        chrono_tz::UTC
      )
      .is_err()
    );
  }
}
