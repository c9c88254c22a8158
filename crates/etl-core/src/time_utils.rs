use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};

use crate::error::{EtlError, Result};

// ── Date parsing ──────────────────────────────────────────────────────────────

/// Date-only patterns tried in priority order.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d/%m/%Y"];

/// Date-time patterns whose date part is taken when an extract carries a
/// full timestamp.
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// Parse a calendar date from the formats seen in the source extracts.
///
/// Returns [`EtlError::DateParse`] carrying the offending string when no
/// pattern matches; per the pipeline's error model a bad date aborts the run.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(EtlError::DateParse(s.to_string()));
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Ok(date);
        }
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok(dt.date());
        }
    }

    Err(EtlError::DateParse(s.to_string()))
}

/// Parse a date that may legitimately be absent (e.g. a subscription with no
/// end date). Empty or whitespace-only input is `None`; anything non-empty
/// must parse.
pub fn parse_optional_date(s: Option<&str>) -> Result<Option<NaiveDate>> {
    match s {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => parse_date(raw).map(Some),
    }
}

// ── Month arithmetic ──────────────────────────────────────────────────────────

/// The `"%Y-%m"` label used as the month key of snapshot facts.
pub fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// First day of the month containing `date`.
pub fn month_floor(date: NaiveDate) -> NaiveDate {
    date.with_day(1).expect("day 1 is valid for every month")
}

/// First day of the month after the one containing `date`.
pub fn next_month(date: NaiveDate) -> NaiveDate {
    let (y, m) = (date.year(), date.month());
    let (ny, nm) = if m == 12 { (y + 1, 1) } else { (y, m + 1) };
    NaiveDate::from_ymd_opt(ny, nm, 1).expect("first of month is always valid")
}

/// The inclusive month grid: the first day of every month from the month of
/// `start` through the month of `end`, step one month.
///
/// An `end` before `start` yields an empty grid.
pub fn month_grid(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut months = Vec::new();
    let mut current = month_floor(start);
    let last = month_floor(end);
    while current <= last {
        months.push(current);
        current = next_month(current);
    }
    months
}

/// `date + days`, saturating is not needed at batch scale; plain offset.
pub fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    date + Duration::days(days)
}
