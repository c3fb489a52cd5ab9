//! Time utilities: the clock seam, timezone-aware due dates and day boundaries.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::sync::{Arc, Mutex};

use crate::error::{Result, TaskError};

/// Source of "now". The engine samples it once per operation.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock. Clones share the same reading.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut guard = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *guard += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse()
        .map_err(|_| TaskError::InvalidTimezone(name.to_string()))
}

/// Parse a due date in `tz`, returning UTC.
///
/// Accepts `2026-02-20` (local midnight), `2026-02-20 18:00` (local time) or a
/// full RFC3339 timestamp.
pub fn parse_due(input: &str, tz: Tz) -> Result<DateTime<Utc>> {
    let input = input.trim();
    let invalid = || TaskError::InvalidDueDate(input.to_string());

    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return local_midnight(date, tz).ok_or_else(invalid);
    }

    if let Ok(ndt) = NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M") {
        return tz
            .from_local_datetime(&ndt)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(invalid);
    }

    DateTime::parse_from_rfc3339(input)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| invalid())
}

/// Start of `date` in `tz`, as UTC. On a DST fold the earlier instant wins.
///
/// Where the clocks jump forward at midnight (America/Santiago, ...) the day
/// starts at the first wall-clock time that exists, stepping 15 minutes at a time.
pub fn local_midnight(date: NaiveDate, tz: Tz) -> Option<DateTime<Utc>> {
    let start = date.and_time(NaiveTime::MIN);
    (0..=12)
        .filter_map(|step| start.checked_add_signed(Duration::minutes(15 * step)))
        .find_map(|ndt| tz.from_local_datetime(&ndt).earliest())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Calendar date of an instant as seen in `tz`.
pub fn local_date(dt: DateTime<Utc>, tz: Tz) -> NaiveDate {
    dt.with_timezone(&tz).date_naive()
}

/// Short local rendering used by the CLI: date only when the time is midnight.
pub fn format_local(dt: DateTime<Utc>, tz: Tz) -> String {
    let local = dt.with_timezone(&tz);
    if local.time() == NaiveTime::MIN {
        local.format("%Y-%m-%d").to_string()
    } else {
        local.format("%Y-%m-%d %H:%M").to_string()
    }
}
