//! Temporal predicates: overdue and reminder-due.
//!
//! Both are derived on every evaluation from the task and a [`RankContext`];
//! nothing here is stored on the task.

use chrono::{DateTime, Days, Duration, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::task::Task;
use crate::time::local_date;

/// A single clock reading plus the zone that defines midnight.
///
/// One context is built per ranking pass so every predicate in the pass sees
/// the same `now`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankContext {
    pub now: DateTime<Utc>,
    pub tz: Tz,
}

impl RankContext {
    pub fn new(now: DateTime<Utc>, tz: Tz) -> Self {
        Self { now, tz }
    }

    pub fn utc(now: DateTime<Utc>) -> Self {
        Self { now, tz: Tz::UTC }
    }
}

/// Due date strictly before today, comparing local calendar dates only.
pub fn is_overdue(task: &Task, ctx: &RankContext) -> bool {
    local_date(task.due, ctx.tz) < local_date(ctx.now, ctx.tz)
}

/// `due - reminder_days - reminder_hours`, or `None` when both offsets are
/// absent or zero.
///
/// Days are calendar days in `tz`, so a reminder two days before a noon
/// deadline stays at noon across a DST change. Hours are elapsed hours.
pub fn reminder_instant(task: &Task, tz: Tz) -> Option<DateTime<Utc>> {
    if !task.has_reminder() {
        return None;
    }

    let days = task.reminder_days.unwrap_or(0);
    let hours = i64::from(task.reminder_hours.unwrap_or(0));

    let at = sub_local_days(task.due, days, tz)
        .and_then(|dt| dt.checked_sub_signed(Duration::hours(hours)))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    Some(at)
}

fn sub_local_days(due: DateTime<Utc>, days: u32, tz: Tz) -> Option<DateTime<Utc>> {
    if days == 0 {
        return Some(due);
    }
    let local = due
        .with_timezone(&tz)
        .naive_local()
        .checked_sub_days(Days::new(u64::from(days)))?;
    resolve_local(local, tz).map(|dt| dt.with_timezone(&Utc))
}

// Fold: earlier instant. Gap: push forward an hour, like a wall clock would.
fn resolve_local(local: NaiveDateTime, tz: Tz) -> Option<DateTime<Tz>> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => {
            let shifted = local.checked_add_signed(Duration::hours(1))?;
            tz.from_local_datetime(&shifted).earliest()
        }
    }
}

/// Reminder instant reached and the task is not overdue. Overdue wins.
pub fn is_reminder_due(task: &Task, ctx: &RankContext) -> bool {
    match reminder_instant(task, ctx.tz) {
        Some(at) => ctx.now >= at && !is_overdue(task, ctx),
        None => false,
    }
}
