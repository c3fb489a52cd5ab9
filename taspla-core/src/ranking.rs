//! Active-task ranking.
//!
//! Ordering is an explicit multi-key comparison on [`RankKey`]:
//! - tier ASC (Critical, then Overdue, then Reminder, then Rest)
//! - priority rank ASC, only inside the Rest tier
//! - due ASC
//!
//! Ties on all three keep collection order (the sort is stable).

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;

use crate::reminders::{is_overdue, is_reminder_due, RankContext};
use crate::task::{Priority, Task};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Critical = 0,
    Overdue = 1,
    Reminder = 2,
    Rest = 3,
}

/// Sort key for one task, computed once per ranking pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankKey {
    pub tier: Tier,
    /// Priority rank inside [`Tier::Rest`]; 0 in every other tier.
    pub secondary: u8,
    pub due: DateTime<Utc>,
}

impl RankKey {
    pub fn of(task: &Task, ctx: &RankContext) -> Self {
        let tier = classify(task, ctx);
        let secondary = match tier {
            Tier::Rest => task.priority.rank(),
            _ => 0,
        };
        Self {
            tier,
            secondary,
            due: task.due,
        }
    }
}

impl PartialOrd for RankKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RankKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.tier
            .cmp(&other.tier)
            .then_with(|| self.secondary.cmp(&other.secondary))
            .then_with(|| self.due.cmp(&other.due))
    }
}

/// First matching tier wins: Critical beats overdue, overdue beats reminder.
pub fn classify(task: &Task, ctx: &RankContext) -> Tier {
    if task.priority == Priority::Critical {
        Tier::Critical
    } else if is_overdue(task, ctx) {
        Tier::Overdue
    } else if is_reminder_due(task, ctx) {
        Tier::Reminder
    } else {
        Tier::Rest
    }
}

/// Compare two tasks under one context. Equal means "keep collection order".
pub fn compare(a: &Task, b: &Task, ctx: &RankContext) -> Ordering {
    RankKey::of(a, ctx).cmp(&RankKey::of(b, ctx))
}

/// A task in ranked position with the flags the client shows next to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedTask<'a> {
    pub task: &'a Task,
    pub tier: Tier,
    pub overdue: bool,
    pub reminder_due: bool,
}

/// Rank the given tasks. Callers pass only Active tasks.
pub fn rank<'a, I>(tasks: I, ctx: &RankContext) -> Vec<RankedTask<'a>>
where
    I: IntoIterator<Item = &'a Task>,
{
    let mut keyed: Vec<(RankKey, RankedTask<'a>)> = tasks
        .into_iter()
        .map(|task| {
            let key = RankKey::of(task, ctx);
            let ranked = RankedTask {
                task,
                tier: key.tier,
                overdue: is_overdue(task, ctx),
                reminder_due: is_reminder_due(task, ctx),
            };
            (key, ranked)
        })
        .collect();

    keyed.sort_by(|a, b| a.0.cmp(&b.0));

    tracing::trace!(count = keyed.len(), now = %ctx.now, "ranked tasks");

    keyed.into_iter().map(|(_, r)| r).collect()
}
