//! TaskEngine — the owned task collection for one session.
//!
//! Storage is a `VecDeque<Task>` with the newest task at the front. Derived
//! views (ranking, overdue, reminders) are recomputed on every read from the
//! current data and a single clock reading; nothing derived is cached.

use chrono_tz::Tz;
use std::collections::{HashSet, VecDeque};
use uuid::Uuid;

use crate::error::{Result, TaskError};
use crate::ranking::{rank, RankedTask};
use crate::reminders::RankContext;
use crate::task::{Task, TaskDraft, TaskFilter, TaskPatch, TaskStatus};
use crate::time::{Clock, SystemClock};

#[derive(Debug, Clone)]
pub struct TaskEngine<C: Clock = SystemClock> {
    tasks: VecDeque<Task>,
    clock: C,
    tz: Tz,
}

impl TaskEngine<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for TaskEngine<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> TaskEngine<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            tasks: VecDeque::new(),
            clock,
            tz: Tz::UTC,
        }
    }

    /// Seed from records the store already holds, keeping their order.
    pub fn from_tasks(tasks: Vec<Task>, clock: C) -> Result<Self> {
        let mut seen = HashSet::new();
        for t in &tasks {
            if !seen.insert(t.id.as_str()) {
                return Err(TaskError::DuplicateTaskId(t.id.clone()));
            }
            if !t.is_consistent() {
                return Err(TaskError::InvalidTaskData(format!(
                    "task {} has status {} but completed_at is {}",
                    t.id,
                    t.status,
                    if t.completed_at.is_some() { "set" } else { "missing" }
                )));
            }
        }

        Ok(Self {
            tasks: tasks.into(),
            clock,
            tz: Tz::UTC,
        })
    }

    /// Zone whose midnight decides "today" for overdue checks.
    pub fn with_timezone(mut self, tz: Tz) -> Self {
        self.tz = tz;
        self
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Sample the clock once.
    pub fn context(&self) -> RankContext {
        RankContext::new(self.clock.now(), self.tz)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Create an Active task at the front of the collection.
    pub fn create(&mut self, draft: TaskDraft) -> Result<Task> {
        draft.validate()?;

        let id = self.fresh_id();
        let task = Task::new(id, draft, self.clock.now());
        tracing::debug!(id = %task.id, priority = %task.priority, "task created");

        self.tasks.push_front(task.clone());
        Ok(task)
    }

    /// Active -> Completed, stamping `completed_at`.
    pub fn complete(&mut self, id: &str) -> Result<Task> {
        let now = self.clock.now();
        let task = self.get_mut(id)?;
        transition(task, TaskStatus::Active, TaskStatus::Completed)?;
        task.completed_at = Some(now);
        tracing::debug!(id, "task completed");
        Ok(task.clone())
    }

    /// Completed -> Active, clearing `completed_at`.
    pub fn restore(&mut self, id: &str) -> Result<Task> {
        let task = self.get_mut(id)?;
        transition(task, TaskStatus::Completed, TaskStatus::Active)?;
        task.completed_at = None;
        tracing::debug!(id, "task restored");
        Ok(task.clone())
    }

    /// Replace every mutable field. Status and timestamps are untouched.
    pub fn update(&mut self, id: &str, draft: TaskDraft) -> Result<Task> {
        draft.validate()?;
        let task = self.get_mut(id)?;
        task.apply_draft(draft);
        tracing::debug!(id, "task updated");
        Ok(task.clone())
    }

    /// Change only the fields set in `patch`.
    pub fn patch(&mut self, id: &str, patch: TaskPatch) -> Result<Task> {
        patch.validate()?;
        let task = self.get_mut(id)?;
        task.apply_patch(patch);
        tracing::debug!(id, "task patched");
        Ok(task.clone())
    }

    /// Delete permanently. Removing an unknown id is a no-op and returns `None`.
    pub fn remove(&mut self, id: &str) -> Option<Task> {
        let idx = self.position(id)?;
        let removed = self.tasks.remove(idx);
        tracing::debug!(id, "task removed");
        removed
    }

    /// Active tasks in ranking order, ranked against the current clock.
    pub fn active_tasks(&self) -> Vec<&Task> {
        self.ranked_active().into_iter().map(|r| r.task).collect()
    }

    /// Like [`active_tasks`](Self::active_tasks) with tier and badge flags.
    pub fn ranked_active(&self) -> Vec<RankedTask<'_>> {
        self.ranked_active_at(&self.context())
    }

    /// Rank against an explicit context instead of sampling the clock.
    pub fn ranked_active_at(&self, ctx: &RankContext) -> Vec<RankedTask<'_>> {
        rank(self.tasks.iter().filter(|t| t.is_active()), ctx)
    }

    /// Completed tasks in collection order.
    pub fn completed_tasks(&self) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Completed)
            .collect()
    }

    /// Collection order, newest first.
    pub fn list(&self, filter: &TaskFilter) -> Vec<&Task> {
        self.tasks.iter().filter(|t| filter.matches(t)).collect()
    }

    /// Active tasks whose reminder instant has passed and that are not overdue.
    pub fn due_reminders(&self) -> Vec<&Task> {
        self.ranked_active()
            .into_iter()
            .filter(|r| r.reminder_due)
            .map(|r| r.task)
            .collect()
    }

    pub fn snapshot(&self) -> Vec<Task> {
        self.tasks.iter().cloned().collect()
    }

    /// Resolve a unique id prefix to a full id.
    pub fn resolve_id(&self, prefix: &str) -> Result<String> {
        if prefix.is_empty() {
            return Err(TaskError::TaskNotFound(String::new()));
        }
        if self.get(prefix).is_some() {
            return Ok(prefix.to_string());
        }

        let mut hits = self.tasks.iter().filter(|t| t.id.starts_with(prefix));
        match (hits.next(), hits.next()) {
            (Some(t), None) => Ok(t.id.clone()),
            (Some(_), Some(_)) => Err(TaskError::InvalidTaskData(format!(
                "id prefix '{prefix}' is ambiguous"
            ))),
            _ => Err(TaskError::TaskNotFound(prefix.to_string())),
        }
    }

    pub(crate) fn position(&self, id: &str) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }

    /// Put a previously removed task back at `idx`.
    pub(crate) fn reinsert(&mut self, idx: usize, task: Task) {
        let idx = idx.min(self.tasks.len());
        self.tasks.insert(idx, task);
    }

    /// Overwrite the stored copy of `task.id` with `task`.
    pub(crate) fn overwrite(&mut self, task: Task) {
        if let Some(slot) = self.tasks.iter_mut().find(|t| t.id == task.id) {
            *slot = task;
        }
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut Task> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| TaskError::TaskNotFound(id.to_string()))
    }

    fn fresh_id(&self) -> String {
        loop {
            let id = Uuid::new_v4().to_string();
            if self.get(&id).is_none() {
                return id;
            }
        }
    }
}

fn transition(task: &mut Task, from: TaskStatus, to: TaskStatus) -> Result<()> {
    if task.status != from {
        return Err(TaskError::InvalidTransition {
            id: task.id.clone(),
            from: task.status,
            to,
        });
    }
    task.status = to;
    Ok(())
}
