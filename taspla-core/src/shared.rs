//! Lock-guarded engine handle for hosts with more than one caller.
//!
//! One `RwLock` guards the whole collection: writers are exclusive, readers
//! get owned snapshots taken under the read lock.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::engine::TaskEngine;
use crate::error::Result;
use crate::task::{Task, TaskDraft, TaskFilter, TaskPatch};
use crate::time::{Clock, SystemClock};

pub struct SharedTaskEngine<C: Clock = SystemClock> {
    inner: Arc<RwLock<TaskEngine<C>>>,
}

impl<C: Clock> Clone for SharedTaskEngine<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: Clock> From<TaskEngine<C>> for SharedTaskEngine<C> {
    fn from(engine: TaskEngine<C>) -> Self {
        Self::new(engine)
    }
}

impl<C: Clock> SharedTaskEngine<C> {
    pub fn new(engine: TaskEngine<C>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(engine)),
        }
    }

    // Every engine method finishes its mutation before it can panic out, so a
    // poisoned lock still guards consistent data.
    fn read_guard(&self) -> RwLockReadGuard<'_, TaskEngine<C>> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, TaskEngine<C>> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Run `f` under the read lock.
    pub fn read<R>(&self, f: impl FnOnce(&TaskEngine<C>) -> R) -> R {
        f(&self.read_guard())
    }

    /// Run `f` under the write lock, for compound operations.
    pub fn write<R>(&self, f: impl FnOnce(&mut TaskEngine<C>) -> R) -> R {
        f(&mut self.write_guard())
    }

    pub fn create(&self, draft: TaskDraft) -> Result<Task> {
        self.write_guard().create(draft)
    }

    pub fn complete(&self, id: &str) -> Result<Task> {
        self.write_guard().complete(id)
    }

    pub fn restore(&self, id: &str) -> Result<Task> {
        self.write_guard().restore(id)
    }

    pub fn update(&self, id: &str, draft: TaskDraft) -> Result<Task> {
        self.write_guard().update(id, draft)
    }

    pub fn patch(&self, id: &str, patch: TaskPatch) -> Result<Task> {
        self.write_guard().patch(id, patch)
    }

    pub fn remove(&self, id: &str) -> Option<Task> {
        self.write_guard().remove(id)
    }

    pub fn get(&self, id: &str) -> Option<Task> {
        self.read_guard().get(id).cloned()
    }

    pub fn active_tasks(&self) -> Vec<Task> {
        self.read_guard().active_tasks().into_iter().cloned().collect()
    }

    pub fn completed_tasks(&self) -> Vec<Task> {
        self.read_guard().completed_tasks().into_iter().cloned().collect()
    }

    pub fn list(&self, filter: &TaskFilter) -> Vec<Task> {
        self.read_guard().list(filter).into_iter().cloned().collect()
    }

    pub fn due_reminders(&self) -> Vec<Task> {
        self.read_guard().due_reminders().into_iter().cloned().collect()
    }

    pub fn snapshot(&self) -> Vec<Task> {
        self.read_guard().snapshot()
    }
}
