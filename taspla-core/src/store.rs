//! Persistence seam.
//!
//! The task service (remote API, local file, ...) sits behind [`TaskStore`].
//! [`TaskSession`] keeps an engine and a store in step: each mutation runs on
//! the engine first, then the resulting record is written through. A failed
//! write rolls the engine back so the two never diverge.

use anyhow::{bail, Context, Result};
use chrono_tz::Tz;

use crate::engine::TaskEngine;
use crate::task::{Task, TaskDraft, TaskPatch};
use crate::time::Clock;

pub trait TaskStore {
    /// All records, newest first.
    fn list(&self) -> Result<Vec<Task>>;

    fn insert(&mut self, task: &Task) -> Result<()>;

    /// Replace the record with the same id. Complete and restore land here too.
    fn update(&mut self, task: &Task) -> Result<()>;

    fn delete(&mut self, id: &str) -> Result<()>;
}

/// In-process store, newest first.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tasks: Vec<Task>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }
}

impl TaskStore for MemoryStore {
    fn list(&self) -> Result<Vec<Task>> {
        Ok(self.tasks.clone())
    }

    fn insert(&mut self, task: &Task) -> Result<()> {
        if self.tasks.iter().any(|t| t.id == task.id) {
            bail!("task {} already exists", task.id);
        }
        self.tasks.insert(0, task.clone());
        Ok(())
    }

    fn update(&mut self, task: &Task) -> Result<()> {
        let Some(slot) = self.tasks.iter_mut().find(|t| t.id == task.id) else {
            bail!("task {} not found", task.id);
        };
        *slot = task.clone();
        Ok(())
    }

    fn delete(&mut self, id: &str) -> Result<()> {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        if self.tasks.len() == before {
            bail!("task {id} not found");
        }
        Ok(())
    }
}

/// Engine plus the store it mirrors.
#[derive(Debug)]
pub struct TaskSession<S: TaskStore, C: Clock> {
    engine: TaskEngine<C>,
    store: S,
}

impl<S: TaskStore, C: Clock> TaskSession<S, C> {
    /// Load every record from `store` into a fresh engine.
    pub fn open(store: S, clock: C, tz: Tz) -> Result<Self> {
        let tasks = store.list().context("list tasks from store")?;
        let engine = TaskEngine::from_tasks(tasks, clock)
            .context("load tasks into engine")?
            .with_timezone(tz);
        tracing::debug!(count = engine.len(), "session opened");
        Ok(Self { engine, store })
    }

    pub fn engine(&self) -> &TaskEngine<C> {
        &self.engine
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_parts(self) -> (TaskEngine<C>, S) {
        (self.engine, self.store)
    }

    pub fn create(&mut self, draft: TaskDraft) -> Result<Task> {
        let task = self.engine.create(draft)?;
        if let Err(e) = self.store.insert(&task) {
            self.engine.remove(&task.id);
            return Err(e.context(format!("store insert {}", task.id)));
        }
        Ok(task)
    }

    pub fn complete(&mut self, id: &str) -> Result<Task> {
        self.mutate(id, |e| e.complete(id))
    }

    pub fn restore(&mut self, id: &str) -> Result<Task> {
        self.mutate(id, |e| e.restore(id))
    }

    pub fn update(&mut self, id: &str, draft: TaskDraft) -> Result<Task> {
        self.mutate(id, |e| e.update(id, draft))
    }

    pub fn patch(&mut self, id: &str, patch: TaskPatch) -> Result<Task> {
        self.mutate(id, |e| e.patch(id, patch))
    }

    /// Unknown ids are a no-op, as on the engine.
    pub fn remove(&mut self, id: &str) -> Result<Option<Task>> {
        let Some(idx) = self.engine.position(id) else {
            return Ok(None);
        };
        let Some(task) = self.engine.remove(id) else {
            return Ok(None);
        };
        if let Err(e) = self.store.delete(id) {
            self.engine.reinsert(idx, task);
            return Err(e.context(format!("store delete {id}")));
        }
        Ok(Some(task))
    }

    fn mutate<F>(&mut self, id: &str, op: F) -> Result<Task>
    where
        F: FnOnce(&mut TaskEngine<C>) -> crate::error::Result<Task>,
    {
        let prior = self.engine.get(id).cloned();
        let task = op(&mut self.engine)?;
        if let Err(e) = self.store.update(&task) {
            if let Some(prior) = prior {
                self.engine.overwrite(prior);
            }
            tracing::warn!(id, error = %e, "store update failed; engine rolled back");
            return Err(e.context(format!("store update {id}")));
        }
        Ok(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TaskError;
    use crate::task::{Priority, TaskStatus};
    use crate::time::FixedClock;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 15, 9, 0, 0).unwrap()
    }

    /// Accepts inserts, refuses everything else.
    #[derive(Default)]
    struct ReadOnlyAfterInsert {
        inner: MemoryStore,
    }

    impl TaskStore for ReadOnlyAfterInsert {
        fn list(&self) -> Result<Vec<Task>> {
            self.inner.list()
        }
        fn insert(&mut self, task: &Task) -> Result<()> {
            self.inner.insert(task)
        }
        fn update(&mut self, _task: &Task) -> Result<()> {
            bail!("service unavailable")
        }
        fn delete(&mut self, _id: &str) -> Result<()> {
            bail!("service unavailable")
        }
    }

    fn session() -> TaskSession<MemoryStore, FixedClock> {
        TaskSession::open(MemoryStore::new(), FixedClock::new(now()), Tz::UTC).unwrap()
    }

    #[test]
    fn mutations_reach_the_store() {
        let mut s = session();
        let t = s
            .create(TaskDraft::new("a", Priority::High, now() + Duration::days(1)))
            .unwrap();
        s.complete(&t.id).unwrap();

        let stored = s.store().list().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].status, TaskStatus::Completed);
        assert!(stored[0].completed_at.is_some());

        s.remove(&t.id).unwrap();
        assert!(s.store().list().unwrap().is_empty());
    }

    #[test]
    fn reopen_sees_same_tasks() {
        let mut s = session();
        let t = s
            .create(TaskDraft::new("a", Priority::Low, now() + Duration::days(1)))
            .unwrap();
        let (_, store) = s.into_parts();

        let reopened = TaskSession::open(store, FixedClock::new(now()), Tz::UTC).unwrap();
        assert_eq!(reopened.engine().get(&t.id), Some(&t));
    }

    #[test]
    fn failed_update_rolls_engine_back() {
        let mut s = TaskSession::open(
            ReadOnlyAfterInsert::default(),
            FixedClock::new(now()),
            Tz::UTC,
        )
        .unwrap();
        let t = s
            .create(TaskDraft::new("a", Priority::Low, now() + Duration::days(1)))
            .unwrap();

        assert!(s.complete(&t.id).is_err());
        assert_eq!(s.engine().get(&t.id).map(|t| t.status), Some(TaskStatus::Active));
        assert_eq!(s.engine().get(&t.id).and_then(|t| t.completed_at), None);
    }

    #[test]
    fn failed_delete_puts_task_back_in_place() {
        let mut s = TaskSession::open(
            ReadOnlyAfterInsert::default(),
            FixedClock::new(now()),
            Tz::UTC,
        )
        .unwrap();
        let a = s.create(TaskDraft::new("a", Priority::Low, now())).unwrap();
        let b = s.create(TaskDraft::new("b", Priority::Low, now())).unwrap();

        assert!(s.remove(&a.id).is_err());
        let ids: Vec<_> = s.engine().snapshot().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![b.id, a.id]);
    }

    #[test]
    fn not_found_surfaces_engine_error() {
        let mut s = session();
        let err = s.complete("missing").unwrap_err();
        assert_eq!(
            err.downcast_ref::<TaskError>(),
            Some(&TaskError::TaskNotFound("missing".into()))
        );
        assert_eq!(s.remove("missing").unwrap(), None);
    }

    #[test]
    fn open_rejects_duplicate_records() {
        let t = Task::new("dup", TaskDraft::new("a", Priority::Low, now()), now());
        let store = MemoryStore::with_tasks(vec![t.clone(), t]);
        assert!(TaskSession::open(store, FixedClock::new(now()), Tz::UTC).is_err());
    }
}
