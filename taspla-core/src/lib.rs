//! taspla-core: task ranking and temporal-state engine for the Taspla client.

pub mod engine;
pub mod error;
pub mod ranking;
pub mod reminders;
pub mod shared;
pub mod store;
pub mod task;
pub mod time;

pub use engine::TaskEngine;
pub use error::TaskError;
pub use ranking::{classify, compare, rank, RankKey, RankedTask, Tier};
pub use reminders::{is_overdue, is_reminder_due, reminder_instant, RankContext};
pub use shared::SharedTaskEngine;
pub use store::{MemoryStore, TaskSession, TaskStore};
pub use task::{Priority, Task, TaskDraft, TaskDraftInput, TaskFilter, TaskPatch, TaskStatus};
pub use time::{Clock, FixedClock, SystemClock};
