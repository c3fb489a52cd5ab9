//! JSON file implementation of the task store.
//!
//! The whole list lives in one pretty-printed JSON array, newest first. Every
//! write rewrites the file through a temp file + rename.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use taspla_core::{Task, TaskStore};

#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    tasks: Vec<Task>,
}

impl JsonFileStore {
    /// Open `path`, treating a missing file as an empty list.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let tasks = if path.exists() {
            let s = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
            if s.trim().is_empty() {
                Vec::new()
            } else {
                serde_json::from_str(&s).with_context(|| format!("parse {}", path.display()))?
            }
        } else {
            Vec::new()
        };
        tracing::debug!(path = %path.display(), count = tasks.len(), "task file opened");
        Ok(Self { path, tasks })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
            }
        }
        let json = serde_json::to_string_pretty(&self.tasks)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).with_context(|| format!("write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("rename {} -> {}", tmp.display(), self.path.display()))?;
        Ok(())
    }
}

impl TaskStore for JsonFileStore {
    fn list(&self) -> Result<Vec<Task>> {
        Ok(self.tasks.clone())
    }

    fn insert(&mut self, task: &Task) -> Result<()> {
        if self.tasks.iter().any(|t| t.id == task.id) {
            bail!("task {} already exists in {}", task.id, self.path.display());
        }
        self.tasks.insert(0, task.clone());
        self.persist()
    }

    fn update(&mut self, task: &Task) -> Result<()> {
        let Some(slot) = self.tasks.iter_mut().find(|t| t.id == task.id) else {
            bail!("task {} not found in {}", task.id, self.path.display());
        };
        *slot = task.clone();
        self.persist()
    }

    fn delete(&mut self, id: &str) -> Result<()> {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        if self.tasks.len() == before {
            bail!("task {id} not found in {}", self.path.display());
        }
        self.persist()
    }
}
