use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// `$TASPLA_HOME`, or `~/.taspla`.
pub fn taspla_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("TASPLA_HOME") {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".taspla"))
}

pub fn ensure_taspla_home() -> Result<PathBuf> {
    let dir = taspla_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

pub fn default_tasks_path() -> Result<PathBuf> {
    Ok(ensure_taspla_home()?.join("tasks.json"))
}
