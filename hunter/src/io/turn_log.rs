//! Per-turn logs under `.hunter/turns/<n>/`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::core::types::{IterationStatus, ProjectState};

#[derive(Debug, Clone, Serialize)]
pub struct TurnMeta {
    pub turn: u32,
    pub status_before: IterationStatus,
    pub status_after: IterationStatus,
    pub cycles_before: usize,
    pub cycles_after: usize,
    pub iterations_modified: bool,
    pub duration_ms: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct TurnPaths {
    pub dir: PathBuf,
    pub meta_path: PathBuf,
    pub state_before_path: PathBuf,
    pub state_after_path: PathBuf,
    pub error_log_path: PathBuf,
}

impl TurnPaths {
    pub fn new(turns_dir: &Path, turn: u32) -> Self {
        let dir = turns_dir.join(turn.to_string());
        Self {
            dir: dir.clone(),
            meta_path: dir.join("meta.json"),
            state_before_path: dir.join("state.before.json"),
            state_after_path: dir.join("state.after.json"),
            error_log_path: dir.join("turn_error.log"),
        }
    }
}

pub struct TurnWriteRequest<'a> {
    pub turns_dir: &'a Path,
    pub meta: &'a TurnMeta,
    pub state_before: &'a ProjectState,
    pub state_after: &'a ProjectState,
}

pub fn write_turn(request: &TurnWriteRequest<'_>) -> Result<TurnPaths> {
    let paths = TurnPaths::new(request.turns_dir, request.meta.turn);
    fs::create_dir_all(&paths.dir)
        .with_context(|| format!("create turn dir {}", paths.dir.display()))?;

    // Write in deterministic order to keep logs stable.
    write_json(&paths.meta_path, request.meta)?;
    write_json(&paths.state_before_path, request.state_before)?;
    write_json(&paths.state_after_path, request.state_after)?;

    Ok(paths)
}

/// Record a failed turn. Nothing else is written for it.
pub fn write_turn_error(turns_dir: &Path, turn: u32, err: &anyhow::Error) -> Result<TurnPaths> {
    let paths = TurnPaths::new(turns_dir, turn);
    fs::create_dir_all(&paths.dir)
        .with_context(|| format!("create turn dir {}", paths.dir.display()))?;
    write_text(&paths.error_log_path, &format!("turn error: {err:#}\n"))?;
    Ok(paths)
}

fn write_text(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).with_context(|| format!("write {}", path.display()))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut buf = serde_json::to_string_pretty(value)?;
    buf.push('\n');
    write_text(path, &buf)
}
