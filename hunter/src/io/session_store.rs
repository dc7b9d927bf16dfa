//! Session storage (`.hunter/state/session.json`).

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::invariants::validate_invariants;
use crate::core::types::{Iteration, ProjectState};
use crate::io::atomic::write_atomic;

/// Persisted state owned by the surrounding session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionState {
    /// Next turn number (1-indexed, monotonically increasing).
    pub next_turn: u32,
    /// Bumped whenever a committed turn flagged the cycles as modified.
    pub iterations_revision: u32,
    pub project: ProjectState,
    /// Completed iterations from earlier bug reports, oldest first.
    #[serde(default)]
    pub archived: Vec<Iteration>,
}

impl SessionState {
    pub fn new(project: ProjectState) -> Self {
        Self {
            next_turn: 1,
            iterations_revision: 0,
            project,
            archived: Vec::new(),
        }
    }
}

/// Load and validate the session from disk.
pub fn load_session(path: &Path) -> Result<SessionState> {
    debug!(path = %path.display(), "loading session");
    if !path.exists() {
        return Err(anyhow!(
            "missing session {} (run `hunter report` first)",
            path.display()
        ));
    }
    let contents =
        fs::read_to_string(path).with_context(|| format!("read session {}", path.display()))?;
    let state: SessionState = serde_json::from_str(&contents)
        .with_context(|| format!("parse session {}", path.display()))?;
    let errors = validate_invariants(&state.project.iteration);
    if !errors.is_empty() {
        bail!("invariant violations:\n- {}", errors.join("\n- "));
    }
    debug!(
        next_turn = state.next_turn,
        status = %state.project.iteration.status,
        cycles = state.project.iteration.cycles.len(),
        "session loaded"
    );
    Ok(state)
}

/// Atomically write the session to disk (temp file + rename).
pub fn write_session(path: &Path, state: &SessionState) -> Result<()> {
    debug!(path = %path.display(), next_turn = state.next_turn, status = %state.project.iteration.status, "writing session");
    let mut buf = serde_json::to_string_pretty(state)?;
    buf.push('\n');
    write_atomic(path, &buf)
}
