//! Orchestration for a single `hunter turn`.

use std::path::Path;
use std::time::Instant;

use anyhow::{Result, bail};
use tracing::{info, warn};

use crate::core::immutability::check_cycle_history;
use crate::core::invariants::validate_invariants;
use crate::core::state::{CommittedTurn, Turn};
use crate::hunter::{BugHunter, Temperatures, TurnOutcome};
use crate::io::backend::Backend;
use crate::io::channel::Channel;
use crate::io::config::load_config;
use crate::io::init::HunterPaths;
use crate::io::session_store::{load_session, write_session};
use crate::io::turn_log::{TurnMeta, TurnWriteRequest, write_turn, write_turn_error};

/// Result of a committed turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReport {
    /// Turn number (1-indexed).
    pub turn: u32,
    pub outcome: TurnOutcome,
    pub iterations_modified: bool,
}

/// Load the session under `root`, run one turn, and persist the result.
///
/// A failed turn writes `turn_error.log` and leaves the session untouched, so
/// the same turn number is retried next time.
pub fn run_turn_in<B: Backend, C: Channel>(
    root: &Path,
    backend: B,
    channel: C,
) -> Result<TurnReport> {
    let start = Instant::now();
    let paths = HunterPaths::new(root);
    let cfg = load_config(&paths.config_path)?;
    let mut session = load_session(&paths.session_path)?;
    let turn_no = session.next_turn;
    let hunter = BugHunter::new(backend, channel, Temperatures::from(&cfg));

    let attempt = (|| -> Result<(TurnOutcome, CommittedTurn)> {
        let mut turn = Turn::begin(&session.project);
        let outcome = hunter.run_turn(&mut turn)?;

        let mut errors = check_cycle_history(&turn.current().iteration, &turn.next().iteration);
        errors.extend(validate_invariants(&turn.next().iteration));
        if !errors.is_empty() {
            bail!("turn produced an invalid iteration:\n- {}", errors.join("\n- "));
        }
        Ok((outcome, turn.commit()))
    })();

    let (outcome, committed) = match attempt {
        Ok(done) => done,
        Err(err) => {
            warn!(turn = turn_no, error = %format!("{err:#}"), "turn failed");
            write_turn_error(&paths.turns_dir, turn_no, &err)?;
            return Err(err);
        }
    };

    let before = std::mem::replace(&mut session.project, committed.state);
    if committed.iterations_modified {
        session.iterations_revision += 1;
    }
    session.next_turn += 1;

    let meta = TurnMeta {
        turn: turn_no,
        status_before: before.iteration.status,
        status_after: session.project.iteration.status,
        cycles_before: before.iteration.cycles.len(),
        cycles_after: session.project.iteration.cycles.len(),
        iterations_modified: committed.iterations_modified,
        duration_ms: Some(start.elapsed().as_millis() as u64),
    };
    write_turn(&TurnWriteRequest {
        turns_dir: &paths.turns_dir,
        meta: &meta,
        state_before: &before,
        state_after: &session.project,
    })?;
    write_session(&paths.session_path, &session)?;

    info!(turn = turn_no, status = %session.project.iteration.status, "turn committed");
    Ok(TurnReport {
        turn: turn_no,
        outcome,
        iterations_modified: committed.iterations_modified,
    })
}
