//! Transitions owned by the logging and fix stages.
//!
//! Those stages live outside this crate. `hunter handoff` records that one of
//! them finished so the next turn can pick the iteration up again.

use std::path::Path;

use anyhow::{Result, bail};
use clap::ValueEnum;
use tracing::info;

use crate::core::invariants::validate_invariants;
use crate::core::types::IterationStatus;
use crate::io::init::HunterPaths;
use crate::io::session_store::{load_session, write_session};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Handoff {
    /// Logging was added to the code; the user can now reproduce.
    LogsAdded,
    /// A fix was applied; the user can now test it.
    FixApplied,
}

impl Handoff {
    fn transition(self) -> (IterationStatus, IterationStatus) {
        match self {
            Self::LogsAdded => (
                IterationStatus::AwaitingLogging,
                IterationStatus::AwaitingBugReproduction,
            ),
            Self::FixApplied => (
                IterationStatus::AwaitingBugFix,
                IterationStatus::AwaitingUserTest,
            ),
        }
    }
}

/// Apply `handoff` to the stored iteration and return the new status.
pub fn apply_handoff(root: &Path, handoff: Handoff) -> Result<IterationStatus> {
    let paths = HunterPaths::new(root);
    let mut session = load_session(&paths.session_path)?;
    let (expected, next) = handoff.transition();
    let status = session.project.iteration.status;
    if status != expected {
        bail!("cannot apply {handoff:?}: iteration is {status}, expected {expected}");
    }

    session.project.iteration.status = next;
    let errors = validate_invariants(&session.project.iteration);
    if !errors.is_empty() {
        bail!("invariant violations:\n- {}", errors.join("\n- "));
    }
    write_session(&paths.session_path, &session)?;
    info!(from = %status, to = %next, "hand-off applied");
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::session_store::SessionState;
    use crate::test_support::{TestProject, cycle, project};

    fn seed(repo: &TestProject, status: IterationStatus) {
        repo.write_session(&SessionState::new(project(
            status,
            vec![cycle("log the cart", "", "", false)],
        )))
        .expect("session");
    }

    #[test]
    fn logs_added_moves_to_reproduction() {
        let repo = TestProject::new().expect("project");
        seed(&repo, IterationStatus::AwaitingLogging);

        let next = apply_handoff(repo.path(), Handoff::LogsAdded).expect("handoff");

        assert_eq!(next, IterationStatus::AwaitingBugReproduction);
        assert_eq!(repo.read_session().expect("read").project.iteration.status, next);
    }

    #[test]
    fn fix_applied_moves_to_user_test() {
        let repo = TestProject::new().expect("project");
        seed(&repo, IterationStatus::AwaitingBugFix);

        let next = apply_handoff(repo.path(), Handoff::FixApplied).expect("handoff");

        assert_eq!(next, IterationStatus::AwaitingUserTest);
    }

    #[test]
    fn mismatched_status_is_rejected() {
        let repo = TestProject::new().expect("project");
        seed(&repo, IterationStatus::AwaitingBugFix);

        let err = apply_handoff(repo.path(), Handoff::LogsAdded).unwrap_err();

        assert!(err.to_string().contains("expected AWAITING_LOGGING"));
        assert_eq!(
            repo.read_session().expect("read").project.iteration.status,
            IterationStatus::AwaitingBugFix
        );
    }
}
