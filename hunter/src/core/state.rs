//! Copy-on-write snapshot pair for a single turn.
//!
//! `current` is the committed state and is never touched. Every change goes to
//! `next`, which the owning context persists only after the turn succeeds.

use super::types::{IterationStatus, ProjectState};

#[derive(Debug)]
pub struct Turn<'a> {
    current: &'a ProjectState,
    next: ProjectState,
    iterations_modified: bool,
}

/// Result of committing a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedTurn {
    pub state: ProjectState,
    /// The cycle collection changed structurally and must be flushed.
    pub iterations_modified: bool,
}

impl<'a> Turn<'a> {
    pub fn begin(current: &'a ProjectState) -> Self {
        Self {
            current,
            next: current.clone(),
            iterations_modified: false,
        }
    }

    pub fn current(&self) -> &ProjectState {
        self.current
    }

    pub fn next(&self) -> &ProjectState {
        &self.next
    }

    pub fn next_mut(&mut self) -> &mut ProjectState {
        &mut self.next
    }

    pub fn complete_iteration(&mut self) {
        self.next.iteration.status = IterationStatus::Complete;
    }

    pub fn flag_iterations_as_modified(&mut self) {
        self.iterations_modified = true;
    }

    pub fn iterations_modified(&self) -> bool {
        self.iterations_modified
    }

    pub fn commit(self) -> CommittedTurn {
        CommittedTurn {
            state: self.next,
            iterations_modified: self.iterations_modified,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Iteration;

    #[test]
    fn edits_to_next_leave_current_untouched() {
        let committed = ProjectState::new(Iteration::reported("login fails", None));
        let mut turn = Turn::begin(&committed);

        turn.next_mut().iteration.cycles.append("check the form");
        turn.complete_iteration();

        assert_eq!(turn.current(), &committed);
        assert!(turn.current().iteration.cycles.is_empty());
        assert_eq!(turn.next().iteration.status, IterationStatus::Complete);
    }

    #[test]
    fn commit_carries_modification_flag() {
        let committed = ProjectState::new(Iteration::reported("crash", None));
        let turn = Turn::begin(&committed);
        assert!(!turn.commit().iterations_modified);

        let mut turn = Turn::begin(&committed);
        turn.flag_iterations_as_modified();
        let out = turn.commit();
        assert!(out.iterations_modified);
        assert_eq!(out.state, committed);
    }
}
