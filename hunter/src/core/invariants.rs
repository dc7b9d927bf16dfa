//! Semantic invariants of a persisted iteration.

use super::types::{Iteration, IterationStatus};

/// Check invariants not expressible through serde alone:
/// - `user_feedback` is not blank
/// - cycles exist before the controller waits on a test or a reproduction
/// - once a cycle records a fix attempt, every later cycle does too
pub fn validate_invariants(iteration: &Iteration) -> Vec<String> {
    let mut errors = Vec::new();

    if iteration.user_feedback.trim().is_empty() {
        errors.push("user_feedback must not be empty".to_string());
    }

    let needs_cycle = matches!(
        iteration.status,
        IterationStatus::AwaitingUserTest | IterationStatus::AwaitingBugReproduction
    );
    if needs_cycle && iteration.cycles.is_empty() {
        errors.push(format!(
            "status {} requires at least one hunting cycle",
            iteration.status
        ));
    }

    let mut tainted_at = None;
    for (idx, cycle) in iteration.cycles.iter().enumerate() {
        match (tainted_at, cycle.fix_attempted) {
            (None, true) => tainted_at = Some(idx),
            (Some(first), false) => errors.push(format!(
                "cycle {idx}: fix_attempted cleared after cycle {first} recorded a fix attempt"
            )),
            _ => {}
        }
    }

    errors
}
