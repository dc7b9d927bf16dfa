//! Cycle-history immutability checks across one turn.

use super::types::Iteration;

/// Validate that a turn only touched what it is allowed to touch.
///
/// Between `prev` and `next`:
/// - at most one cycle is appended and none are removed
/// - cycles before the previously newest one are identical
/// - the previously newest cycle keeps its instructions and never loses
///   its fix flag
/// - an existing reproduction description is not rewritten
///
/// Returns stable error messages in cycle order.
pub fn check_cycle_history(prev: &Iteration, next: &Iteration) -> Vec<String> {
    let mut errors = Vec::new();
    let prev_cycles = prev.cycles.as_slice();
    let next_cycles = next.cycles.as_slice();

    if next_cycles.len() < prev_cycles.len() {
        errors.push(format!(
            "cycles shrank from {} to {}",
            prev_cycles.len(),
            next_cycles.len()
        ));
        return errors;
    }
    if next_cycles.len() > prev_cycles.len() + 1 {
        errors.push(format!(
            "turn appended {} cycles (at most 1 allowed)",
            next_cycles.len() - prev_cycles.len()
        ));
    }

    let frozen = prev_cycles.len().saturating_sub(1);
    for (idx, (before, after)) in prev_cycles.iter().zip(next_cycles).enumerate() {
        if idx < frozen {
            if before != after {
                errors.push(format!("cycle {idx} changed after it was superseded"));
            }
            continue;
        }
        if before.instructions != after.instructions {
            errors.push(format!("cycle {idx} instructions were rewritten"));
        }
        if before.fix_attempted && !after.fix_attempted {
            errors.push(format!("cycle {idx} lost its fix_attempted flag"));
        }
    }

    if let Some(described) = &prev.bug_reproduction_description
        && next.bug_reproduction_description.as_ref() != Some(described)
    {
        errors.push("bug_reproduction_description was rewritten".to_string());
    }

    errors
}
