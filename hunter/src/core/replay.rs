//! Reconstruction of the hunting dialogue from recorded cycles.
//!
//! The backend keeps no memory between rounds, so every round replays the full
//! trail: each earlier hypothesis as the backend's own turn, followed by the
//! evidence gathered for it. Order must match the ledger exactly.

use super::types::HuntingCycle;

/// Evidence collected after the backend proposed a hypothesis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvidence<'a> {
    pub backend_logs: &'a str,
    pub frontend_logs: &'a str,
    pub fix_attempted: bool,
}

/// One replayed dialogue turn, borrowed from the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogueTurn<'a> {
    /// An earlier backend answer, replayed as an assistant message.
    Hypothesis(&'a str),
    /// Logs and fix state that followed the preceding hypothesis.
    Evidence(LogEvidence<'a>),
}

/// Fold the ordered cycles into dialogue turns.
///
/// Cycles with empty instructions are skipped entirely.
pub fn replay_cycles<'a, I>(cycles: I) -> Vec<DialogueTurn<'a>>
where
    I: IntoIterator<Item = &'a HuntingCycle>,
{
    cycles
        .into_iter()
        .filter(|cycle| !cycle.instructions.is_empty())
        .fold(Vec::new(), |mut turns, cycle| {
            turns.push(DialogueTurn::Hypothesis(&cycle.instructions));
            turns.push(DialogueTurn::Evidence(LogEvidence {
                backend_logs: &cycle.backend_logs,
                frontend_logs: &cycle.frontend_logs,
                fix_attempted: cycle.fix_attempted,
            }));
            turns
        })
}
