//! Append-only record of hunting cycles within one iteration.
//!
//! Earlier cycles are frozen. Only the newest cycle may receive logs or have
//! its `fix_attempted` flag raised.

use std::slice;

use serde::{Deserialize, Serialize};

use super::error::HuntError;
use super::types::HuntingCycle;

/// Log extracts supplied by the human for the newest cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectedLogs {
    pub backend: String,
    pub frontend: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CycleLedger {
    cycles: Vec<HuntingCycle>,
}

impl CycleLedger {
    pub fn len(&self) -> usize {
        self.cycles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cycles.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<'_, HuntingCycle> {
        self.cycles.iter()
    }

    pub fn as_slice(&self) -> &[HuntingCycle] {
        &self.cycles
    }

    pub fn last(&self) -> Option<&HuntingCycle> {
        self.cycles.last()
    }

    /// True if any recorded cycle carries a fix attempt.
    pub fn fix_ever_attempted(&self) -> bool {
        self.cycles.iter().any(|cycle| cycle.fix_attempted)
    }

    /// Record a new round. The fix flag is inherited from the whole history.
    pub fn append(&mut self, instructions: impl Into<String>) -> &HuntingCycle {
        let fix_attempted = self.fix_ever_attempted();
        self.cycles.push(HuntingCycle {
            instructions: instructions.into(),
            backend_logs: String::new(),
            frontend_logs: String::new(),
            fix_attempted,
        });
        &self.cycles[self.cycles.len() - 1]
    }

    pub fn mark_last_fix_attempted(&mut self) -> Result<(), HuntError> {
        self.last_mut()?.fix_attempted = true;
        Ok(())
    }

    pub fn record_logs_on_last(&mut self, logs: CollectedLogs) -> Result<(), HuntError> {
        let last = self.last_mut()?;
        last.backend_logs = logs.backend;
        last.frontend_logs = logs.frontend;
        Ok(())
    }

    fn last_mut(&mut self) -> Result<&mut HuntingCycle, HuntError> {
        self.cycles.last_mut().ok_or(HuntError::NoHuntingCycle)
    }
}

impl From<Vec<HuntingCycle>> for CycleLedger {
    fn from(cycles: Vec<HuntingCycle>) -> Self {
        Self { cycles }
    }
}

impl<'a> IntoIterator for &'a CycleLedger {
    type Item = &'a HuntingCycle;
    type IntoIter = slice::Iter<'a, HuntingCycle>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
