//! Shared deterministic types for the bug-hunting core.
//!
//! These types are the persisted shape of an iteration. They must not depend on
//! external state or I/O and serialize identically across runs.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::ledger::CycleLedger;

/// Literal token the backend returns when it needs more logging.
pub const ADD_LOGS: &str = "ADD_LOGS";
/// Literal token the backend returns when the root cause is known.
pub const PROBLEM_IDENTIFIED: &str = "PROBLEM_IDENTIFIED";

/// Lifecycle status of a bug-hunting iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IterationStatus {
    /// The backend should analyze the collected evidence.
    HuntingForBug,
    /// A fix was applied; the human has to confirm it.
    AwaitingUserTest,
    /// Logging was added; the human has to reproduce and paste logs.
    AwaitingBugReproduction,
    /// Handed to the logging stage.
    AwaitingLogging,
    /// Handed to the fix stage.
    AwaitingBugFix,
    /// Finished. Terminal for this controller.
    Complete,
}

impl IterationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HuntingForBug => "HUNTING_FOR_BUG",
            Self::AwaitingUserTest => "AWAITING_USER_TEST",
            Self::AwaitingBugReproduction => "AWAITING_BUG_REPRODUCTION",
            Self::AwaitingLogging => "AWAITING_LOGGING",
            Self::AwaitingBugFix => "AWAITING_BUG_FIX",
            Self::Complete => "COMPLETE",
        }
    }

    /// Statuses owned by a stage outside this controller.
    pub fn is_handoff(self) -> bool {
        matches!(self, Self::AwaitingLogging | Self::AwaitingBugFix)
    }
}

impl fmt::Display for IterationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Backend verdict after a hunting round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HuntConclusion {
    AddLogs,
    ProblemIdentified,
}

impl HuntConclusion {
    /// Decode one of the two literal conclusion tokens.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            ADD_LOGS => Some(Self::AddLogs),
            PROBLEM_IDENTIFIED => Some(Self::ProblemIdentified),
            _ => None,
        }
    }

    pub fn as_token(self) -> &'static str {
        match self {
            Self::AddLogs => ADD_LOGS,
            Self::ProblemIdentified => PROBLEM_IDENTIFIED,
        }
    }
}

/// One backend analysis round.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HuntingCycle {
    /// Hypothesis and instructions the backend produced for this round.
    pub instructions: String,
    #[serde(default)]
    pub backend_logs: String,
    #[serde(default)]
    pub frontend_logs: String,
    /// Sticky: once any cycle has it set, later cycles inherit it.
    #[serde(default)]
    pub fix_attempted: bool,
}

/// One debugging attempt for a reported bug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Iteration {
    pub status: IterationStatus,
    /// Bug report as written by the user.
    pub user_feedback: String,
    /// Clarifying questions and answers gathered with the report.
    #[serde(default)]
    pub user_feedback_qa: Option<String>,
    /// Derived once on the first turn, never rewritten.
    #[serde(default)]
    pub bug_reproduction_description: Option<String>,
    /// Latest hypothesis from the backend.
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cycles: CycleLedger,
}

impl Iteration {
    /// Fresh iteration for a newly reported bug.
    pub fn reported(user_feedback: impl Into<String>, user_feedback_qa: Option<String>) -> Self {
        Self {
            status: IterationStatus::HuntingForBug,
            user_feedback: user_feedback.into(),
            user_feedback_qa,
            bug_reproduction_description: None,
            description: None,
            cycles: CycleLedger::default(),
        }
    }
}

/// Supporting document handed to the backend as context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doc {
    pub name: String,
    pub content: String,
}

/// The owning context's view of the project during a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectState {
    #[serde(default)]
    pub current_task: Option<String>,
    #[serde(default)]
    pub docs: Vec<Doc>,
    /// Command that starts the app under test, if known.
    #[serde(default)]
    pub run_command: Option<String>,
    pub iteration: Iteration,
}

impl ProjectState {
    pub fn new(iteration: Iteration) -> Self {
        Self {
            current_task: None,
            docs: Vec::new(),
            run_command: None,
            iteration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_with_protocol_names() {
        let json = serde_json::to_string(&IterationStatus::AwaitingBugReproduction).expect("json");
        assert_eq!(json, "\"AWAITING_BUG_REPRODUCTION\"");
        let parsed: IterationStatus = serde_json::from_str("\"HUNTING_FOR_BUG\"").expect("parse");
        assert_eq!(parsed, IterationStatus::HuntingForBug);
    }

    #[test]
    fn status_display_matches_serde_name() {
        for status in [
            IterationStatus::HuntingForBug,
            IterationStatus::AwaitingUserTest,
            IterationStatus::AwaitingBugReproduction,
            IterationStatus::AwaitingLogging,
            IterationStatus::AwaitingBugFix,
            IterationStatus::Complete,
        ] {
            let json = serde_json::to_string(&status).expect("json");
            assert_eq!(json, format!("\"{status}\""));
        }
    }

    #[test]
    fn conclusion_tokens_are_closed() {
        assert_eq!(
            HuntConclusion::from_token("ADD_LOGS"),
            Some(HuntConclusion::AddLogs)
        );
        assert_eq!(
            HuntConclusion::from_token("PROBLEM_IDENTIFIED"),
            Some(HuntConclusion::ProblemIdentified)
        );
        assert_eq!(HuntConclusion::from_token("add_logs"), None);
        assert_eq!(HuntConclusion::from_token("MAYBE"), None);
    }

    #[test]
    fn cycle_log_fields_default_when_missing() {
        let cycle: HuntingCycle =
            serde_json::from_str(r#"{"instructions":"look at auth"}"#).expect("parse");
        assert_eq!(cycle.backend_logs, "");
        assert_eq!(cycle.frontend_logs, "");
        assert!(!cycle.fix_attempted);
    }
}
