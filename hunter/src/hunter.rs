//! The iteration state machine.
//!
//! [`BugHunter::run_turn`] advances one iteration by exactly one phase. It
//! reads the committed snapshot through [`Turn::current`] and writes every
//! change to [`Turn::next_mut`], so a failed turn leaves nothing behind.

use anyhow::Result;
use tracing::{debug, info, instrument};

use crate::core::error::HuntError;
use crate::core::ledger::CollectedLogs;
use crate::core::log_extract::extract_debug_lines;
use crate::core::replay::replay_cycles;
use crate::core::state::Turn;
use crate::core::types::{HuntConclusion, IterationStatus};
use crate::io::backend::{Backend, invoke_conclusion, invoke_text};
use crate::io::channel::{Answer, Button, Channel, Question};
use crate::io::config::HunterConfig;
use crate::io::prompt::{BugContext, PromptEngine};

pub const BUG_FOUND_MESSAGE: &str = "The bug is found - I'm attempting to fix it.";
pub const ADDING_LOGS_MESSAGE: &str = "Adding more logs to identify the bug.";
pub const REPRODUCE_PREFIX: &str = "You can reproduce the bug like this:\n\n";
pub const TESTING_HINT_PREFIX: &str = "Instructions for testing:\n\n";
pub const IS_FIXED_PROMPT: &str = "Is the bug you reported fixed now?";
pub const BACKEND_LOGS_PROMPT: &str =
    "Please do exactly what you did in the last iteration, paste **BACKEND** logs here and click CONTINUE.";
pub const FRONTEND_LOGS_PROMPT: &str = "Please paste **frontend** logs here and click CONTINUE.";

pub const YES: &str = "yes";
pub const NO: &str = "no";
pub const CONTINUE: &str = "continue";
pub const DONE: &str = "done";

/// Sampling temperatures for the three backend calls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Temperatures {
    pub reproduction: f32,
    pub hunting: f32,
    pub conclusion: f32,
}

impl Default for Temperatures {
    fn default() -> Self {
        Self::from(&HunterConfig::default())
    }
}

impl From<&HunterConfig> for Temperatures {
    fn from(cfg: &HunterConfig) -> Self {
        Self {
            reproduction: cfg.reproduction_temperature,
            hunting: cfg.hunting_temperature,
            conclusion: cfg.conclusion_temperature,
        }
    }
}

/// What a turn did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// A phase ran. `to` is the status written to the next snapshot.
    Advanced {
        from: IterationStatus,
        to: IterationStatus,
    },
    /// Nothing for this controller to do in `status`.
    Idle { status: IterationStatus },
}

/// Which waiting phase a re-test runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TestMode {
    /// A fix was applied; ask whether it worked before collecting logs.
    ConfirmFix,
    /// Logging was added; go straight to log collection.
    Reproduce,
}

pub struct BugHunter<B, C> {
    backend: B,
    channel: C,
    prompts: PromptEngine,
    temperatures: Temperatures,
}

impl<B: Backend, C: Channel> BugHunter<B, C> {
    pub fn new(backend: B, channel: C, temperatures: Temperatures) -> Self {
        Self {
            backend,
            channel,
            prompts: PromptEngine::new(),
            temperatures,
        }
    }

    /// Run one phase of the iteration held by `turn`.
    #[instrument(skip_all, fields(status = %turn.current().iteration.status, cycles = turn.current().iteration.cycles.len()))]
    pub fn run_turn(&self, turn: &mut Turn<'_>) -> Result<TurnOutcome> {
        if turn.current().iteration.bug_reproduction_description.is_none() {
            self.derive_reproduction_description(turn)?;
        }

        let from = turn.current().iteration.status;
        let to = match from {
            IterationStatus::HuntingForBug => self.hunt(turn)?,
            IterationStatus::AwaitingUserTest => self.ask_user_to_test(turn, TestMode::ConfirmFix)?,
            IterationStatus::AwaitingBugReproduction => {
                self.ask_user_to_test(turn, TestMode::Reproduce)?
            }
            IterationStatus::AwaitingLogging
            | IterationStatus::AwaitingBugFix
            | IterationStatus::Complete => {
                debug!(status = %from, "nothing to do");
                return Ok(TurnOutcome::Idle { status: from });
            }
        };

        if to == IterationStatus::Complete {
            turn.complete_iteration();
        } else {
            turn.next_mut().iteration.status = to;
        }
        info!(from = %from, to = %to, "iteration advanced");
        Ok(TurnOutcome::Advanced { from, to })
    }

    fn derive_reproduction_description(&self, turn: &mut Turn<'_>) -> Result<()> {
        let convo = self
            .prompts
            .reproduction_conversation(&BugContext::from_state(turn.current()))?;
        let description = invoke_text(&self.backend, convo, self.temperatures.reproduction)?;
        debug!(bytes = description.len(), "derived reproduction description");
        turn.next_mut().iteration.bug_reproduction_description = Some(description);
        Ok(())
    }

    fn hunt(&self, turn: &mut Turn<'_>) -> Result<IterationStatus> {
        let instructions = {
            let current = turn.current();
            let replay = replay_cycles(&current.iteration.cycles);
            let convo = self
                .prompts
                .hunting_conversation(&BugContext::from_state(current), &replay)?;
            invoke_text(&self.backend, convo, self.temperatures.hunting)?
        };

        let convo = self.prompts.conclusion_conversation(&instructions)?;
        let conclusion = invoke_conclusion(&self.backend, convo, self.temperatures.conclusion)?;
        info!(conclusion = conclusion.as_token(), "hunting round concluded");

        let iteration = &mut turn.next_mut().iteration;
        iteration.cycles.append(instructions.as_str());
        iteration.description = Some(instructions);

        let next = match conclusion {
            HuntConclusion::ProblemIdentified => {
                self.channel.send_message(BUG_FOUND_MESSAGE)?;
                IterationStatus::AwaitingBugFix
            }
            HuntConclusion::AddLogs => {
                self.channel.send_message(ADDING_LOGS_MESSAGE)?;
                IterationStatus::AwaitingLogging
            }
        };
        turn.flag_iterations_as_modified();
        Ok(next)
    }

    fn ask_user_to_test(&self, turn: &mut Turn<'_>, mode: TestMode) -> Result<IterationStatus> {
        if turn.current().iteration.cycles.is_empty() {
            return Err(HuntError::NoHuntingCycle.into());
        }

        // Read from `next` so a description derived this turn is shown.
        let repro = turn
            .next()
            .iteration
            .bug_reproduction_description
            .clone()
            .unwrap_or_default();
        self.channel
            .send_message(&format!("{REPRODUCE_PREFIX}{repro}"))?;
        if let Some(command) = &turn.current().run_command {
            self.channel.send_run_command(command)?;
        }
        let hint = format!("{TESTING_HINT_PREFIX}{repro}");

        if mode == TestMode::ConfirmFix {
            let answer = self.channel.ask_question(&Question {
                prompt: IS_FIXED_PROMPT.to_string(),
                buttons: vec![
                    Button::new(YES, "Yes, the issue is fixed"),
                    Button::new(NO, "No"),
                ],
                default: Some(NO.to_string()),
                buttons_only: true,
                hint: Some(hint.clone()),
            })?;
            turn.next_mut().iteration.cycles.mark_last_fix_attempted()?;
            if answer.is(YES) {
                return Ok(IterationStatus::Complete);
            }
        }

        match self.collect_logs(&hint)? {
            Some(logs) => {
                turn.next_mut().iteration.cycles.record_logs_on_last(logs)?;
                Ok(IterationStatus::HuntingForBug)
            }
            None => {
                info!("user reported the bug as fixed during log collection");
                Ok(IterationStatus::Complete)
            }
        }
    }

    /// Ask for backend then frontend logs. `None` means the user said the bug
    /// is fixed.
    fn collect_logs(&self, hint: &str) -> Result<Option<CollectedLogs>> {
        let backend = self.ask_for_logs(BACKEND_LOGS_PROMPT, hint)?;
        if backend.is(DONE) {
            return Ok(None);
        }
        let frontend = self.ask_for_logs(FRONTEND_LOGS_PROMPT, hint)?;
        if frontend.is(DONE) {
            return Ok(None);
        }
        Ok(Some(CollectedLogs {
            backend: extract_debug_lines(backend.text()),
            frontend: extract_debug_lines(frontend.text()),
        }))
    }

    fn ask_for_logs(&self, prompt: &str, hint: &str) -> Result<Answer> {
        self.channel.ask_question(&Question {
            prompt: prompt.to_string(),
            buttons: vec![
                Button::new(CONTINUE, "Continue"),
                Button::new(DONE, "Bug is fixed"),
            ],
            default: Some(CONTINUE.to_string()),
            buttons_only: false,
            hint: Some(hint.to_string()),
        })
    }
}
