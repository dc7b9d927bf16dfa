//! Test-only helpers: scripted collaborators and state builders.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::Path;

use anyhow::{Result, anyhow};
use tempfile::TempDir;

use crate::core::types::{HuntingCycle, Iteration, IterationStatus, ProjectState};
use crate::io::backend::{Backend, BackendRequest};
use crate::io::channel::{Answer, Channel, Question};
use crate::io::init::{HunterPaths, InitOptions, init_hunter};
use crate::io::session_store::{SessionState, load_session, write_session};

/// Reproduction steps used by [`project`].
pub const REPRO: &str = "Open /cart and press Checkout.";

/// Backend that returns queued replies in order and records every request.
#[derive(Default)]
pub struct ScriptedBackend {
    replies: RefCell<VecDeque<Result<String, String>>>,
    requests: RefCell<Vec<BackendRequest>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, text: &str) -> Self {
        self.replies.borrow_mut().push_back(Ok(text.to_string()));
        self
    }

    /// Queue a schema-shaped conclusion reply.
    pub fn conclude(self, token: &str) -> Self {
        self.reply(&format!(r#"{{"conclusion":"{token}"}}"#))
    }

    pub fn fail(self, message: &str) -> Self {
        self.replies.borrow_mut().push_back(Err(message.to_string()));
        self
    }

    pub fn requests(&self) -> Vec<BackendRequest> {
        self.requests.borrow().clone()
    }

    pub fn assert_drained(&self) {
        let left = self.replies.borrow().len();
        assert_eq!(left, 0, "scripted backend has {left} unused replies");
    }
}

impl Backend for ScriptedBackend {
    fn invoke(&self, request: &BackendRequest) -> Result<String> {
        self.requests.borrow_mut().push(request.clone());
        match self.replies.borrow_mut().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(anyhow!(message)),
            None => Err(anyhow!("scripted backend has no reply left")),
        }
    }
}

/// Something the controller sent through the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    Message(String),
    Question(Question),
    RunCommand(String),
}

/// Channel that answers questions from a queue and records every event.
#[derive(Default)]
pub struct ScriptedChannel {
    answers: RefCell<VecDeque<Answer>>,
    events: RefCell<Vec<ChannelEvent>>,
}

impl ScriptedChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn button(self, token: &str) -> Self {
        self.push(Answer {
            button: Some(token.to_string()),
            text: None,
        })
    }

    pub fn paste(self, token: &str, text: &str) -> Self {
        self.push(Answer {
            button: Some(token.to_string()),
            text: Some(text.to_string()),
        })
    }

    fn push(self, answer: Answer) -> Self {
        self.answers.borrow_mut().push_back(answer);
        self
    }

    pub fn events(&self) -> Vec<ChannelEvent> {
        self.events.borrow().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter_map(|event| match event {
                ChannelEvent::Message(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn questions(&self) -> Vec<Question> {
        self.events
            .borrow()
            .iter()
            .filter_map(|event| match event {
                ChannelEvent::Question(q) => Some(q.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn assert_drained(&self) {
        let left = self.answers.borrow().len();
        assert_eq!(left, 0, "scripted channel has {left} unused answers");
    }
}

impl Channel for ScriptedChannel {
    fn send_message(&self, text: &str) -> Result<()> {
        self.events
            .borrow_mut()
            .push(ChannelEvent::Message(text.to_string()));
        Ok(())
    }

    fn ask_question(&self, question: &Question) -> Result<Answer> {
        self.events
            .borrow_mut()
            .push(ChannelEvent::Question(question.clone()));
        self.answers
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| anyhow!("scripted channel has no answer left for {:?}", question.prompt))
    }

    fn send_run_command(&self, command: &str) -> Result<()> {
        self.events
            .borrow_mut()
            .push(ChannelEvent::RunCommand(command.to_string()));
        Ok(())
    }
}

/// A cycle with explicit fields.
pub fn cycle(instructions: &str, backend: &str, frontend: &str, fix_attempted: bool) -> HuntingCycle {
    HuntingCycle {
        instructions: instructions.to_string(),
        backend_logs: backend.to_string(),
        frontend_logs: frontend.to_string(),
        fix_attempted,
    }
}

/// Project with a known reproduction description, status and cycle history.
pub fn project(status: IterationStatus, cycles: Vec<HuntingCycle>) -> ProjectState {
    let mut iteration = Iteration::reported("Checkout button does nothing", None);
    iteration.status = status;
    iteration.bug_reproduction_description = Some(REPRO.to_string());
    iteration.description = cycles.last().map(|c| c.instructions.clone());
    iteration.cycles = cycles.into();
    ProjectState::new(iteration)
}

/// Scratch project root with `.hunter/` initialized.
pub struct TestProject {
    dir: TempDir,
}

impl TestProject {
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir()?;
        init_hunter(dir.path(), &InitOptions { force: false })?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn paths(&self) -> HunterPaths {
        HunterPaths::new(self.dir.path())
    }

    pub fn write_session(&self, state: &SessionState) -> Result<()> {
        write_session(&self.paths().session_path, state)
    }

    pub fn read_session(&self) -> Result<SessionState> {
        load_session(&self.paths().session_path)
    }
}
