//! Conversation assembly from minijinja templates.
//!
//! Templates live in `src/io/prompts/` and are compiled into the binary. The
//! engine renders them and chains the results into a [`Conversation`].

use std::sync::LazyLock;

use anyhow::{Context, Result};
use minijinja::{Environment, context};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::core::conversation::Conversation;
use crate::core::log_extract::DEBUG_LOG_TAG;
use crate::core::replay::DialogueTurn;
use crate::core::types::{ADD_LOGS, Doc, PROBLEM_IDENTIFIED, ProjectState};

const SYSTEM_TEMPLATE: &str = include_str!("prompts/system.md");
const REPRODUCTION_TEMPLATE: &str = include_str!("prompts/get_bug_reproduction_instructions.md");
const ITERATION_TEMPLATE: &str = include_str!("prompts/iteration.md");
const LOG_DATA_TEMPLATE: &str = include_str!("prompts/log_data.md");
const CONCLUSION_TEMPLATE: &str = include_str!("prompts/bug_found_or_add_logs.md");

/// JSON Schema for the ADD_LOGS / PROBLEM_IDENTIFIED classification reply.
pub const HUNT_CONCLUSION_SCHEMA: &str = include_str!("../../schemas/hunt_conclusion.schema.json");

static CONCLUSION_SCHEMA_VALUE: LazyLock<Value> = LazyLock::new(|| {
    serde_json::from_str(HUNT_CONCLUSION_SCHEMA).expect("hunt conclusion schema should be valid json")
});

/// Bug context shared by the reproduction and hunting prompts.
#[derive(Debug, Clone, Serialize)]
pub struct BugContext<'a> {
    pub current_task: Option<&'a str>,
    pub docs: &'a [Doc],
    pub user_feedback: &'a str,
    pub user_feedback_qa: Option<&'a str>,
}

impl<'a> BugContext<'a> {
    pub fn from_state(state: &'a ProjectState) -> Self {
        Self {
            current_task: non_blank(state.current_task.as_deref()),
            docs: &state.docs,
            user_feedback: state.iteration.user_feedback.trim(),
            user_feedback_qa: non_blank(state.iteration.user_feedback_qa.as_deref()),
        }
    }
}

/// Template engine wrapper around minijinja.
pub struct PromptEngine {
    env: Environment<'static>,
}

impl Default for PromptEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptEngine {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.add_template("system", SYSTEM_TEMPLATE)
            .expect("system template should be valid");
        env.add_template("get_bug_reproduction_instructions", REPRODUCTION_TEMPLATE)
            .expect("reproduction template should be valid");
        env.add_template("iteration", ITERATION_TEMPLATE)
            .expect("iteration template should be valid");
        env.add_template("log_data", LOG_DATA_TEMPLATE)
            .expect("log_data template should be valid");
        env.add_template("bug_found_or_add_logs", CONCLUSION_TEMPLATE)
            .expect("conclusion template should be valid");
        Self { env }
    }

    /// Conversation that asks for reproduction steps.
    pub fn reproduction_conversation(&self, bug: &BugContext<'_>) -> Result<Conversation> {
        let prompt = self.render(
            "get_bug_reproduction_instructions",
            context! {
                current_task => bug.current_task,
                docs => bug.docs,
                user_feedback => bug.user_feedback,
                user_feedback_qa => bug.user_feedback_qa,
            },
        )?;
        Ok(self.base()?.user(prompt))
    }

    /// Conversation for one hunting round, with earlier rounds replayed.
    pub fn hunting_conversation(
        &self,
        bug: &BugContext<'_>,
        replay: &[DialogueTurn<'_>],
    ) -> Result<Conversation> {
        let prompt = self.render(
            "iteration",
            context! {
                current_task => bug.current_task,
                docs => bug.docs,
                user_feedback => bug.user_feedback,
                user_feedback_qa => bug.user_feedback_qa,
                log_tag => DEBUG_LOG_TAG,
                add_logs => ADD_LOGS,
                problem_identified => PROBLEM_IDENTIFIED,
            },
        )?;

        let mut convo = self.base()?.user(prompt);
        for turn in replay {
            convo = match turn {
                DialogueTurn::Hypothesis(text) => convo.assistant(*text),
                DialogueTurn::Evidence(evidence) => convo.user(self.render(
                    "log_data",
                    context! {
                        backend_logs => evidence.backend_logs.trim(),
                        frontend_logs => evidence.frontend_logs.trim(),
                        fix_attempted => evidence.fix_attempted,
                    },
                )?),
            };
        }
        debug!(
            replayed_turns = replay.len(),
            messages = convo.messages().len(),
            "built hunting conversation"
        );
        Ok(convo)
    }

    /// Schema-constrained conversation classifying a hunting answer.
    pub fn conclusion_conversation(&self, hunt_conclusion: &str) -> Result<Conversation> {
        let prompt = self.render(
            "bug_found_or_add_logs",
            context! {
                hunt_conclusion => hunt_conclusion,
                add_logs => ADD_LOGS,
                problem_identified => PROBLEM_IDENTIFIED,
            },
        )?;
        Ok(Conversation::new()
            .user(prompt)
            .require_schema(CONCLUSION_SCHEMA_VALUE.clone()))
    }

    fn base(&self) -> Result<Conversation> {
        Ok(Conversation::new().system(self.render("system", context! {})?))
    }

    fn render(&self, name: &str, ctx: minijinja::Value) -> Result<String> {
        let template = self.env.get_template(name)?;
        let rendered = template
            .render(ctx)
            .with_context(|| format!("render {name} template"))?;
        Ok(rendered.trim().to_string())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::conversation::Role;
    use crate::core::replay::LogEvidence;
    use crate::core::types::Iteration;

    fn state() -> ProjectState {
        let mut state = ProjectState::new(Iteration::reported(
            "Saving a profile shows a blank page",
            Some("Q: which browser?\nA: Firefox".to_string()),
        ));
        state.current_task = Some("Build the profile editor".to_string());
        state.docs = vec![Doc {
            name: "api.md".to_string(),
            content: "PUT /api/profile".to_string(),
        }];
        state
    }

    #[test]
    fn reproduction_prompt_carries_report_and_docs() {
        let state = state();
        let convo = PromptEngine::new()
            .reproduction_conversation(&BugContext::from_state(&state))
            .expect("render");

        let messages = convo.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[1].content.contains("Saving a profile shows a blank page"));
        assert!(messages[1].content.contains("Firefox"));
        assert!(messages[1].content.contains("PUT /api/profile"));
        assert!(messages[1].content.contains("Build the profile editor"));
    }

    #[test]
    fn hunting_prompt_without_history_is_system_plus_report() {
        let state = state();
        let convo = PromptEngine::new()
            .hunting_conversation(&BugContext::from_state(&state), &[])
            .expect("render");
        assert_eq!(convo.messages().len(), 2);
        let prompt = &convo.messages()[1].content;
        assert!(prompt.contains("PYTHAGORA_DEBUGGING_LOG:"));
        assert!(prompt.contains("ADD_LOGS"));
        assert!(prompt.contains("PROBLEM_IDENTIFIED"));
        assert!(convo.response_schema().is_none());
    }

    #[test]
    fn replayed_turns_follow_the_report_in_order() {
        let state = state();
        let replay = vec![
            DialogueTurn::Hypothesis("log the request body"),
            DialogueTurn::Evidence(LogEvidence {
                backend_logs: "body={}",
                frontend_logs: "",
                fix_attempted: true,
            }),
        ];
        let convo = PromptEngine::new()
            .hunting_conversation(&BugContext::from_state(&state), &replay)
            .expect("render");

        let messages = convo.messages();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[2].role, Role::Assistant);
        assert_eq!(messages[2].content, "log the request body");
        assert_eq!(messages[3].role, Role::User);
        assert!(messages[3].content.contains("body={}"));
        assert!(messages[3].content.contains("No frontend debugging logs"));
        assert!(messages[3].content.contains("fix for the bug was attempted"));
    }

    #[test]
    fn conclusion_prompt_requires_schema() {
        let convo = PromptEngine::new()
            .conclusion_conversation("The handler never awaits the save.")
            .expect("render");
        assert_eq!(convo.messages().len(), 1);
        assert!(convo.messages()[0].content.contains("never awaits"));
        let schema = convo.response_schema().expect("schema");
        assert_eq!(schema["properties"]["conclusion"]["enum"][0], "ADD_LOGS");
    }
}
