//! Human-interaction channel.
//!
//! The [`Channel`] trait is the only way the controller talks to a person.
//! [`TerminalChannel`] implements it over any line reader and writer, which
//! the binary wires to stdin/stdout.

use std::cell::RefCell;
use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use tracing::debug;

/// A button offered with a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub token: String,
    pub label: String,
}

impl Button {
    pub fn new(token: &str, label: &str) -> Self {
        Self {
            token: token.to_string(),
            label: label.to_string(),
        }
    }
}

/// A question with buttons and optional free text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub prompt: String,
    pub buttons: Vec<Button>,
    /// Token assumed when the person gives no usable answer.
    pub default: Option<String>,
    /// Free text is not accepted, only a button.
    pub buttons_only: bool,
    pub hint: Option<String>,
}

/// The person's reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Answer {
    pub button: Option<String>,
    pub text: Option<String>,
}

impl Answer {
    pub fn is(&self, token: &str) -> bool {
        self.button.as_deref() == Some(token)
    }

    /// Free text, or "" when none was given.
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or_default()
    }
}

/// Abstraction over the human-interaction channel.
pub trait Channel {
    fn send_message(&self, text: &str) -> Result<()>;
    fn ask_question(&self, question: &Question) -> Result<Answer>;
    /// Ask the channel to start the application under test.
    fn send_run_command(&self, command: &str) -> Result<()>;
}

impl<C: Channel + ?Sized> Channel for &C {
    fn send_message(&self, text: &str) -> Result<()> {
        (**self).send_message(text)
    }

    fn ask_question(&self, question: &Question) -> Result<Answer> {
        (**self).ask_question(question)
    }

    fn send_run_command(&self, command: &str) -> Result<()> {
        (**self).send_run_command(command)
    }
}

/// Line-oriented channel for terminals.
///
/// Buttons-only questions read one line (token or label; empty picks the
/// default). Free-text questions read pasted lines until a line holding just
/// a button token, or end of input.
pub struct TerminalChannel<R, W> {
    input: RefCell<R>,
    output: RefCell<W>,
}

impl TerminalChannel<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> TerminalChannel<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input: RefCell::new(input),
            output: RefCell::new(output),
        }
    }

    pub fn into_output(self) -> W {
        self.output.into_inner()
    }

    fn write(&self, text: &str) -> Result<()> {
        let mut out = self.output.borrow_mut();
        out.write_all(text.as_bytes()).context("write to terminal")?;
        out.flush().context("flush terminal")
    }

    fn read_line(&self) -> Result<Option<String>> {
        let mut line = String::new();
        let n = self
            .input
            .borrow_mut()
            .read_line(&mut line)
            .context("read from terminal")?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn read_button(&self, question: &Question) -> Result<Option<String>> {
        loop {
            let Some(line) = self.read_line()? else {
                return Ok(question.default.clone());
            };
            let reply = line.trim();
            if reply.is_empty() {
                return Ok(question.default.clone());
            }
            if let Some(button) = match_button(&question.buttons, reply) {
                return Ok(Some(button.token.clone()));
            }
            self.write(&format!("Please answer with one of: {}\n", tokens(question)))?;
        }
    }

    fn read_free_text(&self, question: &Question) -> Result<Answer> {
        let mut lines = Vec::new();
        let button = loop {
            let Some(line) = self.read_line()? else {
                break question.default.clone();
            };
            if let Some(button) = question.buttons.iter().find(|b| b.token == line.trim()) {
                break Some(button.token.clone());
            }
            lines.push(line);
        };
        let text = lines.join("\n");
        Ok(Answer {
            button,
            text: (!text.trim().is_empty()).then_some(text),
        })
    }
}

impl<R: BufRead, W: Write> Channel for TerminalChannel<R, W> {
    fn send_message(&self, text: &str) -> Result<()> {
        self.write(&format!("{text}\n\n"))
    }

    fn ask_question(&self, question: &Question) -> Result<Answer> {
        let mut buf = format!("{}\n", question.prompt);
        if let Some(hint) = &question.hint {
            buf.push_str(&format!("\n{hint}\n\n"));
        }
        let options: Vec<String> = question
            .buttons
            .iter()
            .map(|b| format!("[{}] {}", b.token, b.label))
            .collect();
        buf.push_str(&options.join("  "));
        if let Some(default) = &question.default {
            buf.push_str(&format!("  (default: {default})"));
        }
        buf.push('\n');
        if !question.buttons_only {
            buf.push_str(&format!(
                "Paste text below, then finish with a line containing only one of: {}\n",
                tokens(question)
            ));
        }
        self.write(&buf)?;

        let answer = if question.buttons_only {
            Answer {
                button: self.read_button(question)?,
                text: None,
            }
        } else {
            self.read_free_text(question)?
        };
        debug!(button = ?answer.button, text_bytes = answer.text().len(), "question answered");
        Ok(answer)
    }

    fn send_run_command(&self, command: &str) -> Result<()> {
        self.write(&format!("Start the app with:\n\n    {command}\n\n"))
    }
}

fn match_button<'a>(buttons: &'a [Button], reply: &str) -> Option<&'a Button> {
    buttons
        .iter()
        .find(|b| b.token.eq_ignore_ascii_case(reply) || b.label.eq_ignore_ascii_case(reply))
}

fn tokens(question: &Question) -> String {
    question
        .buttons
        .iter()
        .map(|b| b.token.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn channel(input: &str) -> TerminalChannel<Cursor<Vec<u8>>, Vec<u8>> {
        TerminalChannel::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    fn yes_no() -> Question {
        Question {
            prompt: "Is it fixed?".to_string(),
            buttons: vec![Button::new("yes", "Yes"), Button::new("no", "No")],
            default: Some("no".to_string()),
            buttons_only: true,
            hint: Some("Open /login".to_string()),
        }
    }

    fn paste() -> Question {
        Question {
            prompt: "Paste logs".to_string(),
            buttons: vec![
                Button::new("continue", "Continue"),
                Button::new("done", "Bug is fixed"),
            ],
            default: Some("continue".to_string()),
            buttons_only: false,
            hint: None,
        }
    }

    #[test]
    fn buttons_only_accepts_token_or_label() {
        assert!(channel("yes\n").ask_question(&yes_no()).expect("ask").is("yes"));
        assert!(channel("No\n").ask_question(&yes_no()).expect("ask").is("no"));
    }

    #[test]
    fn buttons_only_reasks_on_unknown_then_defaults_at_eof() {
        let ch = channel("maybe\n");
        let answer = ch.ask_question(&yes_no()).expect("ask");
        assert!(answer.is("no"));
        let out = String::from_utf8(ch.into_output()).expect("utf8");
        assert!(out.contains("Please answer with one of: yes, no"));
        assert!(out.contains("Open /login"));
    }

    #[test]
    fn free_text_collects_until_button_line() {
        let ch = channel("line one\nPYTHAGORA_DEBUGGING_LOG: a=1\ncontinue\nignored\n");
        let answer = ch.ask_question(&paste()).expect("ask");
        assert!(answer.is("continue"));
        assert_eq!(answer.text(), "line one\nPYTHAGORA_DEBUGGING_LOG: a=1");
    }

    #[test]
    fn free_text_done_button_without_text() {
        let answer = channel("done\n").ask_question(&paste()).expect("ask");
        assert!(answer.is("done"));
        assert_eq!(answer.text, None);
    }

    #[test]
    fn free_text_eof_uses_default() {
        let answer = channel("partial paste").ask_question(&paste()).expect("ask");
        assert!(answer.is("continue"));
        assert_eq!(answer.text(), "partial paste");
    }

    #[test]
    fn messages_and_run_command_are_written() {
        let ch = channel("");
        ch.send_message("hello").expect("send");
        ch.send_run_command("npm start").expect("run");
        let out = String::from_utf8(ch.into_output()).expect("utf8");
        assert!(out.starts_with("hello\n"));
        assert!(out.contains("    npm start"));
    }
}
