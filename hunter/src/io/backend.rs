//! Reasoning backend abstraction.
//!
//! The [`Backend`] trait decouples the hunting protocol from the model that
//! answers it. Tests use scripted backends that return predetermined replies
//! without spawning processes.

use std::process::Command;

use anyhow::{Context, Result, anyhow};
use jsonschema::validator_for;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::core::conversation::{Conversation, Message};
use crate::core::error::HuntError;
use crate::core::types::HuntConclusion;
use crate::io::config::BackendConfig;
use crate::io::process::{ProcessLimits, run_with_input};

/// One backend call.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendRequest {
    pub conversation: Conversation,
    pub temperature: f32,
}

/// Abstraction over reasoning backends.
pub trait Backend {
    /// Answer the conversation. Returns the raw reply text.
    fn invoke(&self, request: &BackendRequest) -> Result<String>;
}

impl<B: Backend + ?Sized> Backend for &B {
    fn invoke(&self, request: &BackendRequest) -> Result<String> {
        (**self).invoke(request)
    }
}

/// Wire form of a request written to the backend command's stdin.
#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    messages: &'a [Message],
    temperature: f32,
    response_schema: Option<&'a Value>,
}

/// Backend that runs an external command per call.
///
/// The request is written to stdin as JSON and the reply is read from stdout.
#[derive(Debug, Clone)]
pub struct CommandBackend {
    config: BackendConfig,
}

impl CommandBackend {
    pub fn new(config: BackendConfig) -> Self {
        Self { config }
    }
}

impl Backend for CommandBackend {
    #[instrument(skip_all, fields(temperature = request.temperature, messages = request.conversation.messages().len(), schema = request.conversation.response_schema().is_some()))]
    fn invoke(&self, request: &BackendRequest) -> Result<String> {
        let (program, args) = self
            .config
            .command
            .split_first()
            .ok_or_else(|| anyhow!("backend.command is empty"))?;
        info!(program = %program, "invoking backend");

        let payload = serde_json::to_vec(&WireRequest {
            messages: request.conversation.messages(),
            temperature: request.temperature,
            response_schema: request.conversation.response_schema(),
        })
        .context("serialize backend request")?;

        let mut cmd = Command::new(program);
        cmd.args(args);
        let output = run_with_input(
            cmd,
            Some(payload.as_slice()),
            ProcessLimits {
                timeout: self.config.timeout(),
                capture_bytes: self.config.output_limit_bytes,
            },
        )
        .with_context(|| format!("run backend {program}"))?;

        if output.timed_out {
            warn!(timeout_secs = self.config.timeout_secs, "backend timed out");
            return Err(anyhow!(
                "backend timed out after {}s",
                self.config.timeout_secs
            ));
        }
        if !output.status.success() {
            warn!(exit_code = ?output.status.code(), "backend failed");
            return Err(anyhow!(
                "backend failed with status {:?}: {}",
                output.status.code(),
                output.stderr.tail(2_000)
            ));
        }
        if output.stdout.dropped > 0 {
            return Err(anyhow!(
                "backend reply exceeded {} bytes",
                self.config.output_limit_bytes
            ));
        }

        debug!(reply_bytes = output.stdout.bytes.len(), "backend replied");
        Ok(output.stdout.lossy())
    }
}

/// Free-text generation. The reply is trimmed.
pub fn invoke_text<B: Backend>(
    backend: &B,
    conversation: Conversation,
    temperature: f32,
) -> Result<String> {
    let reply = backend.invoke(&BackendRequest {
        conversation,
        temperature,
    })?;
    Ok(reply.trim().to_string())
}

#[derive(Debug, Deserialize)]
struct ConclusionReply {
    conclusion: String,
}

/// Schema-constrained classification into [`HuntConclusion`].
///
/// The reply must be a JSON object matching the conversation's schema whose
/// `conclusion` is one of the two literal tokens.
#[instrument(skip_all, fields(temperature = temperature))]
pub fn invoke_conclusion<B: Backend>(
    backend: &B,
    conversation: Conversation,
    temperature: f32,
) -> Result<HuntConclusion> {
    let schema = conversation
        .response_schema()
        .cloned()
        .ok_or_else(|| anyhow!("conclusion conversation has no response schema"))?;
    let reply = backend.invoke(&BackendRequest {
        conversation,
        temperature,
    })?;
    let conclusion = decode_conclusion(&reply, &schema)?;
    debug!(conclusion = conclusion.as_token(), "decoded hunt conclusion");
    Ok(conclusion)
}

fn decode_conclusion(reply: &str, schema: &Value) -> Result<HuntConclusion> {
    let value: Value =
        serde_json::from_str(strip_code_fence(reply)).map_err(|err| HuntError::MalformedConclusion {
            reason: format!("reply is not json: {err}"),
        })?;

    // The token check comes first so an out-of-enum value gets its own error.
    if let Some(token) = value.get("conclusion").and_then(Value::as_str)
        && HuntConclusion::from_token(token).is_none()
    {
        return Err(HuntError::UnrecognizedConclusion {
            token: token.to_string(),
        }
        .into());
    }

    let validator = validator_for(schema).map_err(|err| anyhow!("invalid schema: {err}"))?;
    let violations: Vec<String> = validator.iter_errors(&value).map(|e| e.to_string()).collect();
    if !violations.is_empty() {
        return Err(HuntError::MalformedConclusion {
            reason: violations.join("; "),
        }
        .into());
    }

    let parsed: ConclusionReply =
        serde_json::from_value(value).map_err(|err| HuntError::MalformedConclusion {
            reason: err.to_string(),
        })?;
    HuntConclusion::from_token(&parsed.conclusion).ok_or_else(|| {
        HuntError::UnrecognizedConclusion {
            token: parsed.conclusion,
        }
        .into()
    })
}

/// Accept replies wrapped in a ```json fence.
fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}
