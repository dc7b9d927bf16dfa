//! Ordered dialogue handed to the reasoning backend.

use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

/// Immutable-by-convention message list, built by chaining.
///
/// A conversation may carry a JSON Schema the reply must satisfy.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Conversation {
    messages: Vec<Message>,
    response_schema: Option<Value>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn system(self, content: impl Into<String>) -> Self {
        self.push(Role::System, content.into())
    }

    pub fn user(self, content: impl Into<String>) -> Self {
        self.push(Role::User, content.into())
    }

    pub fn assistant(self, content: impl Into<String>) -> Self {
        self.push(Role::Assistant, content.into())
    }

    pub fn require_schema(mut self, schema: Value) -> Self {
        self.response_schema = Some(schema);
        self
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn response_schema(&self) -> Option<&Value> {
        self.response_schema.as_ref()
    }

    fn push(mut self, role: Role, content: String) -> Self {
        self.messages.push(Message { role, content });
        self
    }
}
