//! Shared domain and wire types for askline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Greeting shown when a session starts with no prior history.
pub const WELCOME_TEXT: &str =
    "Hello! I'm the Askline assistant. Ask me anything and I'll do my best to help. \
     What would you like to know?";

/// Who produced a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One turn in the conversation.
///
/// The timestamp is set at creation and serialized as an ISO-8601 string;
/// it is absent only when reconstruction from storage failed to restore it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: Some(Utc::now()),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp: Some(Utc::now()),
        }
    }

    /// The single assistant message used to seed a fresh session.
    pub fn welcome() -> Self {
        Self::assistant(WELCOME_TEXT)
    }
}

/// Request body shared by both request modes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub input: String,
}

/// Response body of a single-shot call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(deserialize_with = "deserialize_string_or_null", default)]
    pub output: String,
}

/// One decoded unit of a streaming response. Unknown fields are ignored;
/// `content` may be absent entirely.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamPayload {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub content: Option<String>,
}

/// Helper to deserialize string or null values
pub fn deserialize_string_or_null<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        _ => Ok(String::new()),
    }
}
