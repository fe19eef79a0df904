//! UI-agnostic chat message types
//!
//! These are shared between the session, the render pipeline and whatever
//! host draws the thread (terminal, webview, tests).

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// A message in the conversation thread
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    /// Plain text for user messages, a trusted HTML fragment for assistant messages
    pub content: String,
    pub timestamp: DateTime<Local>,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self::at(role, content, Local::now())
    }

    pub fn at(role: ChatRole, content: impl Into<String>, timestamp: DateTime<Local>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }

    /// Clock time as shown in the message header, e.g. `3:07 PM`
    pub fn display_time(&self) -> String {
        self.timestamp.format("%-I:%M %p").to_string()
    }
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}
