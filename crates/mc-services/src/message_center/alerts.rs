//! Shorthand builders for the common kinds of message center entries.
//!
//! Errors belong to the system errors group; everything else is a regular
//! notification.

use serde::{Deserialize, Serialize};

use super::action::AddMessage;
use super::state::{MessageType, DEFAULT_GROUP, SYSTEM_ERRORS_GROUP};

/// What an API caller knows about a failed request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// HTTP status of the failed response, when there was one.
    #[serde(default)]
    pub status: Option<u16>,
    /// Short error text, e.g. the transport error or status text.
    #[serde(default)]
    pub message: Option<String>,
    /// Server-provided error body.
    #[serde(default)]
    pub detail: Option<String>,
}

impl ApiError {
    /// Detail text shown under the message: the server body if present,
    /// else the short message, prefixed by the status.
    pub fn describe(&self) -> Option<String> {
        let text = self
            .detail
            .as_deref()
            .filter(|d| !d.is_empty())
            .or_else(|| self.message.as_deref().filter(|m| !m.is_empty()));

        match (self.status, text) {
            (Some(status), Some(text)) => Some(format!("{status}: {text}")),
            (Some(status), None) => Some(format!("HTTP {status}")),
            (None, Some(text)) => Some(text.to_string()),
            (None, None) => None,
        }
    }
}

/// An error entry for the system errors group.
pub fn error(content: impl Into<String>, cause: &ApiError) -> AddMessage {
    let add = AddMessage::new(SYSTEM_ERRORS_GROUP, content).message_type(MessageType::Error);
    match cause.describe() {
        Some(detail) => add.detail(detail),
        None => add,
    }
}

fn notification(content: impl Into<String>, message_type: MessageType) -> AddMessage {
    AddMessage::new(DEFAULT_GROUP, content).message_type(message_type)
}

/// Non-error alert kinds accepted by `messageCenter/notify`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    #[default]
    Info,
    Success,
    Warning,
}

/// A regular notification of the given kind.
pub fn alert(kind: AlertKind, content: impl Into<String>) -> AddMessage {
    match kind {
        AlertKind::Info => info(content),
        AlertKind::Success => success(content),
        AlertKind::Warning => warning(content),
    }
}

pub fn info(content: impl Into<String>) -> AddMessage {
    notification(content, MessageType::Info)
}

pub fn success(content: impl Into<String>) -> AddMessage {
    notification(content, MessageType::Success)
}

pub fn warning(content: impl Into<String>) -> AddMessage {
    notification(content, MessageType::Warning)
}
