//! Operations accepted by the message center store.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use super::state::{MessageId, MessageType};

/// Set of message identifiers targeted by a bulk operation.
pub type MessageIds = HashSet<MessageId>;

/// Field-level update applied to every matching message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageUpdate {
    /// Flip `showDetail`.
    ToggleDetail,
    /// Set `seen` and retract the live toast.
    MarkRead,
    /// Retract the live toast only.
    HideNotification,
}

/// Payload of [`Action::Add`].
#[derive(Debug, Clone, PartialEq)]
pub struct AddMessage {
    pub group_id: String,
    pub content: String,
    pub detail: Option<String>,
    pub message_type: MessageType,
    pub show_notification: bool,
    /// Occurrence time stamped onto the stored message.
    pub created: DateTime<Utc>,
}

impl AddMessage {
    /// An info message that raises a live toast, stamped with the current time.
    pub fn new(group_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            content: content.into(),
            detail: None,
            message_type: MessageType::Info,
            show_notification: true,
            created: Utc::now(),
        }
    }

    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn message_type(mut self, message_type: MessageType) -> Self {
        self.message_type = message_type;
        self
    }

    pub fn show_notification(mut self, show: bool) -> Self {
        self.show_notification = show;
        self
    }

    pub fn at(mut self, created: DateTime<Utc>) -> Self {
        self.created = created;
        self
    }
}

/// Every primitive state transition of the store.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Add(AddMessage),
    Remove(MessageIds),
    Update(MessageUpdate, MessageIds),
    ShowPanel,
    HidePanel,
    ToggleExpanded,
    ToggleGroup(String),
    ExpandGroup(String),
    SessionReset,
}

impl Action {
    pub fn toggle_detail(ids: impl IntoIterator<Item = MessageId>) -> Self {
        Self::Update(MessageUpdate::ToggleDetail, ids.into_iter().collect())
    }

    pub fn mark_as_read(ids: impl IntoIterator<Item = MessageId>) -> Self {
        Self::Update(MessageUpdate::MarkRead, ids.into_iter().collect())
    }

    pub fn hide_notification(ids: impl IntoIterator<Item = MessageId>) -> Self {
        Self::Update(MessageUpdate::HideNotification, ids.into_iter().collect())
    }

    pub fn remove(ids: impl IntoIterator<Item = MessageId>) -> Self {
        Self::Remove(ids.into_iter().collect())
    }

    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Add(_) => "add",
            Self::Remove(_) => "remove",
            Self::Update(MessageUpdate::ToggleDetail, _) => "toggleDetail",
            Self::Update(MessageUpdate::MarkRead, _) => "markAsRead",
            Self::Update(MessageUpdate::HideNotification, _) => "hideNotification",
            Self::ShowPanel => "show",
            Self::HidePanel => "hide",
            Self::ToggleExpanded => "toggleExpanded",
            Self::ToggleGroup(_) => "toggleGroup",
            Self::ExpandGroup(_) => "expandGroup",
            Self::SessionReset => "sessionReset",
        }
    }
}
