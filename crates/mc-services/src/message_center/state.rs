//! Message center state and its transition function.
//!
//! The state is plain data. Every change goes through
//! [`MessageCenterState::apply`], which is total: unknown groups, absent ids
//! and repeated dispatches leave the state untouched instead of failing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::action::{Action, AddMessage, MessageIds, MessageUpdate};

pub type MessageId = u64;

/// Group receiving errors reported by API callers.
pub const SYSTEM_ERRORS_GROUP: &str = "systemErrors";
/// Group receiving general notifications.
pub const DEFAULT_GROUP: &str = "default";

/// Severity of a notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    #[serde(alias = "danger")]
    Error,
    #[default]
    Info,
    Success,
    Warning,
}

/// A single (possibly repeated) notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationMessage {
    pub id: MessageId,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub count: u32,
    pub seen: bool,
    pub show_notification: bool,
    #[serde(rename = "showDetail")]
    pub show_detail: bool,
    /// Time of the most recent occurrence.
    pub created: DateTime<Utc>,
    /// Time of the earliest occurrence, set once the message has repeated.
    #[serde(rename = "firstTriggered", default, skip_serializing_if = "Option::is_none")]
    pub first_triggered: Option<DateTime<Utc>>,
}

impl NotificationMessage {
    fn apply_update(&mut self, update: MessageUpdate) {
        match update {
            MessageUpdate::ToggleDetail => self.show_detail = !self.show_detail,
            MessageUpdate::MarkRead => {
                self.seen = true;
                self.show_notification = false;
            }
            MessageUpdate::HideNotification => self.show_notification = false,
        }
    }
}

/// A named bucket of messages, in insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub title: String,
    pub messages: Vec<NotificationMessage>,
    pub show_actions: bool,
    pub hide_if_empty: bool,
}

impl Group {
    fn new(id: &str, title: &str, show_actions: bool, hide_if_empty: bool) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            messages: Vec::new(),
            show_actions,
            hide_if_empty,
        }
    }

    pub fn message_ids(&self) -> Vec<MessageId> {
        self.messages.iter().map(|m| m.id).collect()
    }

    pub fn unseen_count(&self) -> usize {
        self.messages.iter().filter(|m| !m.seen).count()
    }
}

/// The whole notification log plus panel UI state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageCenterState {
    pub next_id: MessageId,
    pub groups: Vec<Group>,
    pub hidden: bool,
    pub expanded: bool,
    pub expanded_group_id: Option<String>,
}

impl Default for MessageCenterState {
    fn default() -> Self {
        Self {
            next_id: 0,
            groups: vec![
                Group::new(SYSTEM_ERRORS_GROUP, "Open issues", false, true),
                Group::new(DEFAULT_GROUP, "Notifications", true, false),
            ],
            hidden: true,
            expanded: false,
            expanded_group_id: Some(DEFAULT_GROUP.into()),
        }
    }
}

impl MessageCenterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn group(&self, group_id: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == group_id)
    }

    /// Unseen messages across every group.
    pub fn unseen_count(&self) -> usize {
        self.groups.iter().map(Group::unseen_count).sum()
    }

    /// Apply one action. Returns whether the state changed.
    pub fn apply(&mut self, action: Action) -> bool {
        match action {
            Action::Add(add) => self.add(add),
            Action::Remove(ids) => self.remove(&ids),
            Action::Update(update, ids) => self.update_messages(&ids, update),
            Action::ShowPanel => {
                if !self.hidden {
                    return false;
                }
                self.hidden = false;
                true
            }
            Action::HidePanel => {
                if self.hidden {
                    return false;
                }
                self.hidden = true;
                true
            }
            Action::ToggleExpanded => {
                self.expanded = !self.expanded;
                true
            }
            Action::ToggleGroup(group_id) => {
                if self.expanded_group_id.as_deref() == Some(group_id.as_str()) {
                    self.expanded_group_id = None;
                } else {
                    self.expanded_group_id = Some(group_id);
                }
                true
            }
            Action::ExpandGroup(group_id) => {
                if self.expanded_group_id.as_deref() == Some(group_id.as_str()) {
                    return false;
                }
                self.expanded_group_id = Some(group_id);
                true
            }
            Action::SessionReset => {
                let initial = Self::default();
                if *self == initial {
                    return false;
                }
                *self = initial;
                true
            }
        }
    }

    /// Consuming form of [`apply`](Self::apply).
    pub fn reduce(mut self, action: Action) -> Self {
        self.apply(action);
        self
    }

    fn add(&mut self, add: AddMessage) -> bool {
        let id = self.next_id;
        let Some(group) = self.groups.iter_mut().find(|g| g.id == add.group_id) else {
            return false;
        };

        // Detail is not part of the identity, so a repeat with a different
        // detail still merges.
        let (count, first_triggered) =
            match group.messages.iter().position(|m| m.content == add.content) {
                Some(pos) => {
                    let existing = group.messages.remove(pos);
                    (
                        existing.count.saturating_add(1),
                        Some(existing.first_triggered.unwrap_or(existing.created)),
                    )
                }
                None => (1, None),
            };

        group.messages.push(NotificationMessage {
            id,
            content: add.content,
            detail: add.detail,
            message_type: add.message_type,
            count,
            seen: false,
            show_notification: add.show_notification,
            show_detail: false,
            created: add.created,
            first_triggered,
        });
        self.next_id += 1;
        true
    }

    fn remove(&mut self, ids: &MessageIds) -> bool {
        let mut changed = false;
        for group in &mut self.groups {
            let before = group.messages.len();
            group.messages.retain(|m| !ids.contains(&m.id));
            changed |= group.messages.len() != before;
        }
        changed
    }

    fn update_messages(&mut self, ids: &MessageIds, update: MessageUpdate) -> bool {
        let mut changed = false;
        for message in self.groups.iter_mut().flat_map(|g| g.messages.iter_mut()) {
            if ids.contains(&message.id) {
                let before = message.clone();
                message.apply_update(update);
                changed |= *message != before;
            }
        }
        changed
    }
}
