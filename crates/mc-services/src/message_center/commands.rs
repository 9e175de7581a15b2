//! Compound operations built from a state snapshot.
//!
//! A [`Command`] reads the current state, plans a short list of primitive
//! [`Action`]s, and is applied as a unit by [`MessageCenterState::run`].

use super::action::Action;
use super::state::MessageCenterState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Open the panel on a group when hidden, close it when visible.
    OpenPanelShowingGroup(String),
    /// Mark every message currently in the group as read.
    MarkGroupRead(String),
    /// Remove every message currently in the group.
    ClearGroup(String),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::OpenPanelShowingGroup(_) => "togglePanel",
            Self::MarkGroupRead(_) => "markGroupRead",
            Self::ClearGroup(_) => "clearGroup",
        }
    }

    /// Primitive actions this command expands to against `state`.
    pub fn plan(&self, state: &MessageCenterState) -> Vec<Action> {
        match self {
            Self::OpenPanelShowingGroup(group_id) => {
                if state.hidden {
                    vec![Action::ShowPanel, Action::ExpandGroup(group_id.clone())]
                } else {
                    vec![Action::HidePanel]
                }
            }
            Self::MarkGroupRead(group_id) => state
                .group(group_id)
                .map(|g| vec![Action::mark_as_read(g.message_ids())])
                .unwrap_or_default(),
            Self::ClearGroup(group_id) => state
                .group(group_id)
                .map(|g| vec![Action::remove(g.message_ids())])
                .unwrap_or_default(),
        }
    }
}

impl MessageCenterState {
    /// Plan and apply a command. Returns whether any step changed the state.
    pub fn run(&mut self, command: &Command) -> bool {
        let mut changed = false;
        for action in command.plan(self) {
            changed |= self.apply(action);
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message_center::action::AddMessage;
    use crate::message_center::state::{MessageType, DEFAULT_GROUP, SYSTEM_ERRORS_GROUP};

    #[test]
    fn open_panel_when_hidden_shows_and_expands() {
        let mut state = MessageCenterState::new();
        state.apply(Action::ToggleGroup(DEFAULT_GROUP.into()));

        assert!(state.run(&Command::OpenPanelShowingGroup(SYSTEM_ERRORS_GROUP.into())));
        assert!(!state.hidden);
        assert_eq!(state.expanded_group_id.as_deref(), Some(SYSTEM_ERRORS_GROUP));
    }

    #[test]
    fn open_panel_when_visible_hides_without_retargeting() {
        let mut state = MessageCenterState::new();
        state.apply(Action::ShowPanel);

        assert!(state.run(&Command::OpenPanelShowingGroup(SYSTEM_ERRORS_GROUP.into())));
        assert!(state.hidden);
        assert_eq!(state.expanded_group_id.as_deref(), Some(DEFAULT_GROUP));
    }

    #[test]
    fn mark_group_read_after_duplicate_adds() {
        let mut state = MessageCenterState::new();
        for _ in 0..2 {
            state.apply(Action::Add(
                AddMessage::new(DEFAULT_GROUP, "Pod restarted")
                    .detail("")
                    .message_type(MessageType::Info)
                    .show_notification(true),
            ));
        }
        assert!(state.run(&Command::MarkGroupRead(DEFAULT_GROUP.into())));

        let group = state.group(DEFAULT_GROUP).unwrap();
        assert_eq!(group.messages.len(), 1);
        let msg = &group.messages[0];
        assert_eq!(msg.count, 2);
        assert!(msg.seen);
        assert!(!msg.show_notification);
    }

    #[test]
    fn mark_group_read_leaves_other_groups_unread() {
        let mut state = MessageCenterState::new();
        state.apply(Action::Add(AddMessage::new(DEFAULT_GROUP, "a")));
        state.apply(Action::Add(AddMessage::new(SYSTEM_ERRORS_GROUP, "b")));

        state.run(&Command::MarkGroupRead(DEFAULT_GROUP.into()));
        assert_eq!(state.group(SYSTEM_ERRORS_GROUP).unwrap().unseen_count(), 1);
    }

    #[test]
    fn clear_group_keeps_next_id() {
        let mut state = MessageCenterState::new();
        state.apply(Action::Add(
            AddMessage::new(SYSTEM_ERRORS_GROUP, "API 500")
                .detail("trace...")
                .message_type(MessageType::Error),
        ));
        let next_id = state.next_id;

        assert!(state.run(&Command::ClearGroup(SYSTEM_ERRORS_GROUP.into())));
        assert!(state.group(SYSTEM_ERRORS_GROUP).unwrap().messages.is_empty());
        assert_eq!(state.next_id, next_id);
    }

    #[test]
    fn group_commands_on_unknown_group_plan_nothing() {
        let mut state = MessageCenterState::new();
        state.apply(Action::Add(AddMessage::new(DEFAULT_GROUP, "a")));
        let before = state.clone();

        assert!(Command::ClearGroup("missing".into()).plan(&state).is_empty());
        assert!(!state.run(&Command::MarkGroupRead("missing".into())));
        assert_eq!(state, before);
    }
}
