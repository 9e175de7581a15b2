//! Message center service: a grouped, deduplicated notification log.
//!
//! The store lives behind a single mutex: every request plans and applies
//! its actions under that lock, so operations are atomic and take effect in
//! arrival order. State changes are pushed to clients as
//! `messageCenter/didChange` (and `messageCenter/didAddMessage` for adds).

pub mod action;
pub mod alerts;
pub mod commands;
pub mod state;

use std::sync::Arc;

use mc_protocol::{HandlerResult, McError, Methods, Notifications};
use parking_lot::{Mutex, RwLock};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::Service;
use action::{Action, AddMessage, MessageIds};
use alerts::{AlertKind, ApiError};
use commands::Command;
use state::{MessageCenterState, MessageId, MessageType, NotificationMessage, DEFAULT_GROUP};

/// Callback for emitting notifications to connected clients.
pub type NotifySender = Arc<dyn Fn(&str, Value) + Send + Sync>;

pub struct MessageCenterService {
    state: Mutex<MessageCenterState>,
    notify_tx: RwLock<Option<NotifySender>>,
}

impl MessageCenterService {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MessageCenterState::new()),
            notify_tx: RwLock::new(None),
        }
    }

    /// Set the notification callback for emitting state changes to clients.
    pub fn set_notify_sender(&self, sender: NotifySender) {
        *self.notify_tx.write() = Some(sender);
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> MessageCenterState {
        self.state.lock().clone()
    }

    /// Apply one action. Returns whether the state changed.
    pub fn dispatch(&self, action: Action) -> bool {
        self.dispatch_add_aware(action).0
    }

    /// Plan and apply a compound command atomically.
    pub fn run(&self, command: Command) -> bool {
        let mut state = self.state.lock();
        let changed = state.run(&command);
        debug!(command = command.name(), changed, "message center command");
        if changed {
            self.emit_state(&state);
        }
        changed
    }

    /// Applies `action`; for an applied `Add`, also returns the stored message.
    fn dispatch_add_aware(&self, action: Action) -> (bool, Option<NotificationMessage>) {
        let name = action.name();
        let added_to = match &action {
            Action::Add(add) => Some(add.group_id.clone()),
            _ => None,
        };

        let mut state = self.state.lock();
        let changed = state.apply(action);
        debug!(action = name, changed, next_id = state.next_id, "message center action");
        if !changed {
            return (false, None);
        }

        let added = added_to.and_then(|group_id| {
            let message = state.group(&group_id)?.messages.last()?.clone();
            self.emit(
                Notifications::MESSAGE_CENTER_DID_ADD_MESSAGE,
                json!({ "groupId": group_id, "message": message }),
            );
            Some(message)
        });
        self.emit_state(&state);
        (true, added)
    }

    fn emit_state(&self, state: &MessageCenterState) {
        self.emit(Notifications::MESSAGE_CENTER_DID_CHANGE, json!({ "state": state }));
    }

    fn emit(&self, method: &str, params: Value) {
        if let Some(tx) = self.notify_tx.read().as_ref() {
            tx(method, params);
        }
    }
}

impl Default for MessageCenterService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service for MessageCenterService {
    fn namespace(&self) -> &str {
        "messageCenter"
    }

    async fn handle(&self, method: &str, params: Option<Value>) -> HandlerResult {
        match method {
            Methods::MESSAGE_CENTER_STATE => Ok(json!({ "state": self.snapshot() })),

            Methods::MESSAGE_CENTER_UNSEEN_COUNT => {
                let p: OptionalGroupParam = parse_params_optional(params)?;
                let state = self.state.lock();
                let count = match p.group_id {
                    Some(group_id) => state.group(&group_id).map_or(0, |g| g.unseen_count()),
                    None => state.unseen_count(),
                };
                Ok(json!({ "count": count }))
            }

            Methods::MESSAGE_CENTER_ADD => {
                let p: AddParams = parse_params(params)?;
                let mut add = AddMessage::new(p.group_id, p.content)
                    .message_type(p.message_type)
                    .show_notification(p.show_notification);
                if let Some(detail) = p.detail.filter(|d| !d.is_empty()) {
                    add = add.detail(detail);
                }
                let (changed, message) = self.dispatch_add_aware(Action::Add(add));
                Ok(json!({ "changed": changed, "message": message }))
            }

            Methods::MESSAGE_CENTER_REPORT_ERROR => {
                let p: ReportErrorParams = parse_params(params)?;
                let add = alerts::error(p.content, &p.error);
                let (changed, message) = self.dispatch_add_aware(Action::Add(add));
                Ok(json!({ "changed": changed, "message": message }))
            }

            Methods::MESSAGE_CENTER_NOTIFY => {
                let p: NotifyParams = parse_params(params)?;
                let mut add = alerts::alert(p.kind, p.content);
                if let Some(detail) = p.detail.filter(|d| !d.is_empty()) {
                    add = add.detail(detail);
                }
                let (changed, message) = self.dispatch_add_aware(Action::Add(add));
                Ok(json!({ "changed": changed, "message": message }))
            }

            Methods::MESSAGE_CENTER_REMOVE => {
                let p: MessageIdsParam = parse_params(params)?;
                changed(self.dispatch(Action::Remove(p.ids())))
            }

            Methods::MESSAGE_CENTER_TOGGLE_DETAIL => {
                let p: MessageIdsParam = parse_params(params)?;
                changed(self.dispatch(Action::toggle_detail(p.message_ids)))
            }

            Methods::MESSAGE_CENTER_MARK_AS_READ => {
                let p: MessageIdsParam = parse_params(params)?;
                changed(self.dispatch(Action::mark_as_read(p.message_ids)))
            }

            Methods::MESSAGE_CENTER_HIDE_NOTIFICATION => {
                let p: MessageIdsParam = parse_params(params)?;
                changed(self.dispatch(Action::hide_notification(p.message_ids)))
            }

            Methods::MESSAGE_CENTER_SHOW => changed(self.dispatch(Action::ShowPanel)),
            Methods::MESSAGE_CENTER_HIDE => changed(self.dispatch(Action::HidePanel)),
            Methods::MESSAGE_CENTER_TOGGLE_EXPANDED => changed(self.dispatch(Action::ToggleExpanded)),

            Methods::MESSAGE_CENTER_TOGGLE_GROUP => {
                let p: GroupParam = parse_params(params)?;
                changed(self.dispatch(Action::ToggleGroup(p.group_id)))
            }

            Methods::MESSAGE_CENTER_EXPAND_GROUP => {
                let p: GroupParam = parse_params(params)?;
                changed(self.dispatch(Action::ExpandGroup(p.group_id)))
            }

            Methods::MESSAGE_CENTER_TOGGLE_PANEL => {
                let p: OptionalGroupParam = parse_params_optional(params)?;
                let group_id = p.group_id.unwrap_or_else(|| DEFAULT_GROUP.into());
                changed(self.run(Command::OpenPanelShowingGroup(group_id)))
            }

            Methods::MESSAGE_CENTER_MARK_GROUP_READ => {
                let p: GroupParam = parse_params(params)?;
                changed(self.run(Command::MarkGroupRead(p.group_id)))
            }

            Methods::MESSAGE_CENTER_CLEAR_GROUP => {
                let p: GroupParam = parse_params(params)?;
                changed(self.run(Command::ClearGroup(p.group_id)))
            }

            // A new login discards everything from the previous session.
            Methods::MESSAGE_CENTER_RESET | Methods::SESSION_START => {
                changed(self.dispatch(Action::SessionReset))
            }

            _ => Err(McError::method_not_found(method)),
        }
    }
}

fn changed(changed: bool) -> HandlerResult {
    Ok(json!({ "changed": changed }))
}

// ─────────────────────────────────────────────────────────────────────────────
// Params
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddParams {
    group_id: String,
    content: String,
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    message_type: MessageType,
    /// Read back as `show_notification` on stored messages; either
    /// spelling is accepted here.
    #[serde(default = "default_true", alias = "show_notification")]
    show_notification: bool,
}

#[derive(Deserialize)]
struct ReportErrorParams {
    content: String,
    #[serde(default)]
    error: ApiError,
}

#[derive(Deserialize)]
struct NotifyParams {
    content: String,
    #[serde(default)]
    kind: AlertKind,
    #[serde(default)]
    detail: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageIdsParam {
    message_ids: Vec<MessageId>,
}

impl MessageIdsParam {
    fn ids(self) -> MessageIds {
        self.message_ids.into_iter().collect()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroupParam {
    group_id: String,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct OptionalGroupParam {
    #[serde(default)]
    group_id: Option<String>,
}

fn default_true() -> bool {
    true
}

fn parse_params<T: for<'de> Deserialize<'de>>(params: Option<Value>) -> Result<T, McError> {
    match params {
        Some(v) => serde_json::from_value(v)
            .map_err(|e| McError::invalid_params(format!("Invalid parameters: {e}"))),
        None => Err(McError::invalid_params("Parameters required")),
    }
}

fn parse_params_optional<T: for<'de> Deserialize<'de> + Default>(params: Option<Value>) -> Result<T, McError> {
    match params {
        None | Some(Value::Null) => Ok(T::default()),
        Some(_) => parse_params(params),
    }
}
