//! Notification event name constants.
//!
//! Notifications are server-to-client messages with no response expected.
//! Every connected client receives them.

/// All notification names, grouped by namespace.
pub struct Notifications;

impl Notifications {
    // ── Server lifecycle ────────────────────────────────────────────────
    pub const SERVER_CONNECTED: &str = "server/connected";

    // ── Message center ──────────────────────────────────────────────────
    /// Full state snapshot after any operation that changed it.
    pub const MESSAGE_CENTER_DID_CHANGE: &str = "messageCenter/didChange";
    /// A message was added or re-triggered; feeds live toasts.
    pub const MESSAGE_CENTER_DID_ADD_MESSAGE: &str = "messageCenter/didAddMessage";
}
