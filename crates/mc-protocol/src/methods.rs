//! Method name constants. Each constant is the exact string sent over the
//! wire as the `method` field of a JSON-RPC request.

/// All method names, grouped by namespace.
pub struct Methods;

impl Methods {
    // ── Message center: reads ───────────────────────────────────────────
    pub const MESSAGE_CENTER_STATE: &str = "messageCenter/state";
    pub const MESSAGE_CENTER_UNSEEN_COUNT: &str = "messageCenter/unseenCount";

    // ── Message center: messages ────────────────────────────────────────
    pub const MESSAGE_CENTER_ADD: &str = "messageCenter/add";
    pub const MESSAGE_CENTER_REPORT_ERROR: &str = "messageCenter/reportError";
    pub const MESSAGE_CENTER_NOTIFY: &str = "messageCenter/notify";
    pub const MESSAGE_CENTER_REMOVE: &str = "messageCenter/remove";
    pub const MESSAGE_CENTER_TOGGLE_DETAIL: &str = "messageCenter/toggleDetail";
    pub const MESSAGE_CENTER_MARK_AS_READ: &str = "messageCenter/markAsRead";
    pub const MESSAGE_CENTER_HIDE_NOTIFICATION: &str = "messageCenter/hideNotification";

    // ── Message center: panel ───────────────────────────────────────────
    pub const MESSAGE_CENTER_SHOW: &str = "messageCenter/show";
    pub const MESSAGE_CENTER_HIDE: &str = "messageCenter/hide";
    pub const MESSAGE_CENTER_TOGGLE_EXPANDED: &str = "messageCenter/toggleExpanded";
    pub const MESSAGE_CENTER_TOGGLE_GROUP: &str = "messageCenter/toggleGroup";
    pub const MESSAGE_CENTER_EXPAND_GROUP: &str = "messageCenter/expandGroup";

    // ── Message center: compound ────────────────────────────────────────
    pub const MESSAGE_CENTER_TOGGLE_PANEL: &str = "messageCenter/togglePanel";
    pub const MESSAGE_CENTER_MARK_GROUP_READ: &str = "messageCenter/markGroupRead";
    pub const MESSAGE_CENTER_CLEAR_GROUP: &str = "messageCenter/clearGroup";
    pub const MESSAGE_CENTER_RESET: &str = "messageCenter/reset";

    // ── Session ─────────────────────────────────────────────────────────
    pub const SESSION_START: &str = "session/start";
}

/// Returns true if the given string belongs to a known namespace.
pub fn is_known_method(method: &str) -> bool {
    matches!(
        method.split('/').next(),
        Some("messageCenter") | Some("session")
    )
}
