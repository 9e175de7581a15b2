//! Message Center Protocol Types
//!
//! JSON-RPC 2.0 compatible types spoken between the message center server
//! and its clients (UI layers, API error reporters). This crate is the single
//! source of truth for method names, notification names, and error codes.

pub mod error;
pub mod jsonrpc;
pub mod methods;
pub mod notifications;

pub use error::{McError, McErrorCode};
pub use jsonrpc::{
    HandlerResult, McErrorResponse, McNotification, McRequest, McResponse, McSuccessResponse,
    RequestId,
};
pub use methods::{Methods, is_known_method};
pub use notifications::Notifications;

/// Version reported to clients in `server/connected`.
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
