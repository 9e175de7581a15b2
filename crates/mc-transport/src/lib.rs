//! Message Center Transport Layer
//!
//! WebSocket transport for the message center server. The transport handles:
//! - Connection lifecycle (open, message, close)
//! - Connection limits and the `/health` endpoint
//! - Notification broadcasting to every connected client
//!
//! The transport is decoupled from the server logic via the `RequestHandler` trait.

pub mod client;
pub mod server;

pub use client::ClientConnection;
pub use server::{RequestHandler, TransportConfig, TransportError, TransportServer};
