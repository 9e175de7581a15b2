//! Message Center Services
//!
//! Each service implements the `Service` trait and handles a namespace of
//! JSON-RPC methods. Services are registered with the server router, which
//! dispatches requests by method prefix.

pub mod message_center;

pub use message_center::MessageCenterService;

use mc_protocol::HandlerResult;

/// Trait implemented by all services.
///
/// Each service handles a namespace of methods (e.g., "messageCenter/*").
pub trait Service: Send + Sync {
    /// The namespace prefix this service handles (e.g., "messageCenter").
    fn namespace(&self) -> &str;

    /// Handle a JSON-RPC request.
    ///
    /// `method` is the full method string (e.g., "messageCenter/add").
    /// `params` is the optional JSON parameters.
    fn handle(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> impl std::future::Future<Output = HandlerResult> + Send;

    /// Initialize the service (called once at startup).
    fn init(&self) -> impl std::future::Future<Output = Result<(), Box<dyn std::error::Error + Send + Sync>>> + Send {
        async { Ok(()) }
    }

    /// Shutdown the service (called once at server shutdown).
    fn shutdown(&self) -> impl std::future::Future<Output = ()> + Send {
        async {}
    }
}
