//! Message Center Server: routes JSON-RPC requests to services.
//!
//! The server owns all services, manages the middleware chain,
//! and provides the `RequestHandler` implementation for the transport layer.

pub mod middleware;
pub mod router;

pub use middleware::{Middleware, MiddlewareChain, MiddlewareResult, RequestLogMiddleware};
pub use router::MessageCenterServer;
