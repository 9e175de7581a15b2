//! Dispatches JSON-RPC requests to services.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use mc_protocol::{HandlerResult, McError, McErrorCode, McNotification, is_known_method};
use mc_services::Service;
use mc_services::message_center::NotifySender;
use mc_transport::RequestHandler;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::middleware::{Middleware, MiddlewareChain, RequestLogMiddleware};

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
type InitResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Owns the services and routes requests to them.
pub struct MessageCenterServer {
    services: Vec<Box<dyn ServiceDyn>>,
    middleware: MiddlewareChain,
    state: ServerState,
    /// Broadcast channel shared with the transport
    notification_tx: Option<broadcast::Sender<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ServerState {
    Uninitialized,
    Running,
    Shutdown,
}

/// Object-safe wrapper for the Service trait.
trait ServiceDyn: Send + Sync {
    fn namespace_dyn(&self) -> &str;
    fn handle_dyn<'a>(&'a self, method: &'a str, params: Option<Value>) -> BoxFuture<'a, HandlerResult>;
    fn init_dyn(&self) -> BoxFuture<'_, InitResult>;
    fn shutdown_dyn(&self) -> BoxFuture<'_, ()>;
}

impl<T: Service> ServiceDyn for T {
    fn namespace_dyn(&self) -> &str {
        self.namespace()
    }
    fn handle_dyn<'a>(&'a self, method: &'a str, params: Option<Value>) -> BoxFuture<'a, HandlerResult> {
        Box::pin(self.handle(method, params))
    }
    fn init_dyn(&self) -> BoxFuture<'_, InitResult> {
        Box::pin(self.init())
    }
    fn shutdown_dyn(&self) -> BoxFuture<'_, ()> {
        Box::pin(self.shutdown())
    }
}

impl MessageCenterServer {
    pub fn new() -> Self {
        let mut middleware = MiddlewareChain::new();
        middleware.add(RequestLogMiddleware);

        Self {
            services: Vec::new(),
            middleware,
            state: ServerState::Uninitialized,
            notification_tx: None,
        }
    }

    /// Register a service with the server.
    pub fn register_service<S: Service + 'static>(&mut self, service: S) {
        info!("Registering service: {}", service.namespace());
        self.services.push(Box::new(service));
    }

    /// Add a middleware to the request chain.
    pub fn add_middleware<M: Middleware + 'static>(&mut self, middleware: M) {
        self.middleware.add(middleware);
    }

    /// Set the notification sender for broadcasting.
    pub fn set_notification_sender(&mut self, tx: broadcast::Sender<String>) {
        self.notification_tx = Some(tx);
    }

    /// Callback a service can use to publish notifications to every client.
    pub fn notifier(&self) -> Option<NotifySender> {
        let tx = self.notification_tx.clone()?;
        Some(Arc::new(move |method: &str, params: Value| {
            let notification = McNotification::new(method, Some(params));
            if let Ok(json) = serde_json::to_string(&notification) {
                // No connected clients is fine
                let _ = tx.send(json);
            }
        }))
    }

    /// Initialize all services.
    pub async fn initialize(&mut self) -> InitResult {
        for service in &self.services {
            service.init_dyn().await?;
        }

        self.state = ServerState::Running;
        info!(
            "Server initialized ({} services, middleware: {})",
            self.services.len(),
            self.middleware.names().join(", ")
        );
        Ok(())
    }

    /// Shutdown all services.
    pub async fn shutdown(&mut self) {
        if self.state == ServerState::Shutdown {
            return;
        }

        info!("Shutting down server...");
        self.state = ServerState::Shutdown;

        for service in &self.services {
            service.shutdown_dyn().await;
        }

        info!("Server shutdown complete");
    }

    /// Route a request to the appropriate service. Only protocol namespaces
    /// are routed.
    async fn route_request(&self, method: &str, params: Option<Value>) -> HandlerResult {
        if !is_known_method(method) {
            return Err(McError::method_not_found(method));
        }

        let namespace = method.split('/').next().unwrap_or("");

        for service in &self.services {
            if service.namespace_dyn() == namespace {
                return service.handle_dyn(method, params).await;
            }
        }

        // Fallback for services that also answer outside their namespace
        // (e.g. the message center handles session/start).
        for service in &self.services {
            match service.handle_dyn(method, params.clone()).await {
                Err(e) if e.error_code() == McErrorCode::MethodNotFound => continue,
                result => return result,
            }
        }

        Err(McError::method_not_found(method))
    }
}

impl Default for MessageCenterServer {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestHandler for MessageCenterServer {
    async fn handle_request(&self, method: &str, params: Option<Value>) -> HandlerResult {
        match self.state {
            ServerState::Shutdown => return Err(McError::shutting_down()),
            ServerState::Uninitialized => return Err(McError::not_initialized()),
            ServerState::Running => {}
        }

        let mw_result = self.middleware.run_before(method, params).await;
        if !mw_result.allowed {
            let feedback = mw_result
                .feedback
                .unwrap_or_else(|| "Request blocked by middleware".into());
            warn!(method, "{feedback}");
            return Err(McError::server_error(feedback));
        }

        let final_params = mw_result.params;
        let result = self.route_request(method, final_params.clone()).await;

        if let Ok(ref value) = result {
            let params_value = final_params.unwrap_or(Value::Null);
            self.middleware.run_after(method, &params_value, value).await;
        }

        result
    }
}
