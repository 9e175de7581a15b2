//! Axum WebSocket server.
//!
//! One task per connection multiplexes incoming JSON-RPC frames with the
//! shared broadcast channel, so every client sees every state change.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::{
    Router,
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
};
use futures_util::{SinkExt, StreamExt, stream::SplitSink};
use mc_protocol::{
    HandlerResult, McError, McNotification, McRequest, McResponse, Notifications, RequestId, SERVER_VERSION,
};
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tracing::{debug, error, info, warn};

use crate::client::ClientConnection;

type WsSink = SplitSink<WebSocket, Message>;

/// Implemented by whatever answers requests; the transport only moves frames.
pub trait RequestHandler: Send + Sync + 'static {
    fn handle_request(
        &self,
        method: &str,
        params: Option<Value>,
    ) -> impl std::future::Future<Output = HandlerResult> + Send;
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid listen address {addr}: {source}")]
    InvalidAddress {
        addr: String,
        source: std::net::AddrParseError,
    },
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// 0 lets the OS pick
    pub port: u16,
    pub hostname: String,
    /// Allow cross-origin browser clients
    pub enable_cors: bool,
    /// `None` means unlimited
    pub max_connections: Option<usize>,
    /// Log per-connection stats on disconnect
    pub verbose_logging: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            port: 7171,
            hostname: "127.0.0.1".into(),
            enable_cors: false,
            max_connections: Some(32),
            verbose_logging: false,
        }
    }
}

struct Shared<H: RequestHandler> {
    handler: Arc<H>,
    config: TransportConfig,
    notifications: broadcast::Sender<String>,
    clients: AtomicUsize,
}

/// A running server. Dropping it leaves the server running; call [`stop`](Self::stop).
pub struct TransportServer {
    shutdown_tx: Option<mpsc::Sender<()>>,
    task: Option<JoinHandle<()>>,
    port: u16,
}

impl TransportServer {
    /// Start with a private notification channel.
    pub async fn start<H: RequestHandler>(config: TransportConfig, handler: H) -> Result<Self, TransportError> {
        let (tx, _) = broadcast::channel(1024);
        Self::start_with_sender(config, Arc::new(handler), tx).await
    }

    /// Start on a channel created earlier, so services wired before the
    /// transport existed publish straight to connected clients.
    pub async fn start_with_sender<H: RequestHandler>(
        config: TransportConfig,
        handler: Arc<H>,
        notifications: broadcast::Sender<String>,
    ) -> Result<Self, TransportError> {
        let addr_str = format!("{}:{}", config.hostname, config.port);
        let addr: SocketAddr = addr_str
            .parse()
            .map_err(|source| TransportError::InvalidAddress { addr: addr_str.clone(), source })?;
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|source| TransportError::Bind { addr, source })?;
        let port = listener
            .local_addr()
            .map_err(|source| TransportError::Bind { addr, source })?
            .port();

        let enable_cors = config.enable_cors;
        let shared = Arc::new(Shared {
            handler,
            config,
            notifications,
            clients: AtomicUsize::new(0),
        });
        let mut app = Router::new()
            .route("/ws", get(upgrade::<H>))
            .route("/health", get(health::<H>))
            .with_state(shared.clone());
        if enable_cors {
            app = app.layer(CorsLayer::permissive());
        }

        info!("Transport listening on ws://{}:{port}/ws", shared.config.hostname);

        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let task = tokio::spawn(async move {
            let shutdown = async move {
                let _ = shutdown_rx.recv().await;
            };
            if let Err(e) = axum::serve(listener, app).with_graceful_shutdown(shutdown).await {
                error!("Transport server error: {e}");
            }
        });

        Ok(Self {
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
            port,
        })
    }

    /// The bound port (useful when configured with port 0).
    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(()).await;
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
        info!("Transport server stopped");
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HTTP routes
// ─────────────────────────────────────────────────────────────────────────────

async fn upgrade<H: RequestHandler>(ws: WebSocketUpgrade, State(shared): State<Arc<Shared<H>>>) -> Response {
    if let Some(max) = shared.config.max_connections {
        if shared.clients.load(Ordering::Relaxed) >= max {
            warn!("Connection rejected: limit of {max} reached");
            return StatusCode::SERVICE_UNAVAILABLE.into_response();
        }
    }
    ws.on_upgrade(move |socket| serve_client(socket, shared)).into_response()
}

async fn health<H: RequestHandler>(State(shared): State<Arc<Shared<H>>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": SERVER_VERSION,
        "clients": shared.clients.load(Ordering::Relaxed),
    }))
}

// ─────────────────────────────────────────────────────────────────────────────
// Per-connection loop
// ─────────────────────────────────────────────────────────────────────────────

async fn serve_client<H: RequestHandler>(socket: WebSocket, shared: Arc<Shared<H>>) {
    shared.clients.fetch_add(1, Ordering::Relaxed);
    let mut client = ClientConnection::new(uuid::Uuid::new_v4().to_string());
    info!("Client connected: {}", client.id);

    let (mut sink, mut stream) = socket.split();
    // Subscribe before the welcome so nothing published after it is missed
    let mut broadcasts = shared.notifications.subscribe();

    let welcome = McNotification::new(
        Notifications::SERVER_CONNECTED,
        Some(json!({ "clientId": client.id, "serverVersion": SERVER_VERSION })),
    );
    send_json(&mut sink, &welcome).await;

    loop {
        tokio::select! {
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    client.touch();
                    if let Some(reply) = handle_frame(&text, shared.handler.as_ref()).await {
                        if !send_json(&mut sink, &reply).await {
                            break;
                        }
                    }
                }
                Some(Ok(Message::Ping(data))) => {
                    let _ = sink.send(Message::Pong(data)).await;
                }
                Some(Ok(Message::Close(_))) | None => {
                    debug!("Client closed connection: {}", client.id);
                    break;
                }
                Some(Err(e)) => {
                    warn!("WebSocket error for {}: {e}", client.id);
                    break;
                }
                Some(Ok(_)) => {}
            },

            outgoing = broadcasts.recv() => match outgoing {
                Ok(text) => {
                    if let Err(e) = sink.send(Message::Text(text.into())).await {
                        error!("Failed to push notification to {}: {e}", client.id);
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Client {} fell behind, {skipped} notifications dropped", client.id);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    let remaining = shared.clients.fetch_sub(1, Ordering::Relaxed) - 1;
    if shared.config.verbose_logging {
        info!(
            "Client disconnected: {} after {:?}, {} requests, idle {:?} (total: {remaining})",
            client.id,
            client.connected_for(),
            client.requests,
            client.idle_for(),
        );
    } else {
        info!("Client disconnected: {} (total: {remaining})", client.id);
    }
}

/// Serialize and send; returns false once the socket is unusable.
async fn send_json<T: Serialize>(sink: &mut WsSink, value: &T) -> bool {
    let text = match serde_json::to_string(value) {
        Ok(text) => text,
        Err(e) => {
            error!("Failed to encode outgoing message: {e}");
            return true;
        }
    };
    match sink.send(Message::Text(text.into())).await {
        Ok(()) => true,
        Err(e) => {
            error!("Failed to send message: {e}");
            false
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// JSON-RPC framing
// ─────────────────────────────────────────────────────────────────────────────

fn parse_call(text: &str) -> Result<McRequest, McResponse> {
    let frame: Value = serde_json::from_str(text)
        .map_err(|_| McResponse::error(None, McError::parse_error("Failed to parse JSON")))?;

    // Recover the id for the error reply even when the rest of the frame is bad
    let id = frame
        .get("id")
        .cloned()
        .and_then(|v| serde_json::from_value::<RequestId>(v).ok());

    match serde_json::from_value::<McRequest>(frame) {
        Ok(request) if request.is_valid() => Ok(request),
        _ => Err(McResponse::error(id, McError::invalid_request("Invalid JSON-RPC 2.0 request"))),
    }
}

/// Route one text frame. Calls without an `id` are notifications: they run
/// but get no reply.
async fn handle_frame<H: RequestHandler>(text: &str, handler: &H) -> Option<McResponse> {
    let request = match parse_call(text) {
        Ok(request) => request,
        Err(rejection) => return Some(rejection),
    };

    let result = handler.handle_request(&request.method, request.params).await;
    let id = request.id?;
    Some(match result {
        Ok(value) => McResponse::success(id, value),
        Err(err) => McResponse::error(Some(id), err),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_call_accepts_notifications() {
        let request = parse_call(r#"{"jsonrpc":"2.0","method":"messageCenter/show"}"#).unwrap();
        assert!(request.id.is_none());
        assert_eq!(request.method, "messageCenter/show");
        assert!(request.params.is_none());
    }

    #[test]
    fn parse_call_rejects_bad_frames() {
        let McResponse::Error(err) = parse_call("{{{").unwrap_err() else {
            panic!("expected error response");
        };
        assert_eq!(err.error.code, -32700);

        let McResponse::Error(err) = parse_call(r#"{"jsonrpc":"1.0","id":3,"method":"x"}"#).unwrap_err() else {
            panic!("expected error response");
        };
        assert_eq!(err.error.code, -32600);
        assert_eq!(err.id, Some(RequestId::Number(3)));

        let McResponse::Error(err) = parse_call(r#"{"jsonrpc":"2.0","id":"a","method":""}"#).unwrap_err() else {
            panic!("expected error response");
        };
        assert_eq!(err.error.code, -32600);
        assert_eq!(err.id, Some(RequestId::String("a".into())));

        let McResponse::Error(err) = parse_call(r#"{"jsonrpc":"2.0","id":4}"#).unwrap_err() else {
            panic!("expected error response");
        };
        assert_eq!(err.error.code, -32600);
        assert_eq!(err.id, Some(RequestId::Number(4)));
    }
}
