//! Per-connection bookkeeping.

use std::time::{Duration, Instant};

/// A connected client.
#[derive(Debug)]
pub struct ClientConnection {
    /// Unique client ID
    pub id: String,
    /// When the client connected
    pub connected_at: Instant,
    /// Last time we received any message from this client
    pub last_activity: Instant,
    /// JSON-RPC requests answered on this connection
    pub requests: u64,
}

impl ClientConnection {
    pub fn new(id: String) -> Self {
        let now = Instant::now();
        Self {
            id,
            connected_at: now,
            last_activity: now,
            requests: 0,
        }
    }

    /// Record an incoming request.
    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
        self.requests += 1;
    }

    pub fn connected_for(&self) -> Duration {
        self.connected_at.elapsed()
    }

    pub fn idle_for(&self) -> Duration {
        self.last_activity.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touch_counts_requests() {
        let mut conn = ClientConnection::new("c1".into());
        assert_eq!(conn.requests, 0);
        conn.touch();
        conn.touch();
        assert_eq!(conn.requests, 2);
        assert!(conn.last_activity >= conn.connected_at);
        assert!(conn.idle_for() <= conn.connected_for());
    }
}
