use std::collections::HashMap;
use std::future::Future;

use axum::body::Bytes;
use axum::extract::ws::Message;
use tokio::sync::{mpsc, RwLock};

/// Channel sender half for pushing messages to a WebSocket connection.
pub type WsSender = mpsc::UnboundedSender<Message>;

/// Manages all active WebSocket connections.
///
/// Thread-safe via interior `RwLock`; wrapped in `Arc` and shared across
/// the application.
pub struct WsManager {
    connections: RwLock<HashMap<String, WsSender>>,
}

impl WsManager {
    /// Create a new, empty connection manager.
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new connection.
    ///
    /// Returns the receiver half of the message channel so the caller can
    /// forward messages to the WebSocket sink.
    pub async fn add(&self, conn_id: String) -> mpsc::UnboundedReceiver<Message> {
        self.add_with_greeting(conn_id, async { None }).await
    }

    /// Register a new connection whose first message is produced by
    /// `greeting`.
    ///
    /// The greeting is computed and queued while the connection map is
    /// write-locked, so no broadcast can reach the new channel before it.
    pub async fn add_with_greeting<F>(
        &self,
        conn_id: String,
        greeting: F,
    ) -> mpsc::UnboundedReceiver<Message>
    where
        F: Future<Output = Option<Message>>,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut conns = self.connections.write().await;
        if let Some(message) = greeting.await {
            let _ = tx.send(message);
        }
        conns.insert(conn_id, tx);
        rx
    }

    /// Remove a connection by its ID.
    pub async fn remove(&self, conn_id: &str) {
        self.connections.write().await.remove(conn_id);
    }

    /// Broadcast a message to all connected clients.
    ///
    /// Connections whose send channels are closed are silently skipped
    /// (they will be cleaned up on their next receive loop iteration).
    pub async fn broadcast(&self, message: Message) {
        let conns = self.connections.read().await;
        for conn in conns.values() {
            let _ = conn.send(message.clone());
        }
    }

    /// Send a message to a single connection.
    ///
    /// Returns `false` when the connection is unknown or its channel closed.
    pub async fn send_to(&self, conn_id: &str, message: Message) -> bool {
        match self.connections.read().await.get(conn_id) {
            Some(conn) => conn.send(message).is_ok(),
            None => false,
        }
    }

    /// Return the current number of active connections.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Send a Close frame to every connection, then clear the map.
    ///
    /// Used during graceful shutdown to notify all clients before the
    /// server stops.
    pub async fn shutdown_all(&self) {
        let mut conns = self.connections.write().await;
        let count = conns.len();
        for conn in conns.values() {
            let _ = conn.send(Message::Close(None));
        }
        conns.clear();
        tracing::info!(count, "Closed all WebSocket connections");
    }

    /// Send a Ping frame to every connected client.
    pub async fn ping_all(&self) {
        let conns = self.connections.read().await;
        for conn in conns.values() {
            let _ = conn.send(Message::Ping(Bytes::new()));
        }
    }
}

impl Default for WsManager {
    fn default() -> Self {
        Self::new()
    }
}
