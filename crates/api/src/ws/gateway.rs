//! Fan-out of job lifecycle events to browser clients.
//!
//! The gateway turns [`ServerMessage`]s into text frames and hands them to
//! the [`WsManager`]. It reads the [`JobRegistry`] only to greet new
//! subscribers with an `active_jobs` snapshot and never mutates it.

use std::sync::Arc;

use axum::extract::ws::Message;
use imagine_core::protocol::ServerMessage;
use tokio::sync::mpsc;

use crate::engine::JobRegistry;
use crate::ws::WsManager;

pub struct BroadcastGateway {
    ws_manager: Arc<WsManager>,
    registry: Arc<JobRegistry>,
}

impl BroadcastGateway {
    pub fn new(ws_manager: Arc<WsManager>, registry: Arc<JobRegistry>) -> Self {
        Self {
            ws_manager,
            registry,
        }
    }

    pub fn ws_manager(&self) -> &Arc<WsManager> {
        &self.ws_manager
    }

    /// Register a connection and queue the `active_jobs` snapshot as its
    /// first message.
    pub async fn subscribe(&self, conn_id: String) -> mpsc::UnboundedReceiver<Message> {
        let registry = Arc::clone(&self.registry);
        self.ws_manager
            .add_with_greeting(conn_id, async move {
                let jobs = registry.snapshot().await;
                to_frame(&ServerMessage::ActiveJobs { jobs })
            })
            .await
    }

    pub async fn unsubscribe(&self, conn_id: &str) {
        self.ws_manager.remove(conn_id).await;
    }

    /// Send `message` to every connected client. Best effort.
    pub async fn broadcast(&self, message: &ServerMessage) {
        if let Some(frame) = to_frame(message) {
            self.ws_manager.broadcast(frame).await;
        }
    }

    /// Send `message` to the single connection `conn_id`.
    pub async fn send_to(&self, conn_id: &str, message: &ServerMessage) -> bool {
        match to_frame(message) {
            Some(frame) => self.ws_manager.send_to(conn_id, frame).await,
            None => false,
        }
    }
}

fn to_frame(message: &ServerMessage) -> Option<Message> {
    match message.to_json() {
        Ok(json) => Some(Message::Text(json.into())),
        Err(e) => {
            tracing::error!(kind = message.kind(), error = %e, "Failed to serialize WebSocket message");
            None
        }
    }
}
