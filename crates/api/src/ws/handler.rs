use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use imagine_core::protocol::{ClientMessage, ServerMessage};

use crate::state::AppState;

/// HTTP handler that upgrades the connection to WebSocket.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Manage a single WebSocket connection after upgrade.
///
/// Splits the socket into a sink (outbound) and stream (inbound), then:
///   1. Subscribes to the gateway, which queues the `active_jobs` snapshot.
///   2. Spawns a sender task that forwards queued messages to the sink.
///   3. Dispatches inbound commands, each on its own task so a slow
///      provider call never stalls the receive loop.
///   4. Cleans up on disconnect.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(conn_id = %conn_id, "WebSocket connected");

    let mut rx = state.gateway.subscribe(conn_id.clone()).await;

    let (mut sink, mut stream) = socket.split();

    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
        }
    });

    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            Ok(Message::Text(text)) => {
                let state = state.clone();
                let conn_id = conn_id.clone();
                tokio::spawn(async move {
                    dispatch(&state, &conn_id, text.as_str()).await;
                });
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    state.gateway.unsubscribe(&conn_id).await;
    send_task.abort();
    tracing::info!(conn_id = %conn_id, "WebSocket disconnected");
}

/// Handle one inbound text frame from `conn_id`.
///
/// Failures are reported to the originating connection only.
pub async fn dispatch(state: &AppState, conn_id: &str, text: &str) {
    let message = match ClientMessage::parse(text) {
        Ok(message) => message,
        Err(e) => {
            tracing::debug!(conn_id, error = %e, "Unparseable WebSocket message");
            let reply = ServerMessage::Error {
                display_group_id: None,
                job_id: None,
                message: format!("Invalid message: {e}"),
            };
            state.gateway.send_to(conn_id, &reply).await;
            return;
        }
    };

    let display_group_id = message.display_group_id().map(str::to_string);

    let result = match message {
        ClientMessage::Generate {
            prompt,
            display_group_id,
        } => state.tracker.submit_prompt(&prompt, display_group_id).await,
        ClientMessage::ButtonAction {
            job_id,
            action_token,
            original_prompt,
            display_group_id,
        } => {
            state
                .tracker
                .submit_action(&job_id, &action_token, &original_prompt, display_group_id)
                .await
        }
    };

    if let Err(e) = result {
        tracing::warn!(conn_id, error = %e, "WebSocket request rejected");
        let reply = ServerMessage::Error {
            display_group_id,
            job_id: None,
            message: e.client_message(),
        };
        state.gateway.send_to(conn_id, &reply).await;
    }
}
