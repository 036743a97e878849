use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use std::sync::Arc;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    server::{resolve_log_path, AppState},
    types::{ClientMessage, ServerMessage},
    watcher::{self, TranscriptEvent},
};

/// A transcript being followed for one connection. Dropping the watcher
/// stops notifications; the forwarding task is aborted explicitly.
struct ActiveWatch {
    _watcher: notify::RecommendedWatcher,
    forward_task: JoinHandle<()>,
}

impl ActiveWatch {
    fn stop(self) {
        self.forward_task.abort();
    }
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let client_id = Uuid::new_v4().to_string();
    info!("New WebSocket connection established: {}", client_id);

    let (mut sender, mut receiver) = socket.split();

    // Create channel for server messages
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let text = match serde_json::to_string(&msg) {
                Ok(text) => text,
                Err(e) => {
                    error!("Failed to serialize server message: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    let mut active: Option<ActiveWatch> = None;

    while let Some(Ok(msg)) = receiver.next().await {
        match msg {
            Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(client_msg) => {
                    handle_message(client_msg, &state, &tx, &mut active).await;
                }
                Err(e) => {
                    warn!("Invalid message from {}: {}", client_id, e);
                    let _ = tx.send(ServerMessage::TranscriptError {
                        error: format!("invalid message: {e}"),
                    });
                }
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    if let Some(watch) = active.take() {
        watch.stop();
    }
    send_task.abort();
    info!("WebSocket connection closed: {}", client_id);
}

async fn handle_message(
    msg: ClientMessage,
    state: &AppState,
    tx: &mpsc::UnboundedSender<ServerMessage>,
    active: &mut Option<ActiveWatch>,
) {
    match msg {
        ClientMessage::Ping => {
            let _ = tx.send(ServerMessage::Pong);
        }
        ClientMessage::UnwatchTranscript => {
            if let Some(watch) = active.take() {
                debug!("Stopping transcript watch");
                watch.stop();
            }
        }
        ClientMessage::WatchTranscript { path, from_byte } => {
            // One watch per connection; a new request replaces the old one.
            if let Some(watch) = active.take() {
                watch.stop();
            }

            match start_watch(state, path, from_byte, tx.clone()).await {
                Ok(watch) => *active = Some(watch),
                Err(e) => {
                    warn!("Failed to watch transcript: {e:#}");
                    let _ = tx.send(ServerMessage::TranscriptError {
                        error: format!("{e:#}"),
                    });
                }
            }
        }
    }
}

async fn start_watch(
    state: &AppState,
    path: String,
    from_byte: u64,
    tx: mpsc::UnboundedSender<ServerMessage>,
) -> anyhow::Result<ActiveWatch> {
    let resolved = resolve_log_path(&state.log_root, &path)?;
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<TranscriptEvent>();
    let watcher = watcher::watch_transcript(&resolved, from_byte, event_tx).await?;

    let forward_task = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            let msg = match event {
                TranscriptEvent::Batch(result) => ServerMessage::TranscriptBatch {
                    path: path.clone(),
                    messages: result.messages,
                    bytes_read: result.bytes_read,
                },
                TranscriptEvent::Error { error } => ServerMessage::TranscriptError { error },
            };
            if tx.send(msg).is_err() {
                break;
            }
        }
    });

    Ok(ActiveWatch {
        _watcher: watcher,
        forward_task,
    })
}
