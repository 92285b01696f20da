//! WebSocket support for live job updates.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use fileforge_core::{JobEvent, JobId, JobSummary, RetentionSettings};

use crate::metrics::{WS_CONNECTIONS_ACTIVE, WS_CONNECTIONS_TOTAL, WS_LAG_EVENTS, WS_MESSAGES_SENT};
use crate::state::AppState;

/// WebSocket message sent to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    /// Every job in the store, sent once when a client connects.
    Snapshot { jobs: Vec<JobSummary> },
    /// A job was created.
    JobCreated { job: JobSummary },
    /// A job changed status or progress.
    JobUpdated { job: JobSummary },
    /// A job was cancelled, dismissed, retried or evicted.
    JobRemoved { id: JobId },
    /// Retention settings were changed at runtime.
    RetentionChanged { settings: RetentionSettings },
}

impl WsMessage {
    /// Label used for the messages-sent metric.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Snapshot { .. } => "snapshot",
            Self::JobCreated { .. } => "job_created",
            Self::JobUpdated { .. } => "job_updated",
            Self::JobRemoved { .. } => "job_removed",
            Self::RetentionChanged { .. } => "retention_changed",
        }
    }
}

impl From<JobEvent> for WsMessage {
    fn from(event: JobEvent) -> Self {
        match event {
            JobEvent::Created { job } => Self::JobCreated { job },
            JobEvent::Updated { job } => Self::JobUpdated { job },
            JobEvent::Removed { id } => Self::JobRemoved { id },
        }
    }
}

/// Broadcaster for WebSocket messages using tokio broadcast channel.
#[derive(Debug, Clone)]
pub struct WsBroadcaster {
    sender: broadcast::Sender<WsMessage>,
}

impl WsBroadcaster {
    /// Create a new broadcaster with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Broadcast a message to all connected clients.
    pub fn broadcast(&self, msg: WsMessage) {
        // No receivers just means no client is connected
        let _ = self.sender.send(msg);
    }

    /// Subscribe to receive messages.
    pub fn subscribe(&self) -> broadcast::Receiver<WsMessage> {
        self.sender.subscribe()
    }

    pub fn retention_changed(&self, settings: RetentionSettings) {
        self.broadcast(WsMessage::RetentionChanged { settings });
    }

    /// Relays job store events to connected clients until the store goes away.
    pub fn forward_job_events(&self, mut events: broadcast::Receiver<JobEvent>) -> JoinHandle<()> {
        let broadcaster = self.clone();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => broadcaster.broadcast(event.into()),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("Job event forwarder lagged, skipped {} events", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("Job event channel closed");
                        break;
                    }
                }
            }
        })
    }
}

impl Default for WsBroadcaster {
    fn default() -> Self {
        Self::new(256)
    }
}

/// WebSocket upgrade handler.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

fn encode(msg: &WsMessage) -> Option<Message> {
    match serde_json::to_string(msg) {
        Ok(json) => Some(Message::Text(json.into())),
        Err(e) => {
            error!("Failed to serialize WsMessage: {}", e);
            None
        }
    }
}

/// Handle a single WebSocket connection.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    // Subscribe before taking the snapshot so no event falls in between
    let mut rx = state.ws_broadcaster().subscribe();
    let snapshot = WsMessage::Snapshot {
        jobs: state.store().list().iter().map(|j| j.summary()).collect(),
    };

    WS_CONNECTIONS_TOTAL.inc();
    WS_CONNECTIONS_ACTIVE.inc();

    info!("WebSocket client connected");

    let send_task = tokio::spawn(async move {
        if let Some(message) = encode(&snapshot) {
            WS_MESSAGES_SENT.with_label_values(&[snapshot.kind()]).inc();
            if sender.send(message).await.is_err() {
                return;
            }
        }

        loop {
            match rx.recv().await {
                Ok(msg) => {
                    let Some(message) = encode(&msg) else {
                        continue;
                    };
                    WS_MESSAGES_SENT.with_label_values(&[msg.kind()]).inc();
                    if sender.send(message).await.is_err() {
                        debug!("WebSocket send failed, client disconnected");
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("WebSocket client lagged, skipped {} messages", n);
                    WS_LAG_EVENTS.inc();
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Broadcast channel closed");
                    break;
                }
            }
        }
    });

    // Clients only ever close; anything else is logged and ignored
    while let Some(result) = receiver.next().await {
        match result {
            Ok(Message::Close(_)) => {
                debug!("WebSocket client requested close");
                break;
            }
            Ok(Message::Text(text)) => {
                debug!("Received text message: {}", text);
            }
            Ok(_) => {}
            Err(e) => {
                warn!("WebSocket receive error: {}", e);
                break;
            }
        }
    }

    send_task.abort();
    WS_CONNECTIONS_ACTIVE.dec();
    info!("WebSocket client disconnected");
}
