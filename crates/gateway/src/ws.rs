//! The client-facing websocket — where client events enter the Event
//! Dispatcher (C2) and server events leave for the client (§6 EXTERNAL
//! INTERFACES).

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use uuid::Uuid;

use bargein_domain::trace::TraceEvent;
use bargein_protocol::{ClientEvent, ServerEvent};

use crate::runtime::tools::ToolTable;
use crate::runtime::Coordinator;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new().route("/ws", get(ws_handler)).with_state(state)
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// One coordinator per connection: a reader loop feeding `ClientEvent`s
/// in, a writer task draining `ServerEvent`s out, and the coordinator
/// task itself running between them.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let session_id = Uuid::new_v4().to_string();
    let (mut ws_sink, mut ws_stream) = socket.split();

    let (outbound_tx, mut outbound_rx) = mpsc::channel::<ServerEvent>(64);

    let writer = tokio::spawn(async move {
        while let Some(event) = outbound_rx.recv().await {
            let Ok(json) = serde_json::to_string(&event) else { continue };
            if ws_sink.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    if outbound_tx
        .send(ServerEvent::Connected { session_id: session_id.clone(), message: "ready".into() })
        .await
        .is_err()
    {
        writer.abort();
        return;
    }
    TraceEvent::SessionOpened { session_id: session_id.clone() }.emit();

    let tool_table = Arc::new(ToolTable::new(state.tool_scheduler.clone()));
    let coordinator = Coordinator::new(
        session_id.clone(),
        state.config.clone(),
        state.llm.clone(),
        state.stt.clone(),
        state.tts.clone(),
        state.tool_registry.clone(),
        tool_table,
        outbound_tx,
    );

    let (inbound_tx, inbound_rx) = mpsc::channel::<ClientEvent>(64);
    let session_span = tracing::info_span!("session", session_id = %session_id, "otel.kind" = "SERVER");
    let coordinator_task =
        tokio::spawn(tracing::Instrument::instrument(coordinator.run(inbound_rx), session_span));

    let mut reason = "stream_ended";
    while let Some(frame) = ws_stream.next().await {
        match frame {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientEvent>(&text) {
                Ok(event) => {
                    if inbound_tx.send(event).await.is_err() {
                        reason = "coordinator_gone";
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!(session_id = %session_id, error = %e, "malformed client event, ignoring");
                }
            },
            Ok(Message::Close(_)) => {
                reason = "client_close";
                break;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(session_id = %session_id, error = %e, "websocket read error");
                reason = "read_error";
                break;
            }
        }
    }

    drop(inbound_tx);
    let _ = coordinator_task.await;
    writer.abort();
    TraceEvent::SessionClosed { session_id: session_id.clone(), reason: reason.to_string() }.emit();
    tracing::info!(session_id = %session_id, "connection closed");
}
