//! WebSocket upgrade and the per-session reader/writer task pair
//!.

use crate::app::AppState;
use crate::command;
use crate::notify;
use crate::session::Session;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use cce_core::SessionId;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    if state.sessions.read().await.len() >= state.config.max_sessions {
        tracing::warn!("rejecting connection: max_sessions reached");
        let (mut sender, _receiver) = socket.split();
        let _ = sender.close().await;
        return;
    }

    let (outgoing_tx, outgoing_rx) = mpsc::channel::<String>(256);
    let session = Arc::new(Session::new(SessionId::new(), outgoing_tx));
    state.sessions.write().await.insert(session.id, session.clone());

    let (ws_sink, ws_stream) = socket.split();
    let writer_task = tokio::spawn(run_writer(ws_sink, outgoing_rx));

    if let Ok(text) = serde_json::to_string(&notify::connected(session.id, &state.config.version)) {
        let _ = session.outgoing.try_send(text);
    }

    run_reader(ws_stream, session.clone(), state.clone()).await;

    command::cancel_active(&session).await;
    state.sessions.write().await.remove(&session.id);
    drop(session);
    let _ = writer_task.await;
}

async fn run_writer(
    mut sink: futures_util::stream::SplitSink<WebSocket, Message>,
    mut rx: mpsc::Receiver<String>,
) {
    while let Some(text) = rx.recv().await {
        if sink.send(Message::Text(text.into())).await.is_err() {
            break;
        }
    }
}

async fn run_reader(
    mut stream: futures_util::stream::SplitStream<WebSocket>,
    session: Arc<Session>,
    state: Arc<AppState>,
) {
    while let Some(message) = stream.next().await {
        let message = match message {
            Ok(m) => m,
            Err(e) => {
                tracing::debug!(error = %e, "websocket read error; closing session");
                break;
            }
        };

        match message {
            Message::Text(text) => command::handle_incoming(&text, &session, &state).await,
            Message::Close(_) => break,
            Message::Ping(_) | Message::Pong(_) | Message::Binary(_) => {}
        }
    }
}
