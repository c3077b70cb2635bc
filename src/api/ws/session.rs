// src/api/ws/session.rs
// Push-binding handler: one socket, a filtered view of the session event bus.

use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    extract::{State, WebSocketUpgrade},
    extract::ws::{Message, WebSocket},
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt, stream::SplitSink};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::api::ws::message::{WsClientMessage, WsServerMessage};
use crate::session::{self, SessionEvent};
use crate::state::AppState;

/// Main WebSocket handler entry point
pub async fn ws_session_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state))
}

async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    // Subscribe before any launch so no event for our sessions can be missed.
    let mut events = app_state.sessions.subscribe();

    // Sessions launched over this connection; only their events are forwarded.
    let mut owned: HashSet<String> = HashSet::new();

    info!("WS client connected");

    loop {
        tokio::select! {
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<WsClientMessage>(&text) {
                            Ok(msg) => {
                                if handle_client_message(msg, &app_state, &mut owned, &mut sender)
                                    .await
                                    .is_err()
                                {
                                    break;
                                }
                            }
                            Err(e) => {
                                warn!("unparseable WS message: {e}");
                                let reply = WsServerMessage::Error {
                                    message: format!("invalid message: {e}"),
                                    code: Some("bad_message".into()),
                                };
                                if send(&mut sender, &reply).await.is_err() {
                                    break;
                                }
                            }
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {
                        debug!("ignoring non-text WS frame");
                    }
                    Some(Err(e)) => {
                        warn!("WS receive error: {e}");
                        break;
                    }
                }
            }
            event = events.recv() => {
                match event {
                    Ok(event) => {
                        if !owned.contains(event.session_id()) {
                            continue;
                        }
                        if let Some(reply) = translate_event(event) {
                            if send(&mut sender, &reply).await.is_err() {
                                break;
                            }
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("WS client lagging, {skipped} session events dropped");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }

    info!("WS client disconnected");
}

async fn handle_client_message(
    msg: WsClientMessage,
    app_state: &Arc<AppState>,
    owned: &mut HashSet<String>,
    sender: &mut SplitSink<WebSocket, Message>,
) -> Result<(), axum::Error> {
    match msg {
        WsClientMessage::RunCode { code, session_id } => {
            match session::launch(&app_state.sessions, &code, session_id).await {
                Ok(id) => {
                    info!(session_id = %id, "run started via WS");
                    owned.insert(id);
                }
                Err(e) => {
                    let reply = WsServerMessage::ExecutionError {
                        message: e.to_string(),
                        session_id: None,
                    };
                    send(sender, &reply).await?;
                }
            }
        }
        WsClientMessage::SendInput { session_id, input } => {
            let reply = match app_state.sessions.send_input(&session_id, &input).await {
                Ok(()) => WsServerMessage::InputSent { session_id },
                Err(e) => WsServerMessage::Error {
                    message: e.to_string(),
                    code: Some("input_failed".into()),
                },
            };
            send(sender, &reply).await?;
        }
    }
    Ok(())
}

/// Maps a bus event onto the wire message the client sees.
fn translate_event(event: SessionEvent) -> Option<WsServerMessage> {
    match event {
        SessionEvent::Started { session_id } => {
            Some(WsServerMessage::SessionStarted { session_id })
        }
        SessionEvent::Output { session_id, event } => Some(WsServerMessage::Output {
            session_id,
            output: vec![event],
        }),
        SessionEvent::InputRequired { session_id } => {
            Some(WsServerMessage::InputRequired { session_id })
        }
        SessionEvent::Completed {
            session_id,
            exit_code,
        } => Some(WsServerMessage::ExecutionComplete {
            session_id,
            exit_code,
        }),
    }
}

async fn send(
    sender: &mut SplitSink<WebSocket, Message>,
    msg: &WsServerMessage,
) -> Result<(), axum::Error> {
    let text = match serde_json::to_string(msg) {
        Ok(text) => text,
        Err(e) => {
            warn!("failed to serialize WS message: {e}");
            return Ok(());
        }
    };
    sender.send(Message::Text(text.into())).await
}
