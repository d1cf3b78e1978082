// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of gridreplay.

//! The `/ws` duplex route (§4.5, §6). Fan-out rides `tokio::sync::broadcast`;
//! the per-client *write* path is a separate bounded `mpsc` queue drained by
//! a dedicated writer task, so a lagging broadcast receiver (client missed
//! messages) and a saturated socket (client can't keep up) are distinguished.

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use gridreplay_types::{ClientCommand, EngineEvent};
use tokio::sync::{broadcast, mpsc};

use crate::state::BusState;
use crate::translate::translate;

pub async fn ws_handler(State(state): State<BusState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: BusState) {
    let (mut sink, mut stream) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::channel::<Message>(state.outbound_buffer_capacity);

    if let Some((data_loaded, sim_state)) = state.engine.request_snapshot().await {
        send_event(&outbound_tx, &data_loaded);
        send_event(&outbound_tx, &sim_state);
    }

    let broadcast_rx = state.engine.subscribe();
    let forwarder = tokio::spawn(forward_events(broadcast_rx, outbound_tx.clone()));
    let writer = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sink.send(message).await.is_err() {
                break;
            }
        }
    });

    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientCommand>(&text) {
                Ok(command) => state.engine.send(translate(command)),
                Err(error) => {
                    tracing::warn!(%error, "dropping unrecognized client command");
                }
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(error) => {
                tracing::warn!(%error, "client socket read error, unregistering");
                break;
            }
        }
    }

    forwarder.abort();
    writer.abort();
}

async fn forward_events(mut broadcast_rx: broadcast::Receiver<EngineEvent>, outbound_tx: mpsc::Sender<Message>) {
    loop {
        match broadcast_rx.recv().await {
            Ok(event) => send_event(&outbound_tx, &event),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "client lagged behind event broadcast, skipping ahead");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn send_event(outbound_tx: &mpsc::Sender<Message>, event: &EngineEvent) {
    let Ok(json) = serde_json::to_string(event) else {
        tracing::warn!("failed to serialize outbound event");
        return;
    };
    if outbound_tx.try_send(Message::Text(json.into())).is_err() {
        tracing::warn!("client outbound buffer full, dropping message");
    }
}
