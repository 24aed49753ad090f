//! WebSocket upgrade handler

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::game::WorldCommand;
use crate::ws::protocol::ClientMsg;

/// WebSocket upgrade handler. Every connection gets a fresh player id.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let player_id = Uuid::new_v4();
    debug!(player_id = %player_id, "WebSocket upgrade");
    ws.on_upgrade(move |socket| handle_socket(socket, player_id, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, player_id: Uuid, state: AppState) {
    info!(player_id = %player_id, "New WebSocket connection");

    let (mut ws_sink, mut ws_stream) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::channel::<String>(state.config.outbound_buffer);
    let command_tx = state.world.command_tx.clone();

    if command_tx
        .send(WorldCommand::Connect {
            id: player_id,
            outbound: outbound_tx,
        })
        .await
        .is_err()
    {
        error!(player_id = %player_id, "Simulation is not running, dropping connection");
        return;
    }

    // Writer task: simulation frames -> WebSocket
    let writer_handle = tokio::spawn(async move {
        while let Some(frame) = outbound_rx.recv().await {
            if let Err(e) = ws_sink.send(Message::Text(frame)).await {
                debug!(player_id = %player_id, error = %e, "WebSocket send failed");
                break;
            }
        }
        let _ = ws_sink.close().await;
    });

    // Reader loop: WebSocket -> simulation
    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => match ClientMsg::decode(&text) {
                Ok(msg) => {
                    if command_tx
                        .send(WorldCommand::Input { id: player_id, msg })
                        .await
                        .is_err()
                    {
                        debug!(player_id = %player_id, "Command channel closed");
                        break;
                    }
                }
                Err(e) => {
                    warn!(player_id = %player_id, error = %e, "Failed to parse client message");
                }
            },
            Ok(Message::Binary(_)) => {
                warn!(player_id = %player_id, "Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(Message::Close(_)) => {
                info!(player_id = %player_id, "Client initiated close");
                break;
            }
            Err(e) => {
                debug!(player_id = %player_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    // Signal disconnect to the simulation
    let _ = command_tx.send(WorldCommand::Disconnect { id: player_id }).await;

    writer_handle.abort();

    info!(player_id = %player_id, "WebSocket connection closed");
}
