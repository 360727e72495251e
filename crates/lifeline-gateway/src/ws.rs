// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebSocket fan-out of the pipeline event stream.
//!
//! Each connection subscribes to all three bus channels (`calls`,
//! `transcripts`, `responses`) and forwards every frame verbatim. The
//! connection is read-only from the client's perspective; inbound text is
//! ignored. A slow connection is isolated by its bounded bus queues and
//! never backpressures the pipeline; disconnecting drops the subscriptions
//! and nothing else.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tracing::debug;

use lifeline_core::BusChannel;

use crate::server::GatewayState;

/// WebSocket upgrade handler for GET /ws.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<GatewayState>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Forwards bus frames to one dashboard connection until it goes away.
async fn handle_socket(socket: WebSocket, state: GatewayState) {
    let (mut sender, mut receiver) = socket.split();

    let [mut calls, mut transcripts, mut responses] = {
        let [a, b, c] = BusChannel::ALL;
        [
            state.bus.subscribe(a),
            state.bus.subscribe(b),
            state.bus.subscribe(c),
        ]
    };

    debug!("dashboard connection established");

    loop {
        let frame = tokio::select! {
            frame = calls.recv() => frame,
            frame = transcripts.recv() => frame,
            frame = responses.recv() => frame,
            inbound = receiver.next() => {
                match inbound {
                    // The stream is one-way; ignore anything the client says.
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => continue,
                }
            }
        };

        // None means the bus itself is gone; the server is shutting down.
        let Some(frame) = frame else { break };
        if sender
            .send(Message::Text(frame.to_string().into()))
            .await
            .is_err()
        {
            break;
        }
    }

    let dropped = calls.dropped() + transcripts.dropped() + responses.dropped();
    debug!(dropped, "dashboard connection closed");
}
