//! WebSocket Connection Handler
//!
//! `GET /signaling/{call_id}`: authenticates the upgrade, subscribes the
//! connection to the call and pumps frames both ways until either side
//! goes away.

use axum::{
    extract::{
        ws::{Message, Utf8Bytes, WebSocket},
        Path, Query, State, WebSocketUpgrade,
    },
    http::HeaderMap,
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;

use super::messages::{ClientFrame, ErrorFrame};
use crate::domain::Identity;
use crate::presentation::middleware::bearer_token;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Browsers cannot set headers on WebSocket requests, so the token may also
/// come as a query parameter.
#[derive(Debug, Deserialize)]
pub struct SignalingQuery {
    pub token: Option<String>,
}

/// WebSocket upgrade handler
pub async fn signaling_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(call_id): Path<String>,
    Query(query): Query<SignalingQuery>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let call_id = call_id.trim().to_string();
    if call_id.is_empty() {
        return Err(AppError::BadRequest("Call id is required".into()));
    }

    let token = bearer_token(&headers)
        .or(query.token)
        .ok_or_else(|| AppError::Unauthorized("Missing token".into()))?;
    let identity = state.tokens.validate(&token)?;

    Ok(ws
        .max_message_size(state.settings.signaling.max_message_size)
        .on_upgrade(move |socket| handle_socket(socket, state, call_id, identity)))
}

/// Handle one signaling connection
async fn handle_socket(socket: WebSocket, state: AppState, call_id: String, identity: Identity) {
    let user_id = identity.user_id;
    let mut subscription = state.relay.subscribe(&call_id, user_id);
    let subscriber = subscription.id;

    // Split socket for concurrent read/write
    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            // Frames from the relay, including our own echoes
            outbound = subscription.receiver.recv() => {
                match outbound {
                    Some(frame) => {
                        if sender.send(Message::Text(Utf8Bytes::from(&*frame))).await.is_err() {
                            break;
                        }
                    }
                    None => {
                        // Dropped by the relay for falling behind
                        let _ = sender.send(Message::Close(None)).await;
                        break;
                    }
                }
            }

            // Handle incoming messages
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match ClientFrame::parse(text.as_str()) {
                            Ok((kind, payload)) => {
                                state.relay.relay(&call_id, user_id, kind, &payload);
                            }
                            Err(reason) => {
                                tracing::debug!(call_id = %call_id, user_id = user_id, error = %reason, "Rejected signaling frame");
                                let reply = serde_json::to_string(&ErrorFrame::new(&reason))
                                    .unwrap_or_default();
                                if sender.send(Message::Text(reply.into())).await.is_err() {
                                    break;
                                }
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::debug!(call_id = %call_id, user_id = user_id, "Connection closed");
                        break;
                    }
                    Some(Err(e)) => {
                        tracing::debug!(call_id = %call_id, error = %e, "WebSocket error");
                        break;
                    }
                    // Pong is handled automatically by axum
                    _ => {}
                }
            }
        }
    }

    // Cleanup
    state.relay.unsubscribe(&call_id, subscriber);
}
