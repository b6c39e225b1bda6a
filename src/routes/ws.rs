//! WebSocket upgrade + message loop. Each client message is parsed as JSON and
//! forwarded to core logic. We reply with a single JSON message per request.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{info, error, instrument, debug};

use crate::protocol::{ClientWsMessage, ServerWsMessage};
use crate::logic::*;
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "postdesk_backend", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "postdesk_backend", "WebSocket connected");
  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        let reply = reply_to_text(&txt, &state).await;
        if let Err(e) = socket.send(Message::Text(reply)).await {
          error!(target: "postdesk_backend", error = %e, "WS send error");
          break;
        }
      }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "postdesk_backend", "WebSocket disconnected");
}

/// Parse, dispatch, serialize response.
pub(crate) async fn reply_to_text(txt: &str, state: &AppState) -> String {
  let reply_msg = match serde_json::from_str::<ClientWsMessage>(txt) {
    Ok(incoming) => {
      debug!(target: "postdesk_backend", kind = incoming.kind(), session = ?incoming.session_id(), "WS received");
      handle_client_ws(incoming, state).await
    }
    Err(e) => ServerWsMessage::Error { message: format!("Invalid message: {}", e) },
  };

  serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
    serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
  })
}

#[instrument(level = "info", skip_all, fields(kind = msg.kind()))]
async fn handle_client_ws(msg: ClientWsMessage, state: &AppState) -> ServerWsMessage {
  let session_reply = |res: Result<_, crate::error::SessionError>| match res {
    Ok(session) => ServerWsMessage::Session { session },
    Err(e) => ServerWsMessage::Error { message: e.user_message() },
  };

  match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::OpenSession { post_id } => session_reply(open_session(state, post_id.as_deref()).await),

    ClientWsMessage::GetSession { session_id } => session_reply(get_session(state, &session_id).await),

    ClientWsMessage::Op { session_id, op } => session_reply(apply_op(state, &session_id, &op).await),

    ClientWsMessage::UpdateMeta { session_id, meta } => session_reply(patch_meta(state, &session_id, &meta).await),

    ClientWsMessage::Save { session_id } => match save_session(state, &session_id).await {
      Ok(session) => {
        tracing::info!(target: "editor", session = %session_id, post_id = ?session.post_id, "WS save completed");
        ServerWsMessage::Saved { post_id: session.post_id.clone().unwrap_or_default(), session }
      }
      Err(e) => ServerWsMessage::SaveFailed {
        message: e.user_message(),
        session: state.get_session(&session_id).await.ok(),
      },
    },

    ClientWsMessage::Discard { session_id } => match discard_session(state, &session_id).await {
      Ok(()) => ServerWsMessage::Discarded { session_id },
      Err(e) => ServerWsMessage::Error { message: e.user_message() },
    },
  }
}
