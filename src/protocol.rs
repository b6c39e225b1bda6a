//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and console independently.

use serde::{Deserialize, Serialize};

use crate::api::PostSummary;
use crate::document::DocumentOp;
use crate::post::PostMeta;
use crate::registry::VariantInfo;
use crate::state::EditorSession;

/// Messages the console can send over WebSocket. The console sends one `Op`
/// per field mutation.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    OpenSession {
        #[serde(rename = "postId", default)]
        post_id: Option<String>,
    },
    GetSession {
        #[serde(rename = "sessionId")]
        session_id: String,
    },
    Op {
        #[serde(rename = "sessionId")]
        session_id: String,
        op: DocumentOp,
    },
    UpdateMeta {
        #[serde(rename = "sessionId")]
        session_id: String,
        meta: PostMeta,
    },
    Save {
        #[serde(rename = "sessionId")]
        session_id: String,
    },
    Discard {
        #[serde(rename = "sessionId")]
        session_id: String,
    },
}

impl ClientWsMessage {
    /// Wire name of the message, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ClientWsMessage::Ping => "ping",
            ClientWsMessage::OpenSession { .. } => "open_session",
            ClientWsMessage::GetSession { .. } => "get_session",
            ClientWsMessage::Op { .. } => "op",
            ClientWsMessage::UpdateMeta { .. } => "update_meta",
            ClientWsMessage::Save { .. } => "save",
            ClientWsMessage::Discard { .. } => "discard",
        }
    }

    pub fn session_id(&self) -> Option<&str> {
        match self {
            ClientWsMessage::Ping | ClientWsMessage::OpenSession { .. } => None,
            ClientWsMessage::GetSession { session_id }
            | ClientWsMessage::Op { session_id, .. }
            | ClientWsMessage::UpdateMeta { session_id, .. }
            | ClientWsMessage::Save { session_id }
            | ClientWsMessage::Discard { session_id } => Some(session_id),
        }
    }
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Session {
        session: EditorSession,
    },
    Saved {
        #[serde(rename = "postId")]
        post_id: String,
        session: EditorSession,
    },
    /// The save did not go through; `session` still holds every edit.
    SaveFailed {
        message: String,
        session: Option<EditorSession>,
    },
    Discarded {
        #[serde(rename = "sessionId")]
        session_id: String,
    },
    Error {
        message: String,
    },
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Default, Deserialize)]
pub struct OpenSessionIn {
    #[serde(rename = "postId", default)]
    pub post_id: Option<String>,
}

#[derive(Serialize)]
pub struct SavedOut {
    #[serde(rename = "postId")]
    pub post_id: String,
    pub session: EditorSession,
}

#[derive(Serialize)]
pub struct BlocksOut {
    pub blocks: Vec<VariantInfo>,
}

#[derive(Serialize)]
pub struct PostsOut {
    pub posts: Vec<PostSummary>,
}

#[derive(Serialize)]
pub struct ErrorOut {
    pub error: String,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
