//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - Opening editor sessions (new post, or an existing one fetched remotely)
//!   - Applying document operations and metadata patches
//!   - Saving to the remote API (state is kept on failure so the user can retry)
//!   - Discarding sessions and passing listing/deletion through to the API

use tracing::{debug, error, info, instrument};

use crate::api::PostSummary;
use crate::document::DocumentOp;
use crate::error::SessionError;
use crate::post::{Post, PostMeta};
use crate::state::{AppState, EditorSession};

/// Open a session on a fresh draft, or on an existing remote post.
#[instrument(level = "info", skip(state), fields(post_id = ?post_id))]
pub async fn open_session(state: &AppState, post_id: Option<&str>) -> Result<EditorSession, SessionError> {
  let session = match post_id {
    Some(id) => {
      let stored = state.api.get_post(id).await.map_err(|e| {
        error!(target: "editor", %id, error = %e, "Could not load post for editing");
        e
      })?;
      EditorSession::new(Some(stored.id), stored.post)
    }
    None => EditorSession::new(None, Post::default()),
  };
  let session = state.insert_session(session).await?;
  info!(target: "editor", session = %session.id, post_id = ?session.post_id, blocks = session.post.content.len(), "Editor session opened");
  Ok(session)
}

#[instrument(level = "info", skip(state), fields(%session_id))]
pub async fn get_session(state: &AppState, session_id: &str) -> Result<EditorSession, SessionError> {
  state.get_session(session_id).await
}

/// Apply one document operation. The stored document is replaced only if the
/// operation succeeds.
#[instrument(level = "info", skip(state, op), fields(%session_id, op = op.name()))]
pub async fn apply_op(state: &AppState, session_id: &str, op: &DocumentOp) -> Result<EditorSession, SessionError> {
  let res = state
    .update_session(session_id, |s| {
      let content = op.apply(&s.post.content)?;
      let mut next = s.clone();
      next.post.content = content;
      next.dirty = true;
      Ok(next)
    })
    .await;
  match &res {
    Ok(s) => debug!(target: "editor", session = %session_id, op = op.name(), blocks = s.post.content.len(), "Document op applied"),
    Err(e) => info!(target: "editor", session = %session_id, op = op.name(), error = %e, "Document op rejected"),
  }
  res
}

#[instrument(level = "info", skip(state, meta), fields(%session_id))]
pub async fn patch_meta(state: &AppState, session_id: &str, meta: &PostMeta) -> Result<EditorSession, SessionError> {
  state
    .update_session(session_id, |s| {
      let mut next = s.clone();
      if !meta.is_empty() {
        next.post = meta.apply_to(&s.post);
        next.dirty = true;
      }
      Ok(next)
    })
    .await
}

/// Send the session's post to the remote API: create on first save, update
/// afterwards. The session map is not locked across the network call, so edits
/// that land while the save is in flight keep the session dirty. Saves of one
/// session are serialized by its save gate; a second save waits and then sees
/// the id the first one got.
#[instrument(level = "info", skip(state), fields(%session_id))]
pub async fn save_session(state: &AppState, session_id: &str) -> Result<EditorSession, SessionError> {
  let gate = state.save_gate(session_id).await?;
  let _saving = gate.lock().await;
  let snapshot = state.get_session(session_id).await?;
  let outgoing = snapshot.post.prepared_for_save();

  match state.api.save(snapshot.post_id.as_deref(), &outgoing).await {
    Ok(post_id) => {
      let saved = state
        .update_session(session_id, |s| {
          let mut next = s.clone();
          if s.post == snapshot.post {
            next.post = outgoing.clone();
            next.dirty = false;
          }
          next.post_id = Some(post_id.clone());
          next.last_error = None;
          Ok(next)
        })
        .await?;
      info!(target: "editor", session = %session_id, %post_id, status = ?outgoing.status, "Post saved");
      Ok(saved)
    }
    Err(e) => {
      let err = SessionError::from(e);
      let message = err.user_message();
      error!(target: "editor", session = %session_id, error = %err, "Save failed; edits kept for retry");
      state
        .update_session(session_id, |s| {
          let mut next = s.clone();
          next.last_error = Some(message.clone());
          Ok(next)
        })
        .await?;
      Err(err)
    }
  }
}

/// Drop a session and its unsaved edits.
#[instrument(level = "info", skip(state), fields(%session_id))]
pub async fn discard_session(state: &AppState, session_id: &str) -> Result<(), SessionError> {
  let s = state.remove_session(session_id).await?;
  info!(target: "editor", session = %session_id, dirty = s.dirty, "Editor session discarded");
  Ok(())
}

#[instrument(level = "info", skip(state))]
pub async fn list_posts(state: &AppState) -> Result<Vec<PostSummary>, SessionError> {
  Ok(state.api.list_posts().await?)
}

#[instrument(level = "info", skip(state), fields(%post_id))]
pub async fn delete_post(state: &AppState, post_id: &str) -> Result<(), SessionError> {
  state.api.delete_post(post_id).await?;
  info!(target: "editor", %post_id, "Post deleted");
  Ok(())
}
