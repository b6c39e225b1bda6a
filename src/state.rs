//! Application state: in-memory editor sessions and the remote API client.
//!
//! Each session is one authoring instance of one post. It is owned by the
//! console tab that opened it until saved; after a save the remote API is the
//! system of record. Sessions never share documents, so a single map lock is
//! enough.

use std::{collections::HashMap, sync::Arc};

use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::api::ApiClient;
use crate::config::AppConfig;
use crate::error::{ApiError, SessionError};
use crate::post::Post;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorSession {
    pub id: String,
    /// Remote id once the post exists on the server.
    pub post_id: Option<String>,
    pub post: Post,
    /// Set by any edit, cleared by a successful save.
    pub dirty: bool,
    /// Message from the last failed save, kept until the next attempt.
    pub last_error: Option<String>,
}

impl EditorSession {
    pub fn new(post_id: Option<String>, post: Post) -> Self {
        Self { id: Uuid::new_v4().to_string(), post_id, post, dirty: false, last_error: None }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<RwLock<HashMap<String, EditorSession>>>,
    /// One gate per session, held for the whole of a save so two saves of the
    /// same session never race to create the post.
    save_gates: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
    pub api: ApiClient,
    pub config: AppConfig,
}

impl AppState {
    /// Build state from resolved config: construct the API client with its credential.
    #[instrument(level = "info", skip_all)]
    pub fn new(config: AppConfig) -> Result<Self, ApiError> {
        let api = ApiClient::from_config(&config.api)?;
        if api.has_credential() {
            info!(target: "postdesk_backend", base_url = %api.base_url, "Remote API client ready (authenticated)");
        } else {
            warn!(target: "postdesk_backend", base_url = %api.base_url, "Remote API client ready without credential; saves may be rejected");
        }
        Ok(Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            save_gates: Arc::new(Mutex::new(HashMap::new())),
            api,
            config,
        })
    }

    /// Register a session, respecting the configured limit.
    #[instrument(level = "debug", skip(self, session), fields(id = %session.id))]
    pub async fn insert_session(&self, session: EditorSession) -> Result<EditorSession, SessionError> {
        let mut sessions = self.sessions.write().await;
        let limit = self.config.editor.max_sessions;
        if sessions.len() >= limit {
            warn!(target: "editor", open = sessions.len(), limit, "Session limit reached");
            return Err(SessionError::SessionLimit(limit));
        }
        sessions.insert(session.id.clone(), session.clone());
        Ok(session)
    }

    #[instrument(level = "debug", skip(self), fields(%id))]
    pub async fn get_session(&self, id: &str) -> Result<EditorSession, SessionError> {
        self.sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| SessionError::UnknownSession(id.to_string()))
    }

    /// Run `f` against a session under the write lock. `f` returns the
    /// replacement session; on error the stored session is left unchanged.
    pub async fn update_session<F>(&self, id: &str, f: F) -> Result<EditorSession, SessionError>
    where
        F: FnOnce(&EditorSession) -> Result<EditorSession, SessionError>,
    {
        let mut sessions = self.sessions.write().await;
        let current = sessions.get(id).ok_or_else(|| SessionError::UnknownSession(id.to_string()))?;
        let next = f(current)?;
        sessions.insert(id.to_string(), next.clone());
        Ok(next)
    }

    #[instrument(level = "debug", skip(self), fields(%id))]
    pub async fn remove_session(&self, id: &str) -> Result<EditorSession, SessionError> {
        let removed = self
            .sessions
            .write()
            .await
            .remove(id)
            .ok_or_else(|| SessionError::UnknownSession(id.to_string()))?;
        self.save_gates.lock().await.remove(id);
        Ok(removed)
    }

    /// The save gate of a live session. Lock it for the duration of a save.
    pub async fn save_gate(&self, id: &str) -> Result<Arc<Mutex<()>>, SessionError> {
        // Hold the session map so a concurrent remove cannot leave a stale gate.
        let sessions = self.sessions.read().await;
        if !sessions.contains_key(id) {
            return Err(SessionError::UnknownSession(id.to_string()));
        }
        let mut gates = self.save_gates.lock().await;
        Ok(gates.entry(id.to_string()).or_default().clone())
    }
}

#[cfg(test)]
pub(crate) fn test_state(base_url: &str, max_sessions: usize) -> AppState {
    let mut config = AppConfig::default();
    config.api.base_url = base_url.to_string();
    config.api.token = Some("test-token".into());
    config.api.timeout_secs = 5;
    config.editor.max_sessions = max_sessions;
    AppState::new(config).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sessions_are_bounded() {
        let state = test_state("http://127.0.0.1:9", 1);
        state.insert_session(EditorSession::new(None, Post::default())).await.unwrap();
        let err = state.insert_session(EditorSession::new(None, Post::default())).await.unwrap_err();
        assert!(matches!(err, SessionError::SessionLimit(1)));
    }

    #[tokio::test]
    async fn failed_update_keeps_the_stored_session() {
        let state = test_state("http://127.0.0.1:9", 4);
        let s = state.insert_session(EditorSession::new(None, Post::default())).await.unwrap();
        let res = state
            .update_session(&s.id, |_| Err(SessionError::UnknownSession("boom".into())))
            .await;
        assert!(res.is_err());
        assert_eq!(state.get_session(&s.id).await.unwrap(), s);
    }

    #[tokio::test]
    async fn removed_sessions_are_gone() {
        let state = test_state("http://127.0.0.1:9", 4);
        let s = state.insert_session(EditorSession::new(None, Post::default())).await.unwrap();
        state.save_gate(&s.id).await.unwrap();
        state.remove_session(&s.id).await.unwrap();
        assert!(matches!(state.get_session(&s.id).await, Err(SessionError::UnknownSession(_))));
        assert!(matches!(state.save_gate(&s.id).await, Err(SessionError::UnknownSession(_))));
        assert!(state.save_gates.lock().await.is_empty());
    }

    #[tokio::test]
    async fn save_gate_is_shared_per_session() {
        let state = test_state("http://127.0.0.1:9", 4);
        let a = state.insert_session(EditorSession::new(None, Post::default())).await.unwrap();
        let b = state.insert_session(EditorSession::new(None, Post::default())).await.unwrap();
        let gate = state.save_gate(&a.id).await.unwrap();
        let _held = gate.lock().await;
        assert!(state.save_gate(&a.id).await.unwrap().try_lock().is_err());
        assert!(state.save_gate(&b.id).await.unwrap().try_lock().is_ok());
    }
}
