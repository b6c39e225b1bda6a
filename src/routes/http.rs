//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs ids and sizes, never content.

use std::sync::Arc;
use axum::{
  extract::{Path, State},
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use tracing::{info, instrument};

use crate::document::DocumentOp;
use crate::error::{ApiError, SessionError};
use crate::logic::*;
use crate::post::PostMeta;
use crate::protocol::*;
use crate::registry;
use crate::state::{AppState, EditorSession};

impl IntoResponse for SessionError {
  fn into_response(self) -> Response {
    let status = match &self {
      SessionError::UnknownSession(_) => StatusCode::NOT_FOUND,
      SessionError::SessionLimit(_) => StatusCode::TOO_MANY_REQUESTS,
      SessionError::Edit(_) => StatusCode::UNPROCESSABLE_ENTITY,
      SessionError::Api(ApiError::Status { status: 404, .. }) => StatusCode::NOT_FOUND,
      SessionError::Api(ApiError::InvalidId(_)) => StatusCode::BAD_REQUEST,
      SessionError::Api(_) => StatusCode::BAD_GATEWAY,
    };
    (status, Json(ErrorOut { error: self.user_message() })).into_response()
  }
}

type Session = Result<Json<EditorSession>, SessionError>;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info")]
pub async fn http_get_blocks() -> impl IntoResponse {
  Json(BlocksOut { blocks: registry::all() })
}

#[instrument(level = "info", fields(%tag))]
pub async fn http_get_block(Path(tag): Path<String>) -> impl IntoResponse {
  Json(registry::lookup(&tag))
}

#[instrument(level = "info", skip(state))]
pub async fn http_list_posts(State(state): State<Arc<AppState>>) -> Result<Json<PostsOut>, SessionError> {
  let posts = list_posts(&state).await?;
  info!(target: "editor", count = posts.len(), "HTTP posts listed");
  Ok(Json(PostsOut { posts }))
}

#[instrument(level = "info", skip(state), fields(%post_id))]
pub async fn http_delete_post(
  State(state): State<Arc<AppState>>,
  Path(post_id): Path<String>,
) -> Result<StatusCode, SessionError> {
  delete_post(&state, &post_id).await?;
  Ok(StatusCode::NO_CONTENT)
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_open_session(
  State(state): State<Arc<AppState>>,
  body: Option<Json<OpenSessionIn>>,
) -> Result<(StatusCode, Json<EditorSession>), SessionError> {
  let body = body.map(|Json(b)| b).unwrap_or_default();
  let session = open_session(&state, body.post_id.as_deref()).await?;
  Ok((StatusCode::CREATED, Json(session)))
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_get_session(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Session {
  Ok(Json(get_session(&state, &id).await?))
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_discard_session(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<StatusCode, SessionError> {
  discard_session(&state, &id).await?;
  Ok(StatusCode::NO_CONTENT)
}

#[instrument(level = "info", skip(state, op), fields(%id, op = op.name()))]
pub async fn http_post_op(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  Json(op): Json<DocumentOp>,
) -> Session {
  Ok(Json(apply_op(&state, &id, &op).await?))
}

#[instrument(level = "info", skip(state, meta), fields(%id))]
pub async fn http_patch_meta(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  Json(meta): Json<PostMeta>,
) -> Session {
  Ok(Json(patch_meta(&state, &id, &meta).await?))
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_save(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<Json<SavedOut>, SessionError> {
  let session = save_session(&state, &id).await?;
  let post_id = session.post_id.clone().unwrap_or_default();
  info!(target: "editor", %id, %post_id, "HTTP save completed");
  Ok(Json(SavedOut { post_id, session }))
}
