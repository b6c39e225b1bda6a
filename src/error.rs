//! Error types for block edits, the remote API client, and editor sessions.

use thiserror::Error;

use crate::block::BlockType;

/// Failures of a single block or document edit. The input is never modified.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EditError {
  #[error("block '{block_type}' has no field '{field}'")]
  UnknownField { block_type: BlockType, field: String },

  #[error("invalid value for '{field}': {reason}")]
  InvalidValue { field: String, reason: String },

  #[error("index {index} out of range (len {len})")]
  IndexOutOfRange { index: usize, len: usize },

  #[error("operation '{op}' is not supported by block '{block_type}'")]
  Unsupported { block_type: BlockType, op: &'static str },

  #[error("malformed block payload: {0}")]
  MalformedPayload(String),
}

impl EditError {
  pub fn invalid_value(field: impl Into<String>, reason: impl ToString) -> Self {
    Self::InvalidValue { field: field.into(), reason: reason.to_string() }
  }

  pub fn out_of_range(index: usize, len: usize) -> Self {
    Self::IndexOutOfRange { index, len }
  }
}

/// Remote API failures.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("request failed: {0}")]
  Transport(#[from] reqwest::Error),

  #[error("remote API returned HTTP {status}: {message}")]
  Status { status: u16, message: String },

  #[error("could not decode remote API response: {0}")]
  Decode(String),

  #[error("remote API response did not contain a post id")]
  MissingId,

  #[error("invalid post id: {0:?}")]
  InvalidId(String),

  #[error("invalid remote API base URL: {0}")]
  InvalidBaseUrl(String),
}

/// Failures surfaced by the editor session layer to HTTP and WebSocket callers.
#[derive(Debug, Error)]
pub enum SessionError {
  #[error("unknown editor session: {0}")]
  UnknownSession(String),

  #[error("too many open editor sessions (limit {0})")]
  SessionLimit(usize),

  #[error(transparent)]
  Edit(#[from] EditError),

  #[error(transparent)]
  Api(#[from] ApiError),
}

impl SessionError {
  /// Text shown to the person editing. Transport details stay in the logs.
  pub fn user_message(&self) -> String {
    match self {
      SessionError::UnknownSession(_) => "This editor session has expired. Reopen the post to continue.".into(),
      SessionError::SessionLimit(_) => "Too many editors are open. Close one and try again.".into(),
      SessionError::Edit(e) => e.to_string(),
      SessionError::Api(ApiError::Status { message, .. }) if !message.is_empty() => {
        format!("Save failed: {message}")
      }
      SessionError::Api(ApiError::InvalidId(_)) => "That post id is not valid.".into(),
      SessionError::Api(ApiError::Transport(_)) => {
        "Save failed: the content server could not be reached. Your changes are kept; try again.".into()
      }
      SessionError::Api(_) => "Save failed: the content server returned an unexpected response.".into(),
    }
  }
}
