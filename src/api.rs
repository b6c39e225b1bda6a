//! Client for the remote content API (the system of record for posts).
//!
//! Calls are instrumented and log paths, status codes, latencies and payload
//! sizes (not contents). The credential is passed in once at construction and
//! never logged.
//!
//! Responses are accepted either bare or wrapped in `{ "data": ... }`, and ids
//! may be strings or numbers.

use std::time::{Duration, Instant};

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::{Method, RequestBuilder, Response, Url};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{error, info, instrument};

use crate::config::ApiCfg;
use crate::error::ApiError;
use crate::post::{Post, PostStatus, StoredPost};
use crate::util::trunc_for_log;

/// Bearer token for the content API.
#[derive(Clone)]
pub struct ApiCredential(String);

impl ApiCredential {
  pub fn bearer(token: impl Into<String>) -> Self {
    Self(token.into())
  }
}

impl std::fmt::Debug for ApiCredential {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str("ApiCredential(<redacted>)")
  }
}

/// Row of the post listing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
  #[serde(alias = "_id", deserialize_with = "id_from_value")]
  pub id: String,
  #[serde(default)]
  pub title: String,
  #[serde(default)]
  pub slug: String,
  #[serde(default)]
  pub status: PostStatus,
}

#[derive(Clone, Debug)]
pub struct ApiClient {
  client: reqwest::Client,
  pub base_url: String,
  base: Url,
  credential: Option<ApiCredential>,
}

impl ApiClient {
  pub fn new(base_url: impl Into<String>, credential: Option<ApiCredential>, timeout: Duration) -> Result<Self, ApiError> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    let base_url = base_url.into().trim_end_matches('/').to_string();
    let base = Url::parse(&base_url).map_err(|e| ApiError::InvalidBaseUrl(format!("{base_url}: {e}")))?;
    if base.cannot_be_a_base() {
      return Err(ApiError::InvalidBaseUrl(base_url));
    }
    Ok(Self { client, base_url, base, credential })
  }

  pub fn from_config(cfg: &ApiCfg) -> Result<Self, ApiError> {
    let credential = cfg.token.clone().map(ApiCredential::bearer);
    Self::new(cfg.base_url.clone(), credential, Duration::from_secs(cfg.timeout_secs))
  }

  pub fn has_credential(&self) -> bool {
    self.credential.is_some()
  }

  /// Base URL with `segments` appended, each percent-encoded as a single
  /// path segment.
  fn url_for(&self, segments: &[&str]) -> Url {
    let mut url = self.base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
      path.pop_if_empty().extend(segments);
    }
    url
  }

  fn request(&self, method: Method, url: Url) -> RequestBuilder {
    let mut req = self
      .client
      .request(method, url)
      .header(USER_AGENT, "postdesk-backend/0.1")
      .header(CONTENT_TYPE, "application/json");
    if let Some(ApiCredential(token)) = &self.credential {
      req = req.header(AUTHORIZATION, format!("Bearer {}", token));
    }
    req
  }

  /// Create (`POST /posts`) when `id` is `None`, otherwise update
  /// (`PUT /posts/{id}`). Returns the post's id.
  #[instrument(level = "info", skip(self, post), fields(id = ?id, blocks = post.content.len()))]
  pub async fn save(&self, id: Option<&str>, post: &Post) -> Result<String, ApiError> {
    let (method, url) = match id {
      Some(id) => (Method::PUT, self.post_url(id)?),
      None => (Method::POST, self.url_for(&["posts"])),
    };
    let start = Instant::now();
    let res = self.request(method.clone(), url.clone()).json(post).send().await;
    let body = self.read_json(res, &method, url.path(), start).await?;

    match (saved_id(&body), id) {
      (Some(new_id), _) => Ok(new_id),
      (None, Some(existing)) => Ok(existing.to_string()),
      (None, None) => {
        error!(target: "remote_api", body = %trunc_for_log(&body.to_string(), 200), "Create response had no id");
        Err(ApiError::MissingId)
      }
    }
  }

  #[instrument(level = "info", skip(self), fields(%id))]
  pub async fn get_post(&self, id: &str) -> Result<StoredPost, ApiError> {
    let url = self.post_url(id)?;
    let start = Instant::now();
    let res = self.request(Method::GET, url.clone()).send().await;
    let body = self.read_json(res, &Method::GET, url.path(), start).await?;
    let mut stored: StoredPost = serde_json::from_value(unwrap_data(body)).map_err(|e| ApiError::Decode(e.to_string()))?;
    if stored.id.is_empty() {
      stored.id = id.to_string();
    }
    Ok(stored)
  }

  #[instrument(level = "info", skip(self))]
  pub async fn list_posts(&self) -> Result<Vec<PostSummary>, ApiError> {
    let url = self.url_for(&["posts"]);
    let start = Instant::now();
    let res = self.request(Method::GET, url.clone()).send().await;
    let body = self.read_json(res, &Method::GET, url.path(), start).await?;
    let rows = match unwrap_data(body) {
      Value::Object(mut map) => map.remove("posts").unwrap_or(Value::Array(vec![])),
      other => other,
    };
    serde_json::from_value(rows).map_err(|e| ApiError::Decode(e.to_string()))
  }

  #[instrument(level = "info", skip(self), fields(%id))]
  pub async fn delete_post(&self, id: &str) -> Result<(), ApiError> {
    let url = self.post_url(id)?;
    let start = Instant::now();
    let res = self.request(Method::DELETE, url.clone()).send().await;
    self.read_json(res, &Method::DELETE, url.path(), start).await.map(|_| ())
  }

  /// `posts/{id}` under the base URL. Ids come from callers, so they are
  /// encoded as one segment and the dot segments the URL parser would
  /// swallow are refused.
  fn post_url(&self, id: &str) -> Result<Url, ApiError> {
    if matches!(id.trim(), "" | "." | "..") {
      return Err(ApiError::InvalidId(id.to_string()));
    }
    Ok(self.url_for(&["posts", id]))
  }

  /// Check status, log the call, and parse the body. Empty bodies read as `null`.
  async fn read_json(
    &self,
    res: Result<Response, reqwest::Error>,
    method: &Method,
    path: &str,
    start: Instant,
  ) -> Result<Value, ApiError> {
    let res = res.map_err(|e| {
      error!(target: "remote_api", %method, %path, elapsed = ?start.elapsed(), error = %e, "Request failed");
      ApiError::Transport(e)
    })?;
    let status = res.status();
    let text = res.text().await?;
    info!(target: "remote_api", %method, %path, status = status.as_u16(), elapsed = ?start.elapsed(), body_len = text.len(), "Remote API call");

    if !status.is_success() {
      let message = extract_error(&text).unwrap_or_else(|| trunc_for_log(&text, 200));
      return Err(ApiError::Status { status: status.as_u16(), message });
    }
    if text.trim().is_empty() {
      return Ok(Value::Null);
    }
    serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
  }
}

/// Strip a `{ "data": ... }` envelope if present.
fn unwrap_data(body: Value) -> Value {
  match body {
    Value::Object(mut map) if map.contains_key("data") && !map.contains_key("id") && !map.contains_key("_id") => {
      map.remove("data").unwrap_or(Value::Null)
    }
    other => other,
  }
}

fn saved_id(body: &Value) -> Option<String> {
  let candidates = [body, &body["data"], &body["post"]];
  candidates
    .iter()
    .flat_map(|v| [&v["id"], &v["_id"]])
    .find_map(|v| id_string(v))
}

fn id_string(v: &Value) -> Option<String> {
  match v {
    Value::String(s) if !s.is_empty() => Some(s.clone()),
    Value::Number(n) => Some(n.to_string()),
    _ => None,
  }
}

/// Serde helper: accept an id given as a string or a number.
pub fn id_from_value<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
  let v = Value::deserialize(deserializer)?;
  id_string(&v).ok_or_else(|| serde::de::Error::custom(format!("expected string or numeric id, got {v}")))
}

/// Try to extract a clean error message from an error body.
fn extract_error(body: &str) -> Option<String> {
  let v: Value = serde_json::from_str(body).ok()?;
  let message = [&v["message"], &v["error"]["message"], &v["error"]]
    .into_iter()
    .find_map(|m| m.as_str().map(str::to_string));
  message
}
