//! In-process stand-in for the remote content API, for tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

#[derive(Default)]
pub struct FakeRemote {
  posts: tokio::sync::RwLock<BTreeMap<u64, Value>>,
  next_id: AtomicU64,
  reject_with: Mutex<Option<String>>,
  auth: tokio::sync::RwLock<Vec<String>>,
  requests: tokio::sync::RwLock<Vec<String>>,
}

impl FakeRemote {
  /// Make every following create/update fail with HTTP 422 and this message.
  pub fn reject_saves(&self, message: &str) {
    *self.reject_with.lock().unwrap() = Some(message.to_string());
  }

  pub fn accept_saves(&self) {
    *self.reject_with.lock().unwrap() = None;
  }

  pub async fn stored(&self, id: &str) -> Option<Value> {
    let id = id.parse::<u64>().ok()?;
    self.posts.read().await.get(&id).cloned()
  }

  pub async fn insert(&self, body: Value) -> String {
    let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
    self.posts.write().await.insert(id, body);
    id.to_string()
  }

  pub async fn auth_headers(&self) -> Vec<String> {
    self.auth.read().await.clone()
  }

  /// Every request seen, as `METHOD /raw/path?query`.
  pub async fn requests(&self) -> Vec<String> {
    self.requests.read().await.clone()
  }

  async fn record_auth(&self, headers: &HeaderMap) {
    let value = headers
      .get("authorization")
      .and_then(|v| v.to_str().ok())
      .unwrap_or_default()
      .to_string();
    self.auth.write().await.push(value);
  }

  fn rejection(&self) -> Option<(StatusCode, Json<Value>)> {
    let msg = self.reject_with.lock().unwrap().clone()?;
    Some((StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "message": msg }))))
  }
}

type Remote = State<Arc<FakeRemote>>;

async fn record_request(State(r): Remote, req: Request, next: Next) -> Response {
  let line = format!("{} {}", req.method(), req.uri());
  r.requests.write().await.push(line);
  next.run(req).await
}

async fn create(State(r): Remote, headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
  r.record_auth(&headers).await;
  if let Some(rej) = r.rejection() {
    return rej;
  }
  let id = r.insert(body).await;
  // Numeric ids inside a data envelope, as some backends answer.
  (StatusCode::CREATED, Json(json!({ "data": { "id": id.parse::<u64>().unwrap_or_default() } })))
}

async fn update(State(r): Remote, Path(id): Path<u64>, headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
  r.record_auth(&headers).await;
  if let Some(rej) = r.rejection() {
    return rej;
  }
  let mut posts = r.posts.write().await;
  if !posts.contains_key(&id) {
    return (StatusCode::NOT_FOUND, Json(json!({ "error": "post not found" })));
  }
  posts.insert(id, body);
  (StatusCode::OK, Json(json!({ "success": true })))
}

async fn fetch(State(r): Remote, Path(id): Path<u64>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
  r.record_auth(&headers).await;
  match r.posts.read().await.get(&id) {
    Some(body) => {
      let mut body = body.clone();
      body["_id"] = json!(id);
      (StatusCode::OK, Json(json!({ "data": body })))
    }
    None => (StatusCode::NOT_FOUND, Json(json!({ "error": "post not found" }))),
  }
}

async fn list(State(r): Remote) -> Json<Value> {
  let rows: Vec<Value> = r
    .posts
    .read()
    .await
    .iter()
    .map(|(id, p)| json!({ "id": id.to_string(), "title": p["title"], "slug": p["slug"], "status": p["status"] }))
    .collect();
  Json(json!({ "data": rows }))
}

async fn remove(State(r): Remote, Path(id): Path<u64>) -> StatusCode {
  match r.posts.write().await.remove(&id) {
    Some(_) => StatusCode::NO_CONTENT,
    None => StatusCode::NOT_FOUND,
  }
}

/// Serve a fresh fake on an ephemeral port. Returns its base URL.
pub async fn spawn_fake_remote() -> (String, Arc<FakeRemote>) {
  let remote = Arc::new(FakeRemote::default());
  let app = Router::new()
    .route("/posts", get(list).post(create))
    .route("/posts/:id", get(fetch).put(update).delete(remove))
    .layer(middleware::from_fn_with_state(remote.clone(), record_request))
    .with_state(remote.clone());

  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  tokio::spawn(async move {
    axum::serve(listener, app).await.unwrap();
  });
  (format!("http://{addr}"), remote)
}
