//! Router assembly: HTTP endpoints, WebSocket upgrade, static files, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;
pub mod ws;

/// Build the application router with:
/// - WebSocket at `/ws` (one message per edit)
/// - REST-ish API under `/api/v1/...`
/// - Admin console bundle from `./static` with index fallback
/// - CORS (allow any origin/method/headers) – adjust for production if needed
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    let static_service = ServeDir::new("./static")
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new("./static/index.html"));

    Router::new()
        // WebSocket
        .route("/ws", get(ws::ws_upgrade))
        // HTTP API
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/blocks", get(http::http_get_blocks))
        .route("/api/v1/blocks/:tag", get(http::http_get_block))
        .route("/api/v1/posts", get(http::http_list_posts))
        .route("/api/v1/posts/:post_id", delete(http::http_delete_post))
        .route("/api/v1/sessions", post(http::http_open_session))
        .route(
            "/api/v1/sessions/:id",
            get(http::http_get_session).delete(http::http_discard_session),
        )
        .route("/api/v1/sessions/:id/ops", post(http::http_post_op))
        .route("/api/v1/sessions/:id/meta", patch(http::http_patch_meta))
        .route("/api/v1/sessions/:id/save", post(http::http_save))
        // State + CORS + HTTP tracing
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Console fallback
        .fallback_service(static_service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_state;
    use crate::testing::spawn_fake_remote;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let req = Request::builder().method(method).uri(uri).header("content-type", "application/json");
        let req = match body {
            Some(v) => req.body(Body::from(v.to_string())).unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, json)
    }

    #[tokio::test]
    async fn http_editing_flow() {
        let (base, remote) = spawn_fake_remote().await;
        let app = build_router(Arc::new(test_state(&base, 8)));

        let (status, session) = call(&app, Method::POST, "/api/v1/sessions", Some(json!({}))).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = session["id"].as_str().unwrap().to_string();

        let ops = format!("/api/v1/sessions/{id}/ops");
        let (status, _) = call(&app, Method::POST, &ops, Some(json!({"op": "insert_default", "blockType": "table"}))).await;
        assert_eq!(status, StatusCode::OK);
        let (_, s) = call(&app, Method::POST, &ops, Some(json!({"op": "edit_block", "index": 0, "edit": {"op": "add_row"}}))).await;
        assert_eq!(s["post"]["content"][0]["data"]["content"], json!([["", ""], ["", ""], ["", ""]]));

        let (status, err) = call(&app, Method::POST, &ops, Some(json!({"op": "move_down", "index": 4}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err["error"], json!("index 4 out of range (len 1)"));

        let meta = format!("/api/v1/sessions/{id}/meta");
        let (status, s) = call(&app, Method::PATCH, &meta, Some(json!({"title": "Tables 101", "keywords": "tables, grids"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(s["post"]["seo"]["keywords"], json!(["tables", "grids"]));

        let (status, saved) = call(&app, Method::POST, &format!("/api/v1/sessions/{id}/save"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(saved["postId"], json!("1"));
        assert_eq!(remote.stored("1").await.unwrap()["slug"], json!("tables-101"));

        let (status, posts) = call(&app, Method::GET, "/api/v1/posts", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(posts["posts"][0]["title"], json!("Tables 101"));

        let (status, _) = call(&app, Method::DELETE, &format!("/api/v1/sessions/{id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = call(&app, Method::GET, &format!("/api/v1/sessions/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn remote_failures_map_to_gateway_errors() {
        let (base, remote) = spawn_fake_remote().await;
        let app = build_router(Arc::new(test_state(&base, 8)));
        let (_, session) = call(&app, Method::POST, "/api/v1/sessions", None).await;
        let id = session["id"].as_str().unwrap().to_string();

        remote.reject_saves("category is required");
        let (status, err) = call(&app, Method::POST, &format!("/api/v1/sessions/{id}/save"), None).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(err["error"], json!("Save failed: category is required"));

        let (status, s) = call(&app, Method::GET, &format!("/api/v1/sessions/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(s["lastError"], json!("Save failed: category is required"));

        let (status, _) = call(&app, Method::POST, "/api/v1/sessions", Some(json!({"postId": "77"}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let before = remote.requests().await.len();
        let (status, err) = call(&app, Method::DELETE, "/api/v1/posts/%2E%2E", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["error"], json!("That post id is not valid."));
        assert_eq!(remote.requests().await.len(), before);
    }

    #[tokio::test]
    async fn registry_is_served() {
        let app = build_router(Arc::new(test_state("http://127.0.0.1:9", 8)));
        let (status, body) = call(&app, Method::GET, "/api/v1/blocks", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["blocks"].as_array().unwrap().len(), 14);
        assert_eq!(body["blocks"][0]["type"], json!("heading"));
        let (_, unknown) = call(&app, Method::GET, "/api/v1/blocks/carousel", None).await;
        assert_eq!(unknown["type"], Value::Null);
        assert_eq!(unknown["label"], json!("Unsupported block"));
        let (_, health) = call(&app, Method::GET, "/api/v1/health", None).await;
        assert_eq!(health, json!({"ok": true}));
    }
}
