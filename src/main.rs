//! Postdesk · Content Editor Backend
//!
//! - Block-based post documents (headings, galleries, tables, FAQs, ...)
//! - Editor sessions driven over HTTP or WebSocket, one message per edit
//! - Saves go to the remote content API, which stays the system of record
//! - Static admin console fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT                      : u16 (default 3000)
//!   POSTDESK_CONFIG_PATH      : path to TOML config
//!   POSTDESK_API_BASE_URL     : remote content API base URL
//!   POSTDESK_API_TOKEN        : bearer credential for the content API
//!   POSTDESK_API_TIMEOUT_SECS : request timeout (default 20)
//!   LOG_LEVEL                 : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT                : "pretty" (default) or "json"

mod telemetry;
mod util;
mod error;
mod config;
mod block;
mod registry;
mod block_editor;
mod document;
mod post;
mod api;
mod state;
mod protocol;
mod logic;
mod routes;
#[cfg(test)]
mod testing;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;

use crate::config::AppConfig;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let config = AppConfig::load();
  let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));

  // Shared state: editor sessions plus the API client holding the credential.
  let state = Arc::new(AppState::new(config)?);

  let app = build_router(state.clone());

  let listener = TcpListener::bind(addr).await?;
  info!(target: "postdesk_backend", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  info!(target: "postdesk_backend", "Server stopped; unsaved sessions discarded");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(target: "postdesk_backend", error = %e, "Failed to listen for shutdown signal");
    std::future::pending::<()>().await;
  }
}
