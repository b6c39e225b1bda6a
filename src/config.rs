//! Loading service configuration from TOML, with environment overrides.
//!
//! See `AppConfig` for the expected schema. Every section is optional:
//!
//! ```toml
//! [server]
//! port = 3000
//!
//! [api]
//! base_url = "https://content.example.com/api"
//! token = "..."
//! timeout_secs = 20
//!
//! [editor]
//! max_sessions = 256
//! ```

use serde::Deserialize;
use tracing::{error, info};

#[derive(Clone, Debug, Deserialize, Default, PartialEq)]
pub struct AppConfig {
  #[serde(default)]
  pub server: ServerCfg,
  #[serde(default)]
  pub api: ApiCfg,
  #[serde(default)]
  pub editor: EditorCfg,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerCfg {
  pub port: u16,
}
impl Default for ServerCfg {
  fn default() -> Self { Self { port: 3000 } }
}

/// Remote content API. The token is injected once into the API client and
/// never logged.
#[derive(Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiCfg {
  pub base_url: String,
  pub token: Option<String>,
  pub timeout_secs: u64,
}
impl Default for ApiCfg {
  fn default() -> Self {
    Self { base_url: "http://localhost:8080/api".into(), token: None, timeout_secs: 20 }
  }
}
impl std::fmt::Debug for ApiCfg {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ApiCfg")
      .field("base_url", &self.base_url)
      .field("token", &self.token.as_ref().map(|_| "<redacted>"))
      .field("timeout_secs", &self.timeout_secs)
      .finish()
  }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct EditorCfg {
  /// Upper bound on concurrently open editor sessions.
  pub max_sessions: usize,
}
impl Default for EditorCfg {
  fn default() -> Self { Self { max_sessions: 256 } }
}

impl AppConfig {
  /// File at POSTDESK_CONFIG_PATH (if any), then environment overrides.
  pub fn load() -> Self {
    let mut cfg = load_config_from_env().unwrap_or_default();
    cfg.apply_overrides(|key| std::env::var(key).ok());
    cfg
  }

  /// Overrides: PORT, POSTDESK_API_BASE_URL, POSTDESK_API_TOKEN, POSTDESK_API_TIMEOUT_SECS.
  /// Unparseable numbers are ignored.
  pub fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
    if let Some(port) = var("PORT").and_then(|p| p.parse::<u16>().ok()) {
      self.server.port = port;
    }
    if let Some(url) = var("POSTDESK_API_BASE_URL") {
      self.api.base_url = url;
    }
    if let Some(token) = var("POSTDESK_API_TOKEN").filter(|t| !t.is_empty()) {
      self.api.token = Some(token);
    }
    if let Some(secs) = var("POSTDESK_API_TIMEOUT_SECS").and_then(|s| s.parse::<u64>().ok()) {
      self.api.timeout_secs = secs;
    }
  }
}

/// Attempt to load `AppConfig` from POSTDESK_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_config_from_env() -> Option<AppConfig> {
  let path = std::env::var("POSTDESK_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<AppConfig>(&s) {
      Ok(cfg) => {
        info!(target: "postdesk_backend", %path, "Loaded config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "postdesk_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "postdesk_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
