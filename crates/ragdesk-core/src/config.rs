//! Layered configuration: defaults, then an optional TOML file, then `RAGDESK_*` env vars.
//!
//! | Key | Env | Default |
//! |-----|-----|---------|
//! | backend_url | RAGDESK_BACKEND_URL | http://localhost:5000 |
//! | bind_addr | RAGDESK_BIND_ADDR | 127.0.0.1:3000 |
//! | gateway_url | RAGDESK_GATEWAY_URL | http://127.0.0.1:3000 |
//! | history_path | RAGDESK_HISTORY_PATH | ./data/ragdesk_history |

use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:5000";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_GATEWAY_URL: &str = "http://127.0.0.1:3000";
pub const DEFAULT_HISTORY_PATH: &str = "./data/ragdesk_history";
const DEFAULT_CONFIG_PATH: &str = "config/ragdesk.toml";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RagdeskConfig {
    /// Base URL of the agentic RAG backend the gateway forwards to.
    pub backend_url: String,
    /// Socket address the gateway listens on.
    pub bind_addr: String,
    /// Base URL the console uses to reach the gateway.
    pub gateway_url: String,
    /// Sled directory holding the history slot.
    pub history_path: String,
}

impl Default for RagdeskConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            gateway_url: DEFAULT_GATEWAY_URL.to_string(),
            history_path: DEFAULT_HISTORY_PATH.to_string(),
        }
    }
}

impl RagdeskConfig {
    /// Load config. Precedence: env `RAGDESK_*` > file at `RAGDESK_CONFIG` (or `config/ragdesk.toml`) > defaults.
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("RAGDESK_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(Path::new(&config_path))
    }

    /// Same as [`RagdeskConfig::load`] with an explicit file path. A missing file is skipped.
    pub fn load_from(path: &Path) -> Result<Self, config::ConfigError> {
        Self::load_layered(path, None)
    }

    /// Layers defaults, `path` and `RAGDESK_*` variables. With `env` set, variables come
    /// from that map instead of the process environment.
    pub fn load_layered(
        path: &Path,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .set_default("backend_url", DEFAULT_BACKEND_URL)?
            .set_default("bind_addr", DEFAULT_BIND_ADDR)?
            .set_default("gateway_url", DEFAULT_GATEWAY_URL)?
            .set_default("history_path", DEFAULT_HISTORY_PATH)?;

        let builder = if path.exists() {
            builder.add_source(config::File::from(path))
        } else {
            builder
        };

        let built = builder
            .add_source(
                config::Environment::with_prefix("RAGDESK")
                    .prefix_separator("_")
                    .separator("__")
                    .source(env),
            )
            .build()?;

        let mut cfg: RagdeskConfig = built.try_deserialize()?;
        cfg.backend_url = normalize_base_url(&cfg.backend_url);
        cfg.gateway_url = normalize_base_url(&cfg.gateway_url);
        Ok(cfg)
    }
}

/// Trims whitespace and trailing slashes so paths can be appended with `format!`.
pub fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
