//! CLI surface and the three-layer configuration merge: built-in defaults
//! (`relay_proto::ServerConfig::default`) → optional JSON config file →
//! CLI flags, highest precedence last.

use std::path::PathBuf;

use clap::Parser;

use relay_proto::config::ServerConfig;
use relay_proto::{DEFAULT_HEALTH_CHECK_INTERVAL_SECS, DEFAULT_HOST, DEFAULT_LOG_LEVEL, DEFAULT_OCR_TIMEOUT_SECS, DEFAULT_PORT, DEFAULT_ROOM, DEFAULT_SERVICE_TYPE};

#[derive(Debug, Parser)]
#[command(name = "relay-server", about = "Room-scoped Socket.IO relay for the screen-capture/OCR bridge")]
pub struct CliArgs {
    /// Bind address.
    #[arg(long)]
    pub host: Option<String>,

    /// Listen port.
    #[arg(long)]
    pub port: Option<u16>,

    /// Default room every peer auto-joins.
    #[arg(long)]
    pub room: Option<String>,

    /// Path to a server_config.json-shaped file (§6); merged under CLI flags.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Client-count heartbeat cadence, in seconds.
    #[arg(long)]
    pub health_check_interval_secs: Option<u64>,

    /// Per-request OCR reply deadline, in seconds. `0` disables the timeout.
    #[arg(long)]
    pub ocr_timeout_secs: Option<u64>,

    /// Additional CORS origin to allow (repeatable). Empty means permissive.
    #[arg(long = "cors-origin")]
    pub cors_origins: Vec<String>,

    /// mDNS service type to advertise.
    #[arg(long)]
    pub mdns_service_type: Option<String>,

    /// `tracing` filter directive level (e.g. `info`, `debug`). Overridden
    /// by `RUST_LOG` if that's set.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Emit structured JSON logs instead of human-readable ones.
    #[arg(long)]
    pub log_json: bool,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub host: String,
    pub port: u16,
    pub room: String,
    pub health_check_interval_secs: u64,
    pub ocr_timeout_secs: u64,
    pub cors_origins: Vec<String>,
    pub mdns_service_type: String,
    pub log_level: String,
    pub log_json: bool,
}

impl CliArgs {
    /// Load the optional config file (logging and falling back to defaults
    /// on any error, per §7 — a bad config file is never fatal), then layer
    /// CLI flags on top.
    pub fn resolve(&self) -> ResolvedConfig {
        let file_cfg = self
            .config
            .as_deref()
            .map(|path| match ServerConfig::load_file(path) {
                Ok(cfg) => cfg,
                Err(err) => {
                    tracing::warn!(%err, "failed to load config file; using built-in defaults");
                    ServerConfig::default()
                }
            })
            .unwrap_or_default();

        ResolvedConfig {
            host: self.host.clone().unwrap_or_else(|| file_cfg.host().to_string()),
            port: self.port.unwrap_or_else(|| file_cfg.port()),
            room: self.room.clone().unwrap_or_else(|| file_cfg.room().to_string()),
            health_check_interval_secs: self
                .health_check_interval_secs
                .unwrap_or_else(|| file_cfg.health_check_interval_secs()),
            ocr_timeout_secs: self.ocr_timeout_secs.unwrap_or(DEFAULT_OCR_TIMEOUT_SECS),
            cors_origins: if !self.cors_origins.is_empty() {
                self.cors_origins.clone()
            } else {
                file_cfg.server.cors_origins.clone().unwrap_or_default()
            },
            mdns_service_type: self
                .mdns_service_type
                .clone()
                .unwrap_or_else(|| DEFAULT_SERVICE_TYPE.to_string()),
            log_level: self
                .log_level
                .clone()
                .unwrap_or_else(|| file_cfg.log_level().to_string()),
            log_json: self.log_json,
        }
    }
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        ResolvedConfig {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            room: DEFAULT_ROOM.to_string(),
            health_check_interval_secs: DEFAULT_HEALTH_CHECK_INTERVAL_SECS,
            ocr_timeout_secs: DEFAULT_OCR_TIMEOUT_SECS,
            cors_origins: Vec::new(),
            mdns_service_type: DEFAULT_SERVICE_TYPE.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_json: false,
        }
    }
}
