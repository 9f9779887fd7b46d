use serde::{Deserialize, Serialize};

use crate::{
    clamp_frequency, DEFAULT_FREQUENCY_SECS, DEFAULT_HEALTH_CHECK_INTERVAL_SECS, DEFAULT_HOST,
    DEFAULT_LOG_LEVEL, DEFAULT_PORT, DEFAULT_ROOM,
};

/// Server config file shape, mirroring the original `server_config.json`'s
/// `server` object plus its top-level `logging` object (§6). Every field is
/// optional so a partial file only overrides what it names; missing fields
/// keep the built-in default.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ServerConfig {
    pub server: ServerSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSection {
    #[serde(default)]
    pub level: Option<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        LoggingSection { level: Some(DEFAULT_LOG_LEVEL.to_string()) }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub room: Option<String>,
    #[serde(default)]
    pub cors_origins: Option<Vec<String>>,
    #[serde(default)]
    pub health_check_interval: Option<u64>,
}

impl Default for ServerSection {
    fn default() -> Self {
        ServerSection {
            host: Some(DEFAULT_HOST.to_string()),
            port: Some(DEFAULT_PORT),
            room: Some(DEFAULT_ROOM.to_string()),
            cors_origins: None,
            health_check_interval: Some(DEFAULT_HEALTH_CHECK_INTERVAL_SECS),
        }
    }
}

impl ServerConfig {
    /// Load a config file from `path`, merged shallowly over the built-in
    /// defaults: any field the file omits keeps its default. A missing or
    /// unparsable file is not fatal (§7) — the caller logs and falls back
    /// to `ServerConfig::default()`.
    pub fn load_file(path: &std::path::Path) -> Result<ServerConfig, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        let parsed: ServerConfig =
            serde_json::from_str(&raw).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        Ok(parsed.merged_over_defaults())
    }

    fn merged_over_defaults(self) -> ServerConfig {
        let defaults = ServerSection::default();
        let default_logging = LoggingSection::default();
        ServerConfig {
            server: ServerSection {
                host: self.server.host.or(defaults.host),
                port: self.server.port.or(defaults.port),
                room: self.server.room.or(defaults.room),
                cors_origins: self.server.cors_origins.or(defaults.cors_origins),
                health_check_interval: self
                    .server
                    .health_check_interval
                    .or(defaults.health_check_interval),
            },
            logging: LoggingSection {
                level: self.logging.level.or(default_logging.level),
            },
        }
    }

    pub fn host(&self) -> &str {
        self.server.host.as_deref().unwrap_or(DEFAULT_HOST)
    }

    pub fn port(&self) -> u16 {
        self.server.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn room(&self) -> &str {
        self.server.room.as_deref().unwrap_or(DEFAULT_ROOM)
    }

    pub fn health_check_interval_secs(&self) -> u64 {
        self.server
            .health_check_interval
            .unwrap_or(DEFAULT_HEALTH_CHECK_INTERVAL_SECS)
    }

    pub fn log_level(&self) -> &str {
        self.logging.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read config file {0}: {1}")]
    Read(std::path::PathBuf, std::io::Error),
    #[error("could not parse config file {0}: {1}")]
    Parse(std::path::PathBuf, serde_json::Error),
}

/// `capture-worker`'s frequency config file shape (§6): `{"frequency": <seconds>}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrequencyConfig {
    pub frequency: Option<f64>,
}

impl FrequencyConfig {
    /// Load and clamp the configured frequency. Returns the clamped value and
    /// whether clamping/fallback occurred, so the caller can log a warning
    /// (§8 invariant 9). A missing/unparsable file yields the default with
    /// no warning (absence is not an out-of-range value).
    pub fn load_clamped(path: &std::path::Path) -> (f64, bool) {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(_) => return (DEFAULT_FREQUENCY_SECS, false),
        };
        let parsed: Result<FrequencyConfig, _> = serde_json::from_str(&raw);
        match parsed.ok().and_then(|c| c.frequency) {
            Some(freq) => clamp_frequency(freq),
            None => (DEFAULT_FREQUENCY_SECS, false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let cfg: ServerConfig = serde_json::from_str(r#"{"server":{"port":9000}}"#).unwrap();
        let cfg = cfg.merged_over_defaults();
        assert_eq!(cfg.port(), 9000);
        assert_eq!(cfg.host(), DEFAULT_HOST);
        assert_eq!(cfg.room(), DEFAULT_ROOM);
        assert_eq!(cfg.log_level(), DEFAULT_LOG_LEVEL);
    }

    #[test]
    fn top_level_logging_section_is_read_separately_from_server() {
        let cfg: ServerConfig =
            serde_json::from_str(r#"{"server":{"port":9000},"logging":{"level":"debug"}}"#).unwrap();
        let cfg = cfg.merged_over_defaults();
        assert_eq!(cfg.port(), 9000);
        assert_eq!(cfg.log_level(), "debug");
    }

    #[test]
    fn frequency_config_missing_file_yields_default() {
        let (freq, clamped) = FrequencyConfig::load_clamped(std::path::Path::new("/nonexistent/x.json"));
        assert_eq!(freq, DEFAULT_FREQUENCY_SECS);
        assert!(!clamped);
    }
}
