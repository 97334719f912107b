use serde::{Deserialize, Serialize};
use std::fs;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    #[serde(default = "default_log_file")]
    pub log_file: String,
    #[serde(default)]
    pub use_json: bool,
    #[serde(default = "default_rotation")]
    pub rotation: String,
    /// Emit per-handoff delivery traces (`handoff_trace` target)
    #[serde(default)]
    pub enable_tracing: bool,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub mirror: MirrorConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_log_file() -> String {
    "flight_handoff.log".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_dir: default_log_dir(),
            log_file: default_log_file(),
            use_json: false,
            rotation: default_rotation(),
            enable_tracing: false,
            gateway: GatewayConfig::default(),
            store: StoreConfig::default(),
            mirror: MirrorConfig::default(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StoreConfig {
    /// JSON snapshot of the flight set, rewritten after every mutation
    pub snapshot_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            snapshot_path: "data/flights.json".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MirrorBackend {
    Memory,
    Tinywebdb,
}

/// External mirror settings
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct MirrorConfig {
    pub backend: MirrorBackend,
    pub api_url: String,
    pub user: String,
    pub secret: String,
    /// Upper bound on every remote call
    pub timeout_ms: u64,
    /// Window size for reconcile reads
    pub search_count: usize,
    /// Pending jobs before new ones are dropped and recorded as failures
    pub queue_capacity: usize,
    pub failure_log_capacity: usize,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            backend: MirrorBackend::Memory,
            api_url: "https://tinywebdb.appinventor.space/api".to_string(),
            user: String::new(),
            secret: String::new(),
            timeout_ms: 5000,
            search_count: 50,
            queue_capacity: 1024,
            failure_log_capacity: 100,
        }
    }
}

impl AppConfig {
    pub fn load(env: &str) -> Result<Self, ConfigError> {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path).map_err(|source| ConfigError::Read {
            path: config_path.clone(),
            source,
        })?;
        Self::from_yaml(&content).map_err(|source| ConfigError::Parse {
            path: config_path,
            source,
        })
    }

    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config = AppConfig::from_yaml(
            r#"
log_level: debug
gateway:
  host: 127.0.0.1
  port: 8080
mirror:
  backend: tinywebdb
  user: tower
  timeout_ms: 2000
"#,
        )
        .unwrap();

        assert_eq!(config.log_level, "debug");
        assert_eq!(config.gateway.port, 8080);
        assert_eq!(config.store.snapshot_path, "data/flights.json");
        assert_eq!(config.mirror.backend, MirrorBackend::Tinywebdb);
        assert_eq!(config.mirror.user, "tower");
        assert_eq!(config.mirror.timeout_ms, 2000);
        assert_eq!(config.mirror.search_count, 50);
        assert_eq!(config.mirror.queue_capacity, 1024);
        assert!(!config.enable_tracing);
    }

    #[test]
    fn test_missing_file() {
        let err = AppConfig::load("does-not-exist").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
