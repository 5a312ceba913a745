use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::monitor::MonitorSettings;
use crate::monitor::prober::{IcmpProber, Prober, SystemPingProber};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse TOML from config file at {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("Failed to load config from environment: {0}")]
    Env(#[from] envy::Error),
    #[error("{0} is required")]
    Missing(&'static str),
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProbeBackend {
    /// Shells out to the platform `ping` utility.
    #[default]
    System,
    /// Sends echo requests directly over an ICMP socket.
    Icmp,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub listen_address: String,
    pub log_dir: String,
    pub probe_backend: ProbeBackend,
    pub ping_binary: String,
    pub inter_probe_delay_ms: u64,
    pub probe_command_timeout_secs: u64,
    pub reschedule_retry_secs: u64,
}

// Partial config for layering
#[derive(Deserialize, Default, Debug)]
struct PartialServerConfig {
    database_url: Option<String>,
    listen_address: Option<String>,
    log_dir: Option<String>,
    probe_backend: Option<ProbeBackend>,
    ping_binary: Option<String>,
    inter_probe_delay_ms: Option<u64>,
    probe_command_timeout_secs: Option<u64>,
    reschedule_retry_secs: Option<u64>,
}

fn default_listen_address() -> String {
    "0.0.0.0:3001".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_ping_binary() -> String {
    "ping".to_string()
}

impl ServerConfig {
    pub fn load(config_path: Option<&str>) -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let file_config = match config_path {
            Some(path) => read_config_file(Path::new(path))?,
            None => PartialServerConfig::default(),
        };
        let env_config: PartialServerConfig = envy::from_env()?;

        Self::merge(env_config, file_config)
    }

    /// Environment overrides file; anything unset falls back to its default.
    fn merge(env: PartialServerConfig, file: PartialServerConfig) -> Result<Self, ConfigError> {
        Ok(ServerConfig {
            database_url: env
                .database_url
                .or(file.database_url)
                .ok_or(ConfigError::Missing("DATABASE_URL"))?,
            listen_address: env
                .listen_address
                .or(file.listen_address)
                .unwrap_or_else(default_listen_address),
            log_dir: env.log_dir.or(file.log_dir).unwrap_or_else(default_log_dir),
            probe_backend: env
                .probe_backend
                .or(file.probe_backend)
                .unwrap_or_default(),
            ping_binary: env
                .ping_binary
                .or(file.ping_binary)
                .unwrap_or_else(default_ping_binary),
            inter_probe_delay_ms: env
                .inter_probe_delay_ms
                .or(file.inter_probe_delay_ms)
                .unwrap_or(200),
            probe_command_timeout_secs: env
                .probe_command_timeout_secs
                .or(file.probe_command_timeout_secs)
                .unwrap_or(30),
            reschedule_retry_secs: env
                .reschedule_retry_secs
                .or(file.reschedule_retry_secs)
                .unwrap_or(60),
        })
    }

    pub fn monitor_settings(&self) -> MonitorSettings {
        MonitorSettings {
            inter_probe_delay: Duration::from_millis(self.inter_probe_delay_ms),
            reschedule_retry: Duration::from_secs(self.reschedule_retry_secs),
        }
    }

    pub fn build_prober(&self) -> Arc<dyn Prober> {
        match self.probe_backend {
            ProbeBackend::System => Arc::new(SystemPingProber::new(
                self.ping_binary.clone(),
                Duration::from_secs(self.probe_command_timeout_secs),
            )),
            ProbeBackend::Icmp => Arc::new(IcmpProber::new()),
        }
    }
}

fn read_config_file(path: &Path) -> Result<PartialServerConfig, ConfigError> {
    if !path.exists() {
        return Ok(PartialServerConfig::default());
    }
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}
