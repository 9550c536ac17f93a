//! Configuration management for the Solo FTP Server
//!
//! Settings are layered: built-in defaults, then an optional `config.toml`,
//! then `SOLO_FTP_*` environment variables. Everything here is read once at
//! start-up and stays fixed for the lifetime of the process.

use config::{Config, Environment, File};
use serde::Deserialize;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::time::Duration;

/// Default location of the configuration file (extension resolved by `config`)
pub const DEFAULT_CONFIG_PATH: &str = "config";

/// Environment variable naming an alternative configuration file
pub const CONFIG_PATH_ENV: &str = "SOLO_FTP_CONFIG";

/// Complete server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    // ═══ NETWORK ═══
    /// IP address both endpoints bind to
    pub bind_address: String,

    /// Port for the FTP control connection
    pub control_port: u16,

    /// Fixed port of the passive data endpoint
    pub data_port: u16,

    /// Address announced in the 227 reply; the control connection's
    /// local address is used when unset
    pub pasv_address: Option<String>,

    // ═══ CREDENTIALS ═══
    pub username: String,
    pub password: String,

    // ═══ SESSION ═══
    /// Idle minutes tolerated on an authenticated session
    pub idle_timeout_mins: u64,

    /// Directory exposed to the client as `/`
    pub server_root: String,

    /// Chunk size for one pump step
    pub buffer_size: usize,

    /// Host loop pacing when no transfer is in flight
    pub poll_interval_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            control_port: 21,
            data_port: 50009,
            pasv_address: None,
            username: "ftp".to_string(),
            password: "ftp".to_string(),
            idle_timeout_mins: 5,
            server_root: "./ftp_root".to_string(),
            buffer_size: 1024,
            poll_interval_ms: 5,
        }
    }
}

impl ServerConfig {
    /// Load configuration from the default location, honouring `SOLO_FTP_CONFIG`.
    pub fn load() -> Result<Self, config::ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
        Self::load_from(&path)
    }

    /// Load configuration from `path` (file optional) with environment overrides.
    pub fn load_from(path: &str) -> Result<Self, config::ConfigError> {
        let defaults = ServerConfig::default();

        let settings = Config::builder()
            .set_default("bind_address", defaults.bind_address)?
            .set_default("control_port", defaults.control_port as i64)?
            .set_default("data_port", defaults.data_port as i64)?
            .set_default("username", defaults.username)?
            .set_default("password", defaults.password)?
            .set_default("idle_timeout_mins", defaults.idle_timeout_mins as i64)?
            .set_default("server_root", defaults.server_root)?
            .set_default("buffer_size", defaults.buffer_size as i64)?
            .set_default("poll_interval_ms", defaults.poll_interval_ms as i64)?
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix("SOLO_FTP").try_parsing(true))
            .build()?;

        let config: ServerConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.control_port == 0 || self.data_port == 0 {
            return Err(config::ConfigError::Message(
                "Control and data ports cannot be 0".into(),
            ));
        }

        if self.control_port == self.data_port {
            return Err(config::ConfigError::Message(
                "control_port and data_port must differ".into(),
            ));
        }

        if self.username.is_empty() {
            return Err(config::ConfigError::Message(
                "username cannot be empty".into(),
            ));
        }

        if self.idle_timeout_mins == 0 {
            return Err(config::ConfigError::Message(
                "idle_timeout_mins must be greater than 0".into(),
            ));
        }

        if self.buffer_size == 0 {
            return Err(config::ConfigError::Message(
                "buffer_size must be greater than 0".into(),
            ));
        }

        if self.server_root.is_empty() {
            return Err(config::ConfigError::Message(
                "server_root cannot be empty".into(),
            ));
        }

        if let Some(addr) = &self.pasv_address {
            if addr.parse::<Ipv4Addr>().is_err() {
                return Err(config::ConfigError::Message(format!(
                    "pasv_address is not an IPv4 address: {addr}"
                )));
            }
        }

        Ok(())
    }

    /// Control endpoint as `host:port`
    pub fn control_socket(&self) -> String {
        format!("{}:{}", self.bind_address, self.control_port)
    }

    /// Data endpoint as `host:port`
    pub fn data_socket(&self) -> String {
        format!("{}:{}", self.bind_address, self.data_port)
    }

    /// Get server root as PathBuf
    pub fn server_root_path(&self) -> PathBuf {
        PathBuf::from(&self.server_root)
    }

    /// Idle timeout in milliseconds
    pub fn idle_timeout_millis(&self) -> u64 {
        self.idle_timeout_mins * 60 * 1000
    }

    /// Parsed passive announcement address, if configured
    pub fn pasv_ip(&self) -> Option<Ipv4Addr> {
        self.pasv_address.as_deref().and_then(|a| a.parse().ok())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
