//! Configuration management for the watch engine.
//!
//! Provides layered configuration loading with priority:
//! 1. Default values (hardcoded)
//! 2. Optional TOML config file
//! 3. Environment variables prefixed with `CONFWATCH_` (highest priority)
//!
//! Every section carries serde field defaults and a `validate()` method, so
//! a minimal file naming only `connection.hosts` and the `app` identity is a
//! complete configuration.


use config::{Config, Environment, File};
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Root settings object, one per process.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Settings {
    /// Coordination-service endpoints and session timing
    #[serde(default)]
    pub connection: ConnectionConfig,
    /// Identity of the application this process announces
    #[serde(default)]
    pub app: AppConfig,
    /// Watch dispatch and reload tuning
    #[serde(default)]
    pub watch: WatchConfig,
}

impl Settings {
    /// Load configuration from an optional file plus environment overrides.
    ///
    /// `CONFWATCH_CONNECTION__HOSTS=host1:2181` style variables override
    /// file values (double underscore separates nesting levels).
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path));
        }

        let config = builder
            .add_source(Environment::with_prefix("CONFWATCH").separator("__"))
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validates all sections
    pub fn validate(&self) -> Result<()> {
        self.connection.validate()?;
        self.app.validate()?;
        self.watch.validate()?;
        Ok(())
    }
}

/// Connection parameters for the coordination service.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ConnectionConfig {
    /// Comma-separated `host:port` endpoints
    #[serde(default)]
    pub hosts: String,

    /// Session timeout negotiated with the service (milliseconds).
    /// Kept long enough to avoid flappy session expiry on short
    /// network hiccups.
    #[serde(default = "default_session_timeout_ms")]
    pub session_timeout_ms: u64,

    /// Timeout for the initial connection establishment (milliseconds)
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            hosts: String::new(),
            session_timeout_ms: default_session_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

impl ConnectionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.hosts.trim().is_empty() {
            return Err(Error::Config(config::ConfigError::Message(
                "connection.hosts must not be empty".into(),
            )));
        }
        if self.session_timeout_ms == 0 {
            return Err(Error::Config(config::ConfigError::Message(
                "connection.session_timeout_ms must be greater than 0".into(),
            )));
        }
        Ok(())
    }
}

/// Identity announced by this process: which application, environment and
/// configuration version it belongs to. These three fields form the second
/// path segment (`<app>_<env>_<version>`) of every watched node.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: String,
    #[serde(default)]
    pub env: String,
    #[serde(default)]
    pub version: String,

    /// Demotes benign disconnect/expiry logging from warn/error to debug.
    /// Reload behavior is unaffected.
    #[serde(default)]
    pub debug: bool,
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("app.app", &self.app),
            ("app.env", &self.env),
            ("app.version", &self.version),
        ] {
            if value.trim().is_empty() {
                return Err(Error::Config(config::ConfigError::Message(format!(
                    "{field} must not be empty"
                ))));
            }
            if value.contains('/') {
                return Err(Error::Config(config::ConfigError::Message(format!(
                    "{field} must not contain '/'"
                ))));
            }
        }
        Ok(())
    }
}

/// Watch dispatch tuning.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WatchConfig {
    /// Root node under which all watched paths live
    #[serde(default = "default_root_prefix")]
    pub root_prefix: String,

    /// Capacity of the per-session event channel between the transport and
    /// the dispatcher
    #[serde(default = "default_event_queue_size")]
    pub event_queue_size: usize,

    /// Maximum reload callbacks running concurrently. Reload work is
    /// offloaded so the event-dispatch loop is never starved by a slow
    /// callback.
    #[serde(default = "default_reload_concurrency")]
    pub reload_concurrency: usize,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            root_prefix: default_root_prefix(),
            event_queue_size: default_event_queue_size(),
            reload_concurrency: default_reload_concurrency(),
        }
    }
}

impl WatchConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.root_prefix.starts_with('/') || self.root_prefix.len() < 2 {
            return Err(Error::Config(config::ConfigError::Message(
                "watch.root_prefix must be an absolute path like /disconf".into(),
            )));
        }
        if self.root_prefix.ends_with('/') {
            return Err(Error::Config(config::ConfigError::Message(
                "watch.root_prefix must not end with '/'".into(),
            )));
        }
        if self.event_queue_size == 0 {
            return Err(Error::Config(config::ConfigError::Message(
                "watch.event_queue_size must be greater than 0".into(),
            )));
        }
        if self.reload_concurrency == 0 {
            return Err(Error::Config(config::ConfigError::Message(
                "watch.reload_concurrency must be greater than 0".into(),
            )));
        }
        Ok(())
    }
}

fn default_session_timeout_ms() -> u64 {
    10_000
}

fn default_connect_timeout_ms() -> u64 {
    5_000
}

fn default_root_prefix() -> String {
    "/disconf".to_string()
}

fn default_event_queue_size() -> usize {
    1024
}

fn default_reload_concurrency() -> usize {
    4
}
