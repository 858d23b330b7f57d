//! Configuration for the parcelmon service.
//!
//! Layered with figment: compiled defaults, an optional TOML file, the bare
//! environment keys the Home Assistant add-on passes (`host`, `port`, ...),
//! and finally `PARCELMON_`-prefixed variables. Translates the result into
//! `parcelmon_core::MonitorConfig`.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use url::Url;

use parcelmon_core::{Credentials, MonitorConfig};

/// Environment keys read without a prefix. Matched exactly, so `USERNAME`
/// or `PORT` from the surrounding environment are not picked up.
pub const BARE_ENV_KEYS: &[&str] = &[
    "host",
    "port",
    "username",
    "password",
    "organization_number",
    "api_key",
    "update_interval",
];

/// Prefix for environment overrides of any key.
pub const ENV_PREFIX: &str = "PARCELMON_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── Config struct ───────────────────────────────────────────────────

/// Effective service configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// CarLo API host name.
    #[serde(deserialize_with = "lossy_string")]
    pub host: String,

    /// CarLo API port.
    pub port: u16,

    #[serde(deserialize_with = "lossy_string")]
    pub username: String,

    #[serde(deserialize_with = "lossy_string")]
    pub password: String,

    #[serde(deserialize_with = "lossy_string")]
    pub organization_number: String,

    #[serde(deserialize_with = "lossy_string")]
    pub api_key: String,

    /// Refresh period in minutes. 0 disables periodic refresh.
    pub update_interval: u64,

    /// Upstream request timeout in seconds.
    pub timeout: u64,

    /// Address the HTTP server binds to.
    #[serde(deserialize_with = "lossy_string")]
    pub listen: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "wogdb".into(),
            port: 4711,
            username: "MABU".into(),
            password: "detimk23".into(),
            organization_number: "1".into(),
            api_key: "KJEETC2J[5Bad5!70F9T".into(),
            update_interval: 10,
            timeout: 30,
            listen: "0.0.0.0:8123".into(),
        }
    }
}

/// Accept a string, or a number/bool that an env provider parsed eagerly
/// (e.g. `organization_number=1`).
fn lossy_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Lossy {
        Str(String),
        Int(i64),
        Uint(u64),
        Float(f64),
        Bool(bool),
    }

    Ok(match Lossy::deserialize(deserializer)? {
        Lossy::Str(s) => s,
        Lossy::Int(n) => n.to_string(),
        Lossy::Uint(n) => n.to_string(),
        Lossy::Float(n) => n.to_string(),
        Lossy::Bool(b) => b.to_string(),
    })
}

impl Config {
    /// Base URL of the CarLo API, `http://{host}:{port}`.
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        let raw = format!("http://{}:{}", self.host, self.port);
        Url::parse(&raw).map_err(|e| ConfigError::Validation {
            field: "host".into(),
            reason: format!("'{raw}' is not a valid URL: {e}"),
        })
    }

    /// Parsed HTTP listen address.
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.listen.parse().map_err(|_| ConfigError::Validation {
            field: "listen".into(),
            reason: format!("expected host:port, got '{}'", self.listen),
        })
    }

    /// Translate into the runtime configuration of the delivery monitor.
    pub fn to_monitor_config(&self) -> Result<MonitorConfig, ConfigError> {
        let credentials = Credentials::new(
            self.username.clone(),
            self.password.clone(),
            self.organization_number.clone(),
            self.api_key.clone(),
        );

        let mut config = MonitorConfig::new(self.base_url()?, credentials);
        config.timeout = Duration::from_secs(self.timeout);
        config.update_interval = Duration::from_secs(self.update_interval.saturating_mul(60));
        Ok(config)
    }

    /// The configuration as TOML with secrets masked.
    pub fn to_toml_redacted(&self) -> Result<String, ConfigError> {
        let mut redacted = self.clone();
        redacted.password = mask(&self.password);
        redacted.api_key = mask(&self.api_key);
        Ok(toml::to_string_pretty(&redacted)?)
    }

    /// The figment this configuration is extracted from.
    ///
    /// `file` is merged when given; missing files contribute nothing.
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));
        if let Some(path) = file {
            figment = figment.merge(Toml::file(path));
        }
        figment
            .merge(Env::raw().filter(|key| BARE_ENV_KEYS.contains(&key.as_str())))
            .merge(Env::prefixed(ENV_PREFIX))
    }
}

fn mask(secret: &str) -> String {
    if secret.is_empty() {
        String::new()
    } else {
        "********".into()
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the default config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "parcelmon", "parcelmon").map_or_else(
        || PathBuf::from("parcelmon.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the effective configuration.
///
/// An explicit `file` must exist; without one the platform default path
/// is used if present.
pub fn load_config(file: Option<&Path>) -> Result<Config, ConfigError> {
    let path = match file {
        Some(path) if !path.exists() => {
            return Err(ConfigError::Validation {
                field: "config".into(),
                reason: format!("file not found: {}", path.display()),
            });
        }
        Some(path) => path.to_path_buf(),
        None => config_path(),
    };

    let config: Config = Config::figment(Some(&path)).extract()?;
    Ok(config)
}
