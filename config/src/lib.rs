//! Configuration loading for Tether.
//!
//! The config lives at `~/.tether/config.toml` (or the path in
//! `TETHER_CONFIG`). Every section is optional; a missing file is not an
//! error.
//!
//! ```toml
//! [api]
//! base_url = "https://chat.example.com"
//! request_timeout_secs = 20
//!
//! [auth]
//! access_token = "${TETHER_TOKEN}"
//!
//! [waitlist]
//! encoding = "form"   # or "json"
//!
//! [logging]
//! filter = "tether=debug"
//! file = "${HOME}/logs/tether.log"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};

use serde::Deserialize;
use thiserror::Error;

use tether_api::{ApiClientConfig, ApiClientError, DEFAULT_BASE_URL, WaitlistEncoding};
use tether_types::AccessToken;

/// Overrides `[auth] access_token` when set.
pub const ACCESS_TOKEN_ENV: &str = "TETHER_ACCESS_TOKEN";
/// Overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "TETHER_CONFIG";

const LOG_DIR: &str = "logs";
const LOG_FILE_NAME: &str = "tether.log";

#[derive(Debug, Default, Deserialize)]
pub struct TetherConfig {
    pub api: Option<ApiConfig>,
    pub auth: Option<AuthConfig>,
    pub waitlist: Option<WaitlistConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl ConfigError {
    pub fn path(&self) -> &PathBuf {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiConfig {
    /// Backend origin; routes are appended under `/api`.
    pub base_url: Option<String>,
    /// Per-request deadline. Default: 30.
    pub request_timeout_secs: Option<u64>,
}

#[derive(Default, Deserialize)]
pub struct AuthConfig {
    /// Supports `${VAR}` expansion.
    pub access_token: Option<String>,
}

// Manual Debug impl to prevent leaking the token in logs.
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let token = if self.access_token.is_some() {
            "[REDACTED]"
        } else {
            "None"
        };
        f.debug_struct("AuthConfig")
            .field("access_token", &token)
            .finish()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct WaitlistConfig {
    #[serde(default)]
    pub encoding: WaitlistEncoding,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive, used when `RUST_LOG` is unset.
    pub filter: Option<String>,
    /// Preferred log file. `${VAR}` references are expanded.
    pub file: Option<String>,
}

pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let var = &after[..end];
                if !var.is_empty() {
                    out.push_str(&env::var(var).unwrap_or_default());
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }

    out.push_str(rest);
    out
}

impl TetherConfig {
    pub fn load() -> Result<Option<Self>, ConfigError> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(None),
        }
    }

    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        match toml::from_str(&content) {
            Ok(config) => Ok(Some(config)),
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        }
    }

    #[must_use]
    pub fn path() -> Option<PathBuf> {
        config_path()
    }

    pub fn client_config(&self) -> Result<ApiClientConfig, ApiClientError> {
        let api = self.api.as_ref();
        let base_url = api
            .and_then(|api| api.base_url.as_deref())
            .unwrap_or(DEFAULT_BASE_URL);
        let mut config = ApiClientConfig::new(base_url)?;
        if let Some(secs) = api.and_then(|api| api.request_timeout_secs).filter(|s| *s > 0) {
            config = config.with_request_timeout(Duration::from_secs(secs));
        }
        Ok(config)
    }

    /// Token from `TETHER_ACCESS_TOKEN`, falling back to `[auth] access_token`.
    #[must_use]
    pub fn access_token(&self) -> Option<AccessToken> {
        self.resolve_access_token(env::var(ACCESS_TOKEN_ENV).ok())
    }

    fn resolve_access_token(&self, env_token: Option<String>) -> Option<AccessToken> {
        env_token.and_then(AccessToken::new).or_else(|| {
            self.auth
                .as_ref()
                .and_then(|auth| auth.access_token.as_deref())
                .map(expand_env_vars)
                .and_then(AccessToken::new)
        })
    }

    #[must_use]
    pub fn waitlist_encoding(&self) -> WaitlistEncoding {
        self.waitlist
            .as_ref()
            .map(|w| w.encoding)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn log_filter(&self) -> Option<&str> {
        self.logging.as_ref().and_then(|l| l.filter.as_deref())
    }

    /// Log file locations in the order they should be tried: `[logging] file`,
    /// then `logs/tether.log` beside the config file, then
    /// `./.tether/logs/tether.log`.
    #[must_use]
    pub fn log_file_candidates(&self) -> Vec<PathBuf> {
        self.resolve_log_file_candidates(config_path().as_deref())
    }

    fn resolve_log_file_candidates(&self, config_file: Option<&Path>) -> Vec<PathBuf> {
        let configured = self
            .logging
            .as_ref()
            .and_then(|l| l.file.as_deref())
            .map(expand_env_vars)
            .filter(|file| !file.trim().is_empty())
            .map(PathBuf::from);
        let beside_config = config_file
            .and_then(Path::parent)
            .map(|dir| dir.join(LOG_DIR).join(LOG_FILE_NAME));
        let local = PathBuf::from(".tether").join(LOG_DIR).join(LOG_FILE_NAME);

        configured
            .into_iter()
            .chain(beside_config)
            .chain(std::iter::once(local))
            .collect()
    }
}

pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = env::var_os(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(path));
    }
    dirs::home_dir().map(|home| home.join(".tether").join("config.toml"))
}
