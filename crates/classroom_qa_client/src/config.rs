//! Client config load/save for `~/.classroom-qa/config.yaml`.
//! Sections: `api.*`, `realtime.*`, `limits.*`, `storage.*`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5000/api";
pub const DEFAULT_REALTIME_URL: &str = "ws://127.0.0.1:5000/realtime";
pub const DEFAULT_SESSION_LIST_LIMIT: u32 = 10;
pub const DEFAULT_QUESTION_PAGE: u32 = 50;
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 2_000;
pub const DEFAULT_ECHO_TIMEOUT_MS: u64 = 5_000;

/// API section (base_url, auth_token, user_id).
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct ApiSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    /// Identity the token belongs to; used to pick "my" questions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// Realtime section (url, reconnect_delay_ms, echo_timeout_ms).
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct RealtimeSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reconnect_delay_ms: Option<u64>,
    /// How long a submitted question may go without its realtime echo
    /// before the feed is re-fetched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub echo_timeout_ms: Option<u64>,
}

/// Page sizes (session_list, question_page).
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct LimitsSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_list: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_page: Option<u32>,
}

/// Storage section (state_dir).
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct StorageSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiSection,
    #[serde(default)]
    pub realtime: RealtimeSection,
    #[serde(default)]
    pub limits: LimitsSection,
    #[serde(default)]
    pub storage: StorageSection,
}

impl Config {
    pub fn api_url(&self) -> &str {
        self.api.base_url.as_deref().unwrap_or(DEFAULT_API_URL)
    }

    pub fn realtime_url(&self) -> &str {
        self.realtime.url.as_deref().unwrap_or(DEFAULT_REALTIME_URL)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(
            self.realtime
                .reconnect_delay_ms
                .unwrap_or(DEFAULT_RECONNECT_DELAY_MS),
        )
    }

    pub fn echo_timeout(&self) -> Duration {
        Duration::from_millis(self.realtime.echo_timeout_ms.unwrap_or(DEFAULT_ECHO_TIMEOUT_MS))
    }

    pub fn session_list_limit(&self) -> u32 {
        self.limits.session_list.unwrap_or(DEFAULT_SESSION_LIST_LIMIT)
    }

    pub fn question_page(&self) -> u32 {
        self.limits.question_page.unwrap_or(DEFAULT_QUESTION_PAGE)
    }

    /// Explicit `storage.state_dir`, else `~/.classroom-qa/state`.
    pub fn state_dir(&self) -> Option<PathBuf> {
        self.storage
            .state_dir
            .clone()
            .or_else(|| Some(home_dir()?.join(".classroom-qa").join("state")))
    }
}

/// Returns the default config file path: `~/.classroom-qa/config.yaml` (platform-specific).
pub fn default_config_path() -> Option<PathBuf> {
    let home = home_dir()?;
    Some(home.join(".classroom-qa").join("config.yaml"))
}

#[cfg(unix)]
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

#[cfg(windows)]
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("USERPROFILE").map(PathBuf::from)
}

#[cfg(not(any(unix, windows)))]
fn home_dir() -> Option<PathBuf> {
    None
}

/// Load config from a YAML file.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&contents)?)
}

/// Load config, falling back to defaults when the file does not exist.
pub fn load_or_default(path: &Path) -> Result<Config, ConfigError> {
    match load(path) {
        Err(ConfigError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            Ok(Config::default())
        }
        other => other,
    }
}

/// Save config to a YAML file. Creates parent directory if missing.
pub fn save(path: &Path, config: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let contents = serde_yaml::to_string(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

/// Config load/save error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
