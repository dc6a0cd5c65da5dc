//! Client configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use quizkit_core::grading::CreditPolicy;
use quizkit_core::session::SessionConfig;

/// Top-level quizkit configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizkitConfig {
    /// Gateway root, without the `/frontend_api` suffix.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Seconds between background token refreshes.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
    /// Timeout of a single login or refresh request.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
    /// How long error notifications stay visible.
    #[serde(default = "default_notification_secs")]
    pub notification_secs: u64,
    /// Partial-credit rule for multiple-choice tasks.
    #[serde(default)]
    pub credit_policy: CreditPolicy,
    /// Where the CLI keeps the signed-in identity between invocations.
    #[serde(default = "default_session_file")]
    pub session_file: PathBuf,
}

fn default_base_url() -> String {
    "http://localhost:5000".to_string()
}
fn default_refresh_interval() -> u64 {
    300
}
fn default_request_timeout() -> u64 {
    10_000
}
fn default_notification_secs() -> u64 {
    5
}
fn default_session_file() -> PathBuf {
    PathBuf::from(".quizkit-session.json")
}

impl Default for QuizkitConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            refresh_interval_secs: default_refresh_interval(),
            request_timeout_ms: default_request_timeout(),
            notification_secs: default_notification_secs(),
            credit_policy: CreditPolicy::default(),
            session_file: default_session_file(),
        }
    }
}

impl QuizkitConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            refresh_interval: Duration::from_secs(self.refresh_interval_secs),
            request_timeout: self.request_timeout(),
            notification_ttl: Duration::from_secs(self.notification_secs),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
/// Unset variables resolve to the empty string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `quizkit.toml` in the current directory
/// 2. `~/.config/quizkit/config.toml`
///
/// `QUIZKIT_BASE_URL` overrides `base_url`.
pub fn load_config() -> Result<QuizkitConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<QuizkitConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("quizkit.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => QuizkitConfig::default(),
    };

    if let Ok(url) = std::env::var("QUIZKIT_BASE_URL") {
        config.base_url = url;
    }

    Ok(config)
}

fn parse_config(content: &str) -> Result<QuizkitConfig> {
    let mut config: QuizkitConfig = toml::from_str(content)?;
    config.base_url = resolve_env_vars(&config.base_url);
    config.session_file = PathBuf::from(resolve_env_vars(&config.session_file.to_string_lossy()));

    if config.refresh_interval_secs == 0 {
        anyhow::bail!("refresh_interval_secs must be greater than 0");
    }
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("quizkit"))
}
