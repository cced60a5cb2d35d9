use crate::error::{Result, ResultExt as _, WranglerError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Overrides [`ClientConfig::api_base_url`] when set.
pub const API_URL_ENV: &str = "WRANGLER_API_URL";

const MAX_ACTIVITY_ENTRIES: usize = 500;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ClientConfig {
    /// Root of the dataset service, e.g. `http://127.0.0.1:8000/api`.
    pub api_base_url: String,
    pub connect_timeout_secs: u64,
    /// Applies to every call except uploads.
    pub request_timeout_secs: u64,
    /// Size of the body chunks uploads are streamed in; progress is reported per chunk.
    pub upload_chunk_size: usize,
    /// Where exports are written. Defaults to the platform download directory.
    pub export_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8000/api".to_owned(),
            connect_timeout_secs: 10,
            request_timeout_secs: 60,
            upload_chunk_size: 64 * 1024,
            export_dir: None,
        }
    }
}

impl ClientConfig {
    /// Applies [`API_URL_ENV`] if present and non-empty.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var(API_URL_ENV)
            && !url.trim().is_empty()
        {
            self.api_base_url = url.trim().to_owned();
        }
        self
    }

    pub fn resolved_export_dir(&self) -> PathBuf {
        self.export_dir
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ActivityEntry {
    pub timestamp: DateTime<Utc>,
    pub action: String,
    pub details: String,
}

/// Recent user-visible outcomes (saves, imports, failures), newest last.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ActivityLog {
    entries: Vec<ActivityEntry>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, action: impl Into<String>, details: impl Into<String>) {
        self.entries.push(ActivityEntry {
            timestamp: Utc::now(),
            action: action.into(),
            details: details.into(),
        });

        if self.entries.len() > MAX_ACTIVITY_ENTRIES {
            self.entries.drain(0..self.entries.len() - MAX_ACTIVITY_ENTRIES);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[ActivityEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    pub client: ClientConfig,
    pub activity: ActivityLog,
}

pub fn get_config_path() -> Result<PathBuf> {
    let base = dirs::config_dir()
        .ok_or_else(|| WranglerError::Config("no platform config directory".to_owned()))?;
    Ok(base.join("wrangler").join("config.json"))
}

/// Loads the persisted config, falling back to defaults when the file is
/// missing or unreadable.
pub fn load_app_config() -> AppConfig {
    match get_config_path().and_then(|path| load_app_config_from(&path)) {
        Ok(Some(config)) => config,
        Ok(None) => AppConfig::default(),
        Err(e) => {
            tracing::warn!("Ignoring unreadable config: {e}");
            AppConfig::default()
        }
    }
}

pub fn load_app_config_from(path: &std::path::Path) -> Result<Option<AppConfig>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config = serde_json::from_str::<AppConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(Some(config))
}

pub fn save_app_config(config: &AppConfig) -> Result<()> {
    save_app_config_to(config, &get_config_path()?)
}

pub fn save_app_config_to(config: &AppConfig, path: &std::path::Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
