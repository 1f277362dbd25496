// WAF Monitor - Configuration
// Copyright (C) 2026 Christos Daggas
// SPDX-License-Identifier: MIT

//! Application settings management using a local JSON file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    /// Base URL of the pull API.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Websocket URL of the push channel.
    #[serde(default = "default_push_url")]
    pub push_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Bound of the commit queue.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
    /// Keep the snapshot of the previous session instead of starting empty.
    #[serde(default)]
    pub resume_from_persisted_state: bool,
    /// Age after which the dashboard is flagged as stale.
    #[serde(default = "default_stale_after_secs")]
    pub stale_after_secs: u64,
    /// Where the snapshot is stored; the user data directory when unset.
    #[serde(default)]
    pub snapshot_dir: Option<PathBuf>,
}

fn default_api_base_url() -> String { "http://localhost:5001/api".to_string() }
fn default_push_url() -> String { "ws://localhost:5001/events".to_string() }
fn default_request_timeout_secs() -> u64 { 10 }
fn default_queue_capacity() -> usize { 64 }
fn default_reconnect_delay_ms() -> u64 { 500 }
fn default_stale_after_secs() -> u64 { 300 }

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            push_url: default_push_url(),
            request_timeout_secs: default_request_timeout_secs(),
            queue_capacity: default_queue_capacity(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            resume_from_persisted_state: false,
            stale_after_secs: default_stale_after_secs(),
            snapshot_dir: None,
        }
    }
}

impl AppSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn stale_after(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.stale_after_secs.min(u32::MAX as u64) as i64)
    }
}

/// Settings manager that persists to a JSON file.
#[derive(Debug)]
pub struct Settings {
    settings: AppSettings,
    path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}

impl Settings {
    /// Create a new Settings instance, loading from the user config directory.
    pub fn new() -> Self {
        let path = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("waf-monitor")
            .join("settings.json");
        Self::from_path(path)
    }

    /// Load settings from `path`, falling back to defaults.
    pub fn from_path(path: PathBuf) -> Self {
        let settings = if path.exists() {
            match fs::read_to_string(&path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(s) => s,
                    Err(e) => {
                        warn!("Failed to parse settings: {}", e);
                        AppSettings::default()
                    }
                },
                Err(e) => {
                    warn!("Failed to read settings: {}", e);
                    AppSettings::default()
                }
            }
        } else {
            AppSettings::default()
        };

        Self { settings, path }
    }

    /// Save settings to disk.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let content = serde_json::to_string_pretty(&self.settings)?;
        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current settings.
    pub fn get(&self) -> &AppSettings {
        &self.settings
    }

    /// Set whether the previous session's snapshot is kept.
    pub fn set_resume_from_persisted_state(&mut self, enabled: bool) -> Result<()> {
        self.settings.resume_from_persisted_state = enabled;
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("waf-monitor-settings-{}-{}", name, std::process::id()))
            .join("settings.json")
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let settings = Settings::from_path(temp_path("missing"));
        assert_eq!(settings.get(), &AppSettings::default());
        assert!(!settings.get().resume_from_persisted_state);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let path = temp_path("partial");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, r#"{"api_base_url": "http://waf:8080/api", "queue_capacity": 8}"#).unwrap();

        let settings = Settings::from_path(path.clone());
        assert_eq!(settings.get().api_base_url, "http://waf:8080/api");
        assert_eq!(settings.get().queue_capacity, 8);
        assert_eq!(settings.get().request_timeout(), Duration::from_secs(10));

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_malformed_file_uses_defaults() {
        let path = temp_path("malformed");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{ not json").unwrap();

        assert_eq!(Settings::from_path(path.clone()).get(), &AppSettings::default());

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_save_and_reload() {
        let path = temp_path("save");
        let mut settings = Settings::from_path(path.clone());
        settings.set_resume_from_persisted_state(true).unwrap();

        assert!(Settings::from_path(path.clone()).get().resume_from_persisted_state);

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }
}
