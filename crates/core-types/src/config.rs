//! Application configuration: TOML file plus `VECTORVISTA_*` environment overrides.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "config.toml";
const SESSION_FILE_NAME: &str = "session.json";
const ENV_PREFIX: &str = "VECTORVISTA_";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub server: ServerSection,
    pub search: SearchSection,
    pub voice: VoiceSection,
    pub clipboard: ClipboardSection,
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSection {
    /// Directory holding the persisted session and default exports.
    pub data_dir: String,
}

impl Default for AppSection {
    fn default() -> Self {
        let data_dir = project_dirs()
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".vectorvista"));
        Self {
            data_dir: data_dir.to_string_lossy().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Base URL of the embedding/search service, without the `/api/v1` prefix.
    pub url: String,
    /// Optional per-request timeout. Unset means requests may wait indefinitely.
    pub request_timeout_secs: Option<u64>,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:5000".to_string(),
            request_timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSection {
    pub default_limit: u32,
}

impl Default for SearchSection {
    fn default() -> Self {
        Self { default_limit: 5 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceSection {
    pub language: String,
    /// Speech-to-text command; the transcript is read from its stdout.
    /// Empty disables voice input.
    pub command: Vec<String>,
}

impl Default for VoiceSection {
    fn default() -> Self {
        Self {
            language: "en-US".to_string(),
            command: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipboardSection {
    /// Command receiving clipboard text on stdin (`wl-copy`, `pbcopy`, ...).
    /// Empty prints to stdout instead.
    pub command: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    pub level: String,
    pub format: LogFormat,
    /// Optional log file; rotated daily.
    pub file: Option<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Pretty,
            file: None,
        }
    }
}

impl AppConfig {
    /// Location of the persisted session identifier.
    pub fn session_file(&self) -> PathBuf {
        Path::new(&self.app.data_dir).join(SESSION_FILE_NAME)
    }

    pub fn default_limit(&self) -> crate::Limit {
        crate::Limit::clamped(i64::from(self.search.default_limit))
    }

    /// Apply overrides from a variable lookup (normally `std::env::var`).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}")).filter(|v| !v.is_empty());

        if let Some(url) = var("SERVER_URL") {
            self.server.url = url;
        }
        if let Some(timeout) = var("REQUEST_TIMEOUT_SECS") {
            match timeout.parse() {
                Ok(secs) => self.server.request_timeout_secs = Some(secs),
                Err(_) => tracing::warn!(value = %timeout, "ignoring invalid request timeout"),
            }
        }
        if let Some(dir) = var("DATA_DIR") {
            self.app.data_dir = dir;
        }
        if let Some(limit) = var("DEFAULT_LIMIT") {
            match limit.parse() {
                Ok(n) => self.search.default_limit = n,
                Err(_) => tracing::warn!(value = %limit, "ignoring invalid default limit"),
            }
        }
        if let Some(lang) = var("VOICE_LANGUAGE") {
            self.voice.language = lang;
        }
        if let Some(level) = var("LOG_LEVEL") {
            self.logging.level = level;
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "vectorvista", "vectorvista")
}

/// Default config path: the platform config dir, or `./vectorvista.toml`.
pub fn default_config_path() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from("vectorvista.toml"))
}

/// Load the configuration, writing a default file when none exists, then
/// apply environment overrides.
pub fn load_or_create_config(path: Option<&Path>) -> Result<AppConfig> {
    let path = path.map_or_else(default_config_path, Path::to_path_buf);

    let mut cfg = if path.exists() {
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("read config {}", path.display()))?;
        toml::from_str::<AppConfig>(&raw)
            .with_context(|| format!("parse config {}", path.display()))?
    } else {
        let cfg = AppConfig::default();
        if let Err(err) = write_config(&path, &cfg) {
            // Read-only homes still get a usable default config.
            tracing::warn!(path = %path.display(), error = %err, "could not write default config");
        }
        cfg
    };

    cfg.apply_overrides(|name| std::env::var(name).ok());
    Ok(cfg)
}

fn write_config(path: &Path, cfg: &AppConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create config dir {}", parent.display()))?;
    }
    let body = toml::to_string_pretty(cfg).context("serialize default config")?;
    std::fs::write(path, body).with_context(|| format!("write config {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let cfg = load_or_create_config(Some(&path)).unwrap();
        assert!(path.exists());
        assert_eq!(cfg.search.default_limit, 5);
        assert_eq!(cfg.voice.language, "en-US");
    }

    #[test]
    fn partial_file_fills_remaining_sections() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nurl = \"https://search.example\"\n").unwrap();
        let cfg = load_or_create_config(Some(&path)).unwrap();
        assert_eq!(cfg.logging.level, "warn");
        assert!(cfg.server.request_timeout_secs.is_none());
    }

    #[test]
    fn overrides_replace_file_values() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("VECTORVISTA_SERVER_URL", "https://other.example"),
            ("VECTORVISTA_DEFAULT_LIMIT", "12"),
            ("VECTORVISTA_REQUEST_TIMEOUT_SECS", "not-a-number"),
            ("VECTORVISTA_DATA_DIR", ""),
        ]);
        let mut cfg = AppConfig::default();
        let data_dir = cfg.app.data_dir.clone();
        cfg.apply_overrides(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.server.url, "https://other.example");
        assert_eq!(cfg.search.default_limit, 12);
        assert!(cfg.server.request_timeout_secs.is_none());
        assert_eq!(cfg.app.data_dir, data_dir);
    }

    #[test]
    fn zero_default_limit_is_clamped() {
        let mut cfg = AppConfig::default();
        cfg.search.default_limit = 0;
        assert_eq!(cfg.default_limit().get(), 1);
    }

    #[test]
    fn session_file_lives_in_data_dir() {
        let mut cfg = AppConfig::default();
        cfg.app.data_dir = "/tmp/vv".into();
        assert_eq!(cfg.session_file(), PathBuf::from("/tmp/vv/session.json"));
    }
}
