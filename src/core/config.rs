//! Configuration management for Stagetrack.
//!
//! Handles loading and saving configuration from TOML files.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Name of the per-directory config file.
pub const LOCAL_CONFIG_FILE: &str = ".stagetrack.toml";

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Project page auto refresh
    pub refresh: RefreshConfig,

    /// Output formatting
    pub display: DisplayConfig,
}

/// General application settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Suffix used in page titles
    pub site_title: String,

    /// Prefix all app paths live under (empty for none)
    pub base_path: String,

    /// Project data file; defaults to the user data directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_file: Option<PathBuf>,
}

/// Auto refresh settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// Whether `watch` refreshes at all
    pub enabled: bool,

    /// Seconds between refreshes
    pub interval_secs: u64,
}

/// Output formatting settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// `strftime` format for calendar dates
    pub date_format: String,

    /// Host shown in public project links
    pub public_host: String,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Looks for config in:
    /// 1. `.stagetrack.toml` in current directory
    /// 2. `~/.config/stagetrack/config.toml`
    /// 3. Falls back to defaults
    pub fn load() -> anyhow::Result<Self> {
        match Self::find() {
            Some(path) => Self::load_from_file(&path),
            None => Ok(Self::default()),
        }
    }

    /// The config file [`load`](Self::load) would read, if one exists.
    pub fn find() -> Option<PathBuf> {
        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Some(local_config);
        }

        Self::global_config_path().filter(|path| path.exists())
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Invalid config file {}: {}", path.display(), e))?;
        tracing::debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Save configuration to the global config file.
    pub fn save(&self) -> anyhow::Result<PathBuf> {
        let config_path = Self::global_config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    /// Save configuration to `path`.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the config directory path.
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("stagetrack"))
    }

    /// Get the data directory path.
    pub fn data_dir() -> Option<PathBuf> {
        dirs::data_dir().map(|d| d.join("stagetrack"))
    }

    fn global_config_path() -> Option<PathBuf> {
        Self::config_dir().map(|d| d.join("config.toml"))
    }

    /// Project data file: the configured one, else `<data_dir>/projects.json`.
    pub fn data_file(&self) -> anyhow::Result<PathBuf> {
        if let Some(path) = &self.general.data_file {
            return Ok(path.clone());
        }
        Self::data_dir()
            .map(|d| d.join("projects.json"))
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory; pass --data"))
    }

    /// Refresh interval, or `None` when refresh is off.
    pub fn refresh_interval(&self) -> Option<Duration> {
        (self.refresh.enabled && self.refresh.interval_secs > 0)
            .then(|| Duration::from_secs(self.refresh.interval_secs))
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            site_title: crate::DEFAULT_SITE_TITLE.to_string(),
            base_path: String::new(),
            data_file: None,
        }
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self { enabled: true, interval_secs: 30 }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { date_format: "%b %-d, %Y".to_string(), public_host: "projects.example.com".to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.site_title, "Stagetrack");
        assert!(config.general.base_path.is_empty());
        assert!(config.refresh.enabled);
        assert_eq!(config.refresh.interval_secs, 30);
        assert_eq!(config.refresh_interval(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[refresh]"));
        assert!(toml_str.contains("[display]"));
        assert!(!toml_str.contains("data_file"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            site_title = "Supplement Factory"
            data_file = "/srv/stagetrack/projects.json"

            [refresh]
            interval_secs = 5
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.site_title, "Supplement Factory");
        assert_eq!(config.data_file().unwrap(), PathBuf::from("/srv/stagetrack/projects.json"));
        assert!(config.refresh.enabled);
        assert_eq!(config.refresh_interval(), Some(Duration::from_secs(5)));
        assert_eq!(config.display, DisplayConfig::default());
    }

    #[test]
    fn test_refresh_disabled() {
        let config: Config = toml::from_str("[refresh]\nenabled = false").unwrap();
        assert_eq!(config.refresh_interval(), None);

        let config: Config = toml::from_str("[refresh]\ninterval_secs = 0").unwrap();
        assert_eq!(config.refresh_interval(), None);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stagetrack").join("config.toml");

        let mut config = Config::default();
        config.general.base_path = "/tracker".into();
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_file_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[refresh]\ninterval_secs = \"soon\"").unwrap();

        let err = Config::load_from_file(&path).unwrap_err();
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    #[cfg(target_os = "linux")]
    #[serial_test::serial(xdg_env)]
    fn test_default_data_file_follows_xdg() {
        let original = std::env::var("XDG_DATA_HOME").ok();
        std::env::set_var("XDG_DATA_HOME", "/tmp/stagetrack-xdg");

        let path = Config::default().data_file();

        match original {
            Some(val) => std::env::set_var("XDG_DATA_HOME", val),
            None => std::env::remove_var("XDG_DATA_HOME"),
        }

        assert_eq!(path.unwrap(), PathBuf::from("/tmp/stagetrack-xdg/stagetrack/projects.json"));
    }
}
