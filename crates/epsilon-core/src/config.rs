use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Result, anyhow};

use crate::controller::DelayWindow;
use crate::render::{RenderOptions, DEFAULT_ASSISTANT_NAME, DEFAULT_LOGO_SRC};
use crate::toast::ToastTimings;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    pub toast_ms: u64,
    pub toast_fade_ms: u64,
    pub assistant_name: String,
    pub logo_src: String,
    /// Fixed seed for the fallback picker; random when unset
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            min_delay_ms: 1500,
            max_delay_ms: 3000,
            toast_ms: 2000,
            toast_fade_ms: 300,
            assistant_name: DEFAULT_ASSISTANT_NAME.to_string(),
            logo_src: DEFAULT_LOGO_SRC.to_string(),
            seed: None,
        }
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(config_path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<PathBuf> {
        let config_path = Self::get_config_path()?;
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(config_path, config_content)?;
        Ok(())
    }

    pub fn delay_window(&self) -> Result<DelayWindow> {
        DelayWindow::new(
            Duration::from_millis(self.min_delay_ms),
            Duration::from_millis(self.max_delay_ms),
        )
    }

    pub fn toast_timings(&self) -> ToastTimings {
        ToastTimings {
            visible: Duration::from_millis(self.toast_ms),
            fade: Duration::from_millis(self.toast_fade_ms),
        }
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            assistant_name: self.assistant_name.clone(),
            logo_src: self.logo_src.clone(),
        }
    }

    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("epsilon-chat"))
    }

    fn get_config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("nope.json")).unwrap();
        assert_eq!(config, Config::new());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let mut config = Config::new();
        config.seed = Some(99);
        config.assistant_name = "Delta".to_string();
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "min_delay_ms": 10, "max_delay_ms": 20 }"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.min_delay_ms, 10);
        assert_eq!(config.toast_ms, 2000);
        assert_eq!(config.assistant_name, "Epsilon AI");
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_inverted_delay_rejected() {
        let mut config = Config::new();
        config.min_delay_ms = 3000;
        config.max_delay_ms = 3000;
        assert!(config.delay_window().is_err());
    }

    #[test]
    fn test_toast_timings() {
        assert_eq!(Config::new().toast_timings().lifetime(), Duration::from_millis(2300));
    }
}
