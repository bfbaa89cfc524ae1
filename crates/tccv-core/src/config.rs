use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow};

use crate::api::DEFAULT_ENDPOINT;
use crate::cycle::{SendPolicy, DEFAULT_ERROR_TEXT};

/// Environment variable that overrides the configured endpoint
pub const ENDPOINT_ENV: &str = "TCCV_CHAT_ENDPOINT";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub endpoint: Option<String>,
    pub send_policy: Option<SendPolicy>,
    pub error_text: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    pub fn path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("tccv-chat").join("config.json"))
    }

    /// Endpoint to post to: env var first, then config, then the built-in one
    pub fn endpoint(&self) -> String {
        std::env::var(ENDPOINT_ENV)
            .ok()
            .filter(|url| !url.trim().is_empty())
            .or_else(|| self.endpoint.clone())
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
    }

    pub fn send_policy(&self) -> SendPolicy {
        self.send_policy.unwrap_or_default()
    }

    pub fn error_text(&self) -> &str {
        self.error_text.as_deref().unwrap_or(DEFAULT_ERROR_TEXT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("nope.json")).unwrap();

        assert_eq!(config, Config::new());
        assert_eq!(config.send_policy(), SendPolicy::Concurrent);
        assert_eq!(config.error_text(), DEFAULT_ERROR_TEXT);
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            endpoint: Some("http://localhost:7860/query".to_string()),
            send_policy: Some(SendPolicy::Serialized),
            error_text: Some("Send failed.".to_string()),
        };

        config.save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();

        assert_eq!(loaded, config);
        assert_eq!(loaded.send_policy(), SendPolicy::Serialized);
        assert_eq!(loaded.error_text(), "Send failed.");
    }

    #[test]
    fn policy_is_written_in_lowercase() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "send_policy": "serialized" }"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.send_policy, Some(SendPolicy::Serialized));
        assert_eq!(config.endpoint, None);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json").unwrap();

        assert!(Config::load_from(&path).is_err());
    }
}
