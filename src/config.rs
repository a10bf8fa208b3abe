// Configuration loaded from YAML with environment overrides

use crate::clipboard::CommandClipboard;
use crate::storage::StorageKind;
use eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const ENDPOINT_ENV: &str = "PRINT_INBOX_ENDPOINT";
pub const TOKEN_ENV: &str = "PRINT_INBOX_TOKEN";

const DEFAULT_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote sync endpoint; absent or blank disables sync
    pub endpoint: Option<String>,
    /// Bearer token sent with every remote call
    pub token: Option<String>,
    pub timeout_secs: u64,
    pub storage: StorageKind,
    /// Where local state lives (default: `<data dir>/print-inbox`)
    pub data_dir: Option<PathBuf>,
    pub clipboard_command: Option<CommandClipboard>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: None,
            token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            storage: StorageKind::default(),
            data_dir: None,
            clipboard_command: None,
        }
    }
}

impl Config {
    /// Default location: `<config dir>/print-inbox/config.yaml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("print-inbox").join("config.yaml"))
    }

    /// Load from `path`, or the default path; a missing default file yields defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => {
                    debug!("No config file, using defaults");
                    Self::default()
                }
            },
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).with_context(|| format!("Failed to read config file {:?}", path))?;
        let config: Config =
            serde_yaml::from_str(&content).with_context(|| format!("Failed to parse config file {:?}", path))?;
        debug!(file = ?path, "Loaded config");
        Ok(config)
    }

    /// Override endpoint and token from the environment lookup `var`
    pub fn apply_env<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = var(ENDPOINT_ENV) {
            self.endpoint = Some(endpoint);
        }
        if let Some(token) = var(TOKEN_ENV) {
            self.token = Some(token);
        }
    }

    /// Configured endpoint with blanks treated as absent
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref().map(str::trim).filter(|e| !e.is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => dirs::data_dir()
                .map(|d| d.join("print-inbox"))
                .ok_or_else(|| eyre!("No data directory available; set data_dir in the config")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.endpoint(), None);
        assert_eq!(config.storage, StorageKind::File);
        assert_eq!(config.timeout(), Duration::from_secs(15));
    }

    #[test]
    fn test_from_yaml_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        fs::write(
            &path,
            r#"
endpoint: https://script.example.com/exec
token: abc123
storage: sqlite
data_dir: /tmp/print-inbox
clipboard_command:
  program: xclip
  args: ["-selection", "clipboard"]
"#,
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.endpoint(), Some("https://script.example.com/exec"));
        assert_eq!(config.storage, StorageKind::Sqlite);
        assert_eq!(config.timeout_secs, 15);
        assert_eq!(config.data_dir().unwrap(), PathBuf::from("/tmp/print-inbox"));
        assert_eq!(config.clipboard_command.unwrap().args, vec!["-selection", "clipboard"]);
    }

    #[test]
    fn test_invalid_yaml_is_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        fs::write(&path, "storage: floppy\n").unwrap();
        assert!(Config::from_file(&path).is_err());
        assert!(Config::from_file(&temp.path().join("missing.yaml")).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([(ENDPOINT_ENV, "https://override/exec"), (TOKEN_ENV, "t0k")]);
        let mut config = Config {
            endpoint: Some("https://file/exec".to_string()),
            ..Default::default()
        };
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.endpoint(), Some("https://override/exec"));
        assert_eq!(config.token.as_deref(), Some("t0k"));
    }

    #[test]
    fn test_blank_endpoint_disables_sync() {
        let config = Config {
            endpoint: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(config.endpoint(), None);
    }
}
