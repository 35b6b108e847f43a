use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default root of the aggregated log tree.
pub const DEFAULT_REMOTE_APP_LOG_DIR: &str = "/tmp/logs";

/// Default directory-naming suffix inserted between owner and application.
pub const DEFAULT_REMOTE_APP_LOG_DIR_SUFFIX: &str = "logs";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_remote_app_log_dir")]
    pub remote_app_log_dir: PathBuf,
    #[serde(default = "default_remote_app_log_dir_suffix")]
    pub remote_app_log_dir_suffix: Option<String>,
}

fn default_remote_app_log_dir() -> PathBuf {
    PathBuf::from(DEFAULT_REMOTE_APP_LOG_DIR)
}

fn default_remote_app_log_dir_suffix() -> Option<String> {
    Some(DEFAULT_REMOTE_APP_LOG_DIR_SUFFIX.to_string())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            remote_app_log_dir: default_remote_app_log_dir(),
            remote_app_log_dir_suffix: default_remote_app_log_dir_suffix(),
        }
    }
}

impl Config {
    pub fn new(remote_app_log_dir: impl Into<PathBuf>, suffix: Option<&str>) -> Self {
        Self {
            remote_app_log_dir: remote_app_log_dir.into(),
            remote_app_log_dir_suffix: suffix.map(str::to_string),
        }
    }

    /// The suffix, with empty strings treated as absent.
    pub fn suffix(&self) -> Option<&str> {
        self.remote_app_log_dir_suffix
            .as_deref()
            .filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_suffix_is_none() {
        let config = Config::new("/logs", Some(""));
        assert_eq!(config.suffix(), None);
    }

    #[test]
    fn test_defaults() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.suffix(), Some("logs"));
    }

    #[test]
    fn test_null_suffix() {
        let config: Config =
            serde_yaml::from_str("remote_app_log_dir: /logs\nremote_app_log_dir_suffix: null\n")
                .unwrap();
        assert_eq!(config.remote_app_log_dir, PathBuf::from("/logs"));
        assert_eq!(config.suffix(), None);
    }
}
