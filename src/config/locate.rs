//! Finding the settings file and layering command-line overrides on top of it.

use super::parse::{load_config, validate_config, ConfigError};
use super::types::Config;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

/// Per-user settings file, relative to the home directory.
const USER_CONFIG: &str = ".config/applogs/config.yml";
const SYSTEM_CONFIG: &str = "/etc/applogs/config.yml";

/// Settings given on the command line that shape the effective config.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub config_path: Option<PathBuf>,
    pub log_root: Option<PathBuf>,
    pub suffix: Option<String>,
}

impl Config {
    /// The effective config: the settings file when one is found, the
    /// defaults otherwise, then the log root and suffix overrides.
    pub fn locate(overrides: &Overrides) -> Result<Config, ConfigError> {
        let mut config = match config_file(overrides.config_path.as_deref()) {
            Some(path) => {
                info!(config_path = %path.display(), "Loading configuration");
                load_config(&path)?
            }
            None => {
                debug!("No config file found, using defaults");
                Config::default()
            }
        };

        if let Some(root) = &overrides.log_root {
            config.remote_app_log_dir = home_relative(root);
        }
        if let Some(suffix) = &overrides.suffix {
            config.remote_app_log_dir_suffix = Some(suffix.clone());
        }
        // Overrides bypass parsing, so the merged result is checked again
        validate_config(&config)?;

        Ok(config)
    }
}

/// The settings file to read. An explicit path is taken as given, even when
/// missing; otherwise the per-user file, then the system one, if present.
pub fn config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(home_relative(path));
    }

    dirs::home_dir()
        .map(|home| home.join(USER_CONFIG))
        .into_iter()
        .chain([PathBuf::from(SYSTEM_CONFIG)])
        .find(|candidate| candidate.is_file())
}

/// Where `config init` writes. Without a home directory, the system file.
pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(USER_CONFIG))
        .unwrap_or_else(|| PathBuf::from(SYSTEM_CONFIG))
}

/// Replace a leading `~` component with the home directory.
pub fn home_relative(path: &Path) -> PathBuf {
    let mut components = path.components();
    match (components.next(), dirs::home_dir()) {
        (Some(Component::Normal(first)), Some(home)) if first == "~" => {
            home.join(components.as_path())
        }
        _ => path.to_path_buf(),
    }
}
