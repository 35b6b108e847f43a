use super::locate::home_relative;
use super::types::Config;
use regex::{Captures, Regex};
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// `$env{NAME}` reference inside a config document.
const ENV_REFERENCE: &str = r"\$env\{([A-Za-z_][A-Za-z0-9_]*)\}";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("environment variables referenced by the config are not set: {}", .0.join(", "))]
    UnsetVariables(Vec<String>),

    #[error("invalid environment reference pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("validation failed:\n{}", .0.join("\n"))]
    ValidationList(Vec<String>),
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&text)
}

/// Parse a config document. Environment references are substituted first and
/// a leading `~` in the log root is expanded afterwards.
pub fn parse_config(yaml: &str) -> Result<Config, ConfigError> {
    let yaml = substitute_env(yaml)?;

    // An empty document is a valid config with every default applied
    let mut config: Config = if yaml.trim().is_empty() {
        Config::default()
    } else {
        serde_yaml::from_str(&yaml)?
    };
    config.remote_app_log_dir = home_relative(&config.remote_app_log_dir);

    validate_config(&config)?;
    Ok(config)
}

/// Replace every `$env{NAME}` with the variable's value in one pass. Any
/// unset name fails the whole document, listing every missing name once.
fn substitute_env(text: &str) -> Result<String, ConfigError> {
    let reference = Regex::new(ENV_REFERENCE)?;
    let mut unset = Vec::new();

    let substituted = reference.replace_all(text, |caps: &Captures<'_>| {
        std::env::var(&caps[1]).unwrap_or_else(|_| {
            unset.push(caps[1].to_string());
            String::new()
        })
    });
    let substituted = substituted.into_owned();

    if unset.is_empty() {
        return Ok(substituted);
    }
    unset.sort();
    unset.dedup();
    Err(ConfigError::UnsetVariables(unset))
}

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    if config.remote_app_log_dir.as_os_str().is_empty() {
        errors.push("remote_app_log_dir cannot be empty".to_string());
    }

    if let Some(suffix) = config.suffix() {
        let mut components = Path::new(suffix).components();
        let single_normal = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        if !single_normal {
            errors.push(format!(
                "remote_app_log_dir_suffix '{}' must be a single path segment",
                suffix
            ));
        }
        if suffix.contains(['*', '?']) {
            errors.push(format!(
                "remote_app_log_dir_suffix '{}' cannot contain wildcards",
                suffix
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationList(errors))
    }
}
