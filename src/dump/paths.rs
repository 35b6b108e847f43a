use crate::config::Config;
use glob::Pattern;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Name suffix of a node file whose upload is still in progress.
pub const TMP_FILE_SUFFIX: &str = ".tmp";

/// Extension of the archive bundle named after an application.
pub const ARCHIVE_SUFFIX: &str = ".har";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApplicationIdError {
    #[error("application id cannot be empty")]
    Empty,

    #[error("invalid application id '{0}': must be a single path segment without wildcards")]
    Invalid(String),
}

/// Opaque identifier of one distributed job.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ApplicationId(String);

impl ApplicationId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name of this application's archive bundle.
    pub fn archive_name(&self) -> String {
        format!("{}{}", self.0, ARCHIVE_SUFFIX)
    }
}

impl FromStr for ApplicationId {
    type Err = ApplicationIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ApplicationIdError::Empty);
        }
        if s == "." || s == ".." || s.contains(['/', '\\', '*', '?']) {
            return Err(ApplicationIdError::Invalid(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `<root>/<owner>[/<suffix>]/<application id>`
pub fn remote_app_log_dir(config: &Config, app_id: &ApplicationId, owner: &str) -> PathBuf {
    let mut path = config.remote_app_log_dir.join(owner);
    if let Some(suffix) = config.suffix() {
        path.push(suffix);
    }
    path.push(app_id.as_str());
    path
}

/// `remote_app_log_dir` with the owner level replaced by `*`, every literal
/// part escaped for glob matching.
pub fn owner_wildcard(config: &Config, app_id: &ApplicationId) -> PathBuf {
    let literal = |text: &str| Pattern::escape(text);
    let mut pattern = PathBuf::from(literal(&config.remote_app_log_dir.to_string_lossy()));
    pattern.push("*");
    if let Some(suffix) = config.suffix() {
        pattern.push(literal(suffix));
    }
    pattern.push(literal(app_id.as_str()));
    pattern
}

/// Node files embed the node id with `:` replaced by `_`.
pub fn node_string(node_id: &str) -> String {
    node_id.replace(':', "_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn app(id: &str) -> ApplicationId {
        id.parse().unwrap()
    }

    #[test]
    fn test_path_without_suffix() {
        let config = Config::new("/logs", None);
        assert_eq!(
            remote_app_log_dir(&config, &app("app_1"), "alice"),
            Path::new("/logs/alice/app_1")
        );
    }

    #[test]
    fn test_path_with_suffix() {
        let config = Config::new("/logs", Some("logs-tfile"));
        assert_eq!(
            remote_app_log_dir(&config, &app("app_1"), "alice"),
            Path::new("/logs/alice/logs-tfile/app_1")
        );
    }

    #[test]
    fn test_empty_suffix_is_skipped() {
        let config = Config::new("/logs", Some(""));
        assert_eq!(
            remote_app_log_dir(&config, &app("app_1"), "*"),
            Path::new("/logs/*/app_1")
        );
    }

    #[test]
    fn test_owner_wildcard_escapes_literals() {
        let config = Config::new("/logs[old]", Some("logs"));
        assert_eq!(
            owner_wildcard(&config, &app("app_1")),
            Path::new("/logs[[]old[]]/*/logs/app_1")
        );
    }

    #[test]
    fn test_application_id_validation() {
        assert_eq!("".parse::<ApplicationId>(), Err(ApplicationIdError::Empty));
        assert!("a/b".parse::<ApplicationId>().is_err());
        assert!("app_*".parse::<ApplicationId>().is_err());
        assert!("..".parse::<ApplicationId>().is_err());
        assert_eq!(app("application_1_0001").archive_name(), "application_1_0001.har");
    }

    #[test]
    fn test_node_string() {
        assert_eq!(node_string("host1:8041"), "host1_8041");
        assert_eq!(node_string("host1"), "host1");
    }
}
