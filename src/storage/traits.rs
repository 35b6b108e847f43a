use chrono::{DateTime, Utc};
use std::io::Read;
use std::path::{Path, PathBuf};

/// One entry of an application log directory: a node's aggregated log file,
/// or an archive bundle that expands into many of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeFile {
    pub path: PathBuf,
    pub modification_time: DateTime<Utc>,
}

impl NodeFile {
    pub fn new(path: impl Into<PathBuf>, modification_time: DateTime<Utc>) -> Self {
        Self {
            path: path.into(),
            modification_time,
        }
    }

    /// Final path component, lossily converted.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Read-only view of the hierarchical store that holds aggregated logs.
pub trait LogStorage {
    type Reader: Read;

    fn exists(&self, path: &Path) -> Result<bool, StorageError>;

    /// Expand a pattern in `glob` syntax, sorted. A wildcard never matches
    /// across a path separator; literal parts should be escaped with
    /// `glob::Pattern::escape`.
    fn glob(&self, pattern: &Path) -> Result<Vec<PathBuf>, StorageError>;

    /// Entries of `dir`, sorted by name.
    fn list_status(&self, dir: &Path) -> Result<Vec<NodeFile>, StorageError>;

    /// Constituent entries of an archive bundle, sorted by name.
    fn list_archive(&self, archive: &Path) -> Result<Vec<NodeFile>, StorageError>;

    fn open(&self, path: &Path) -> Result<Self::Reader, StorageError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("{} does not exist", .path.display())]
    NotFound { path: PathBuf },

    #[error("permission denied accessing {}: {message}", .path.display())]
    AccessDenied { path: PathBuf, message: String },

    #[error("invalid pattern '{pattern}': {message}")]
    BadPattern { pattern: String, message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// Classify an io error raised while touching `path`.
    pub fn from_io(path: &Path, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => StorageError::NotFound {
                path: path.to_path_buf(),
            },
            std::io::ErrorKind::PermissionDenied => StorageError::AccessDenied {
                path: path.to_path_buf(),
                message: err.to_string(),
            },
            _ => StorageError::Io(err),
        }
    }
}
