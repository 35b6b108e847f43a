//! Local filesystem implementation of [`LogStorage`].
//!
//! An archive bundle is a directory named `<application id>.har` whose entries
//! are the bundled node files.

use super::traits::{LogStorage, NodeFile, StorageError};
use chrono::{DateTime, Utc};
use glob::MatchOptions;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::trace;

#[derive(Debug, Clone, Default)]
pub struct LocalStorage;

impl LocalStorage {
    pub fn new() -> Self {
        Self
    }

    fn read_entries(&self, dir: &Path) -> Result<Vec<NodeFile>, StorageError> {
        let entries = fs::read_dir(dir).map_err(|e| StorageError::from_io(dir, e))?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StorageError::from_io(dir, e))?;
            let path = entry.path();
            let metadata = entry
                .metadata()
                .map_err(|e| StorageError::from_io(&path, e))?;
            let modified: DateTime<Utc> = metadata
                .modified()
                .map(DateTime::from)
                .unwrap_or(DateTime::UNIX_EPOCH);
            files.push(NodeFile::new(path, modified));
        }
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }
}

impl LogStorage for LocalStorage {
    type Reader = BufReader<File>;

    fn exists(&self, path: &Path) -> Result<bool, StorageError> {
        match fs::metadata(path) {
            Ok(_) => Ok(true),
            Err(e) => match StorageError::from_io(path, e) {
                StorageError::NotFound { .. } => Ok(false),
                // ENOTDIR has no stable ErrorKind; a regular file earlier in
                // the path means this one cannot exist
                StorageError::Io(_) if path.ancestors().skip(1).any(Path::is_file) => Ok(false),
                other => Err(other),
            },
        }
    }

    fn glob(&self, pattern: &Path) -> Result<Vec<PathBuf>, StorageError> {
        let bad_pattern = |message: String| StorageError::BadPattern {
            pattern: pattern.to_string_lossy().into_owned(),
            message,
        };
        let text = pattern
            .to_str()
            .ok_or_else(|| bad_pattern("not valid UTF-8".to_string()))?;
        let options = MatchOptions {
            require_literal_separator: true,
            ..MatchOptions::new()
        };
        let paths = glob::glob_with(text, options).map_err(|e| bad_pattern(e.to_string()))?;

        let mut found = Vec::new();
        for entry in paths {
            // A directory that cannot be read ends the search, classified like any other io error
            let path = entry.map_err(|e| {
                let dir = e.path().to_path_buf();
                StorageError::from_io(&dir, e.into_error())
            })?;
            found.push(path);
        }
        found.sort();

        trace!(pattern = text, matches = found.len(), "Glob expanded");
        Ok(found)
    }

    fn list_status(&self, dir: &Path) -> Result<Vec<NodeFile>, StorageError> {
        self.read_entries(dir)
    }

    fn list_archive(&self, archive: &Path) -> Result<Vec<NodeFile>, StorageError> {
        let metadata = fs::metadata(archive).map_err(|e| StorageError::from_io(archive, e))?;
        if !metadata.is_dir() {
            return Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("{} is not an archive bundle", archive.display()),
            )));
        }
        self.read_entries(archive)
    }

    fn open(&self, path: &Path) -> Result<Self::Reader, StorageError> {
        let file = File::open(path).map_err(|e| StorageError::from_io(path, e))?;
        let metadata = file.metadata().map_err(|e| StorageError::from_io(path, e))?;
        if metadata.is_dir() {
            return Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} is a directory", path.display()),
            )));
        }
        Ok(BufReader::new(file))
    }
}
