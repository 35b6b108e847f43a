use super::diagnostics;
use super::paths::{node_string, remote_app_log_dir, ApplicationId, TMP_FILE_SUFFIX};
use super::DumpError;
use crate::config::Config;
use crate::storage::{LogStorage, NodeFile, StorageError};
use std::collections::VecDeque;
use std::io::Write;
use tracing::{debug, info};

/// Node files of one application in listing order.
///
/// When the application's archive bundle turns up, the rest of the listing
/// is replaced by the bundle's contents. That happens at most once; entries
/// inside the bundle are yielded as they are.
pub struct NodeFiles<'a, S> {
    storage: &'a S,
    archive_name: String,
    pending: VecDeque<NodeFile>,
    expanded: bool,
}

impl<'a, S: LogStorage> NodeFiles<'a, S> {
    pub fn new(storage: &'a S, app_id: &ApplicationId, listing: Vec<NodeFile>) -> Self {
        Self {
            storage,
            archive_name: app_id.archive_name(),
            pending: listing.into(),
            expanded: false,
        }
    }
}

impl<S: LogStorage> Iterator for NodeFiles<'_, S> {
    type Item = Result<NodeFile, StorageError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let node_file = self.pending.pop_front()?;

            if self.expanded || node_file.name() != self.archive_name {
                return Some(Ok(node_file));
            }

            // Swap the rest of the listing for the bundle's contents, once only
            self.expanded = true;
            info!(archive = %node_file.path.display(), "Expanding archived node files");
            match self.storage.list_archive(&node_file.path) {
                Ok(entries) => self.pending = entries.into(),
                Err(e) => {
                    self.pending.clear();
                    return Some(Err(e));
                }
            }
        }
    }
}

/// List the node files of `app_id` under `owner`'s directory.
///
/// A missing or inaccessible directory is reported on `err` and yields `None`.
pub fn list_node_files<'a, S: LogStorage>(
    storage: &'a S,
    config: &Config,
    app_id: &ApplicationId,
    owner: &str,
    err: &mut dyn Write,
) -> Result<Option<NodeFiles<'a, S>>, DumpError> {
    let dir = remote_app_log_dir(config, app_id, owner);
    debug!(dir = %dir.display(), "Listing node files");

    match storage.list_status(&dir) {
        Ok(listing) => Ok(Some(NodeFiles::new(storage, app_id, listing))),
        Err(StorageError::NotFound { .. }) => {
            diagnostics::log_dir_not_exist(err, &dir)?;
            Ok(None)
        }
        Err(StorageError::AccessDenied { message, .. }) => {
            diagnostics::log_dir_no_access_permission(err, &dir, owner, &message)?;
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// Whether a node file may be scanned: its upload is complete and, when a
/// node filter is given, its name carries that node.
pub fn is_eligible(node_file: &NodeFile, node_id: Option<&str>) -> bool {
    let name = node_file.name();
    if name.ends_with(TMP_FILE_SUFFIX) {
        return false;
    }
    match node_id {
        Some(node_id) => name.contains(&node_string(node_id)),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LocalStorage;
    use chrono::Utc;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn app(id: &str) -> ApplicationId {
        id.parse().unwrap()
    }

    fn names(files: NodeFiles<'_, LocalStorage>) -> Vec<String> {
        files.map(|f| f.unwrap().name()).collect()
    }

    #[test]
    fn test_plain_listing() {
        let temp_dir = TempDir::new().unwrap();
        let app_dir = temp_dir.path().join("alice/app_1");
        fs::create_dir_all(&app_dir).unwrap();
        fs::write(app_dir.join("host2_8041"), b"").unwrap();
        fs::write(app_dir.join("host1_8041"), b"").unwrap();

        let storage = LocalStorage::new();
        let config = Config::new(temp_dir.path(), None);
        let mut err = Vec::new();
        let files = list_node_files(&storage, &config, &app("app_1"), "alice", &mut err)
            .unwrap()
            .unwrap();
        assert_eq!(names(files), vec!["host1_8041", "host2_8041"]);
    }

    #[test]
    fn test_archive_replaces_remaining_listing() {
        let temp_dir = TempDir::new().unwrap();
        let app_dir = temp_dir.path().join("alice/app_1");
        let archive = app_dir.join("app_1.har");
        fs::create_dir_all(archive.join("app_1.har")).unwrap();
        fs::write(app_dir.join("a_host"), b"").unwrap();
        fs::write(app_dir.join("z_host"), b"").unwrap();
        fs::write(archive.join("host1_8041"), b"").unwrap();

        let storage = LocalStorage::new();
        let config = Config::new(temp_dir.path(), None);
        let mut err = Vec::new();
        let files = list_node_files(&storage, &config, &app("app_1"), "alice", &mut err)
            .unwrap()
            .unwrap();

        // z_host sorts after the archive and is replaced; the nested bundle is not expanded
        assert_eq!(names(files), vec!["a_host", "app_1.har", "host1_8041"]);
    }

    #[test]
    fn test_archive_failure_is_reported() {
        let storage = LocalStorage::new();
        let listing = vec![NodeFile::new("/nonexistent/app_1.har", Utc::now())];
        let mut files = NodeFiles::new(&storage, &app("app_1"), listing);
        assert!(matches!(files.next(), Some(Err(_))));
        assert!(files.next().is_none());
    }

    #[test]
    fn test_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new();
        let config = Config::new(temp_dir.path(), None);

        let mut err = Vec::new();
        let files = list_node_files(&storage, &config, &app("app_2"), "alice", &mut err).unwrap();
        assert!(files.is_none());
        let text = String::from_utf8(err).unwrap();
        assert!(text.contains("does not exist"));
        assert!(text.contains("Log aggregation has not completed or is not enabled."));
    }

    #[test]
    fn test_eligibility() {
        let now = Utc::now();
        let file = |name: &str| NodeFile::new(Path::new("/d").join(name), now);

        assert!(is_eligible(&file("host1_8041"), None));
        assert!(!is_eligible(&file("host1_8041.tmp"), None));
        assert!(is_eligible(&file("host1_8041"), Some("host1:8041")));
        assert!(!is_eligible(&file("host2_8041"), Some("host1:8041")));
        assert!(!is_eligible(&file("host1_8041.tmp"), Some("host1")));
    }
}
