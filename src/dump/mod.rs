//! Retrieval of aggregated container logs.
//!
//! Every operation resolves the application log directory, walks its node
//! files in listing order and scans each file's records front to back. A node
//! file's reader is opened right before its scan and dropped before the next
//! file is touched.

pub mod diagnostics;
pub mod node_files;
pub mod owner;
pub mod paths;
pub mod printer;
pub mod scanner;

use crate::config::Config;
use crate::format::{FormatError, LogReader};
use crate::storage::{LogStorage, NodeFile, StorageError};
use chrono::{DateTime, Utc};
use node_files::{is_eligible, list_node_files};
use paths::{remote_app_log_dir, ApplicationId};
use std::io::{Read, Write};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

pub use owner::resolve_owner;
pub use paths::ApplicationIdError;

#[derive(Debug, Error)]
pub enum DumpError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("failed reading {}: {source}", .path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: FormatError,
    },

    #[error("output error: {0}")]
    Output(#[from] std::io::Error),
}

/// Result of a retrieval: whether anything matching was found and emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpOutcome {
    Found,
    NotFound,
}

impl DumpOutcome {
    pub fn from_found(found: bool) -> Self {
        if found {
            DumpOutcome::Found
        } else {
            DumpOutcome::NotFound
        }
    }

    pub fn is_found(self) -> bool {
        self == DumpOutcome::Found
    }

    /// 0 when found, -1 otherwise.
    pub fn code(self) -> i32 {
        match self {
            DumpOutcome::Found => 0,
            DumpOutcome::NotFound => -1,
        }
    }
}

/// Selects one container's record, optionally on a single node.
#[derive(Debug, Clone)]
pub struct ContainerQuery<'a> {
    pub app_id: &'a ApplicationId,
    pub container_id: &'a str,
    pub node_id: Option<&'a str>,
    pub owner: &'a str,
}

pub struct LogFetcher<S> {
    storage: S,
    config: Config,
}

impl<S: LogStorage> LogFetcher<S> {
    pub fn new(storage: S, config: Config) -> Self {
        Self { storage, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn resolve_owner(
        &self,
        app_id: &ApplicationId,
        best_guess: &str,
        err: &mut dyn Write,
    ) -> Result<Option<String>, DumpError> {
        resolve_owner(&self.storage, &self.config, app_id, best_guess, err)
    }

    /// Print every segment of one container's record.
    pub fn dump_container_logs(
        &self,
        query: &ContainerQuery<'_>,
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> Result<DumpOutcome, DumpError> {
        self.dump_container_logs_with(query, None, true, out, err)
    }

    /// Print only the segments of one container's record whose type is in `log_types`.
    pub fn dump_container_logs_for_types(
        &self,
        query: &ContainerQuery<'_>,
        log_types: &[String],
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> Result<DumpOutcome, DumpError> {
        self.dump_container_logs_with(query, Some(log_types), true, out, err)
    }

    /// Shared body of the single-container dumps. With `report_missing` unset a
    /// miss is returned silently.
    pub fn dump_container_logs_with(
        &self,
        query: &ContainerQuery<'_>,
        log_types: Option<&[String]>,
        report_missing: bool,
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> Result<DumpOutcome, DumpError> {
        let Some(node_files) =
            list_node_files(&self.storage, &self.config, query.app_id, query.owner, err)?
        else {
            return Ok(DumpOutcome::NotFound);
        };

        let mut found = false;
        for node_file in node_files {
            let node_file = node_file?;
            if !is_eligible(&node_file, query.node_id) {
                continue;
            }
            let Some(mut reader) = self.open_node_file(&node_file, err)? else {
                continue;
            };

            debug!(
                node_file = %node_file.path.display(),
                container = query.container_id,
                "Scanning node file for container"
            );
            // Scan and release this file before the next is opened
            let scanned = scan_for_container(
                &mut reader,
                query.container_id,
                out,
                node_file.modification_time,
                log_types,
            );
            drop(reader);

            let outcome = scanned.map_err(|source| scan_failure(&node_file, source))?;
            found |= outcome.is_found();
        }

        if !found && report_missing {
            diagnostics::container_log_not_found(err, query.container_id)?;
        }
        Ok(DumpOutcome::from_found(found))
    }

    /// Print every record of every node file, each under a container banner.
    pub fn dump_all_containers_logs(
        &self,
        app_id: &ApplicationId,
        owner: &str,
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> Result<DumpOutcome, DumpError> {
        let Some(node_files) = list_node_files(&self.storage, &self.config, app_id, owner, err)?
        else {
            return Ok(DumpOutcome::NotFound);
        };

        let mut found_any = false;
        for node_file in node_files {
            let node_file = node_file?;
            if !is_eligible(&node_file, None) {
                continue;
            }
            let Some(mut reader) = self.open_node_file(&node_file, err)? else {
                continue;
            };

            let scanned = dump_every_record(&mut reader, &node_file, out);
            drop(reader);

            found_any |= scanned.map_err(|source| scan_failure(&node_file, source))?;
        }

        if !found_any {
            diagnostics::empty_log_dir(err, &remote_app_log_dir(&self.config, app_id, owner))?;
        }
        Ok(DumpOutcome::from_found(found_any))
    }

    /// Print segment types and lengths, without payloads, for one container or
    /// for all of them, optionally restricted to one node.
    pub fn print_log_metadata(
        &self,
        app_id: &ApplicationId,
        container_id: Option<&str>,
        node_id: Option<&str>,
        owner: &str,
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> Result<DumpOutcome, DumpError> {
        let Some(node_files) = list_node_files(&self.storage, &self.config, app_id, owner, err)?
        else {
            return Ok(DumpOutcome::NotFound);
        };

        let mut found_any = false;
        for node_file in node_files {
            let node_file = node_file?;
            if !is_eligible(&node_file, node_id) {
                continue;
            }
            let Some(mut reader) = self.open_node_file(&node_file, err)? else {
                continue;
            };

            let scanned = dump_record_metadata(&mut reader, &node_file, container_id, out);
            drop(reader);

            found_any |= scanned.map_err(|source| scan_failure(&node_file, source))?;
        }

        if !found_any {
            match (container_id, node_id) {
                (Some(container_id), Some(node_id)) => writeln!(
                    err,
                    "The container {} couldn't be found on the node specified: {}",
                    container_id, node_id
                )?,
                (None, Some(node_id)) => writeln!(
                    err,
                    "Can not find log metadata for any containers on {}",
                    node_id
                )?,
                (Some(container_id), None) => writeln!(
                    err,
                    "Can not find log metadata for container: {}",
                    container_id
                )?,
                (None, None) => diagnostics::empty_log_dir(
                    err,
                    &remote_app_log_dir(&self.config, app_id, owner),
                )?,
            }
        }
        Ok(DumpOutcome::from_found(found_any))
    }

    /// Print the name of every node file of the application, one per line.
    pub fn print_nodes_list(
        &self,
        app_id: &ApplicationId,
        owner: &str,
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> Result<DumpOutcome, DumpError> {
        let Some(node_files) = list_node_files(&self.storage, &self.config, app_id, owner, err)?
        else {
            return Ok(DumpOutcome::NotFound);
        };

        let mut names = Vec::new();
        for node_file in node_files {
            names.push(node_file?.name());
        }

        if names.is_empty() {
            writeln!(
                err,
                "No nodes found that aggregated logs for the application: {}",
                app_id
            )?;
            return Ok(DumpOutcome::NotFound);
        }

        for name in &names {
            writeln!(out, "{}", name)?;
        }
        Ok(DumpOutcome::Found)
    }

    /// Open one node file. A file that cannot be opened is reported and skipped;
    /// a file whose header is corrupt aborts the operation.
    fn open_node_file(
        &self,
        node_file: &NodeFile,
        err: &mut dyn Write,
    ) -> Result<Option<LogReader<S::Reader>>, DumpError> {
        let inner = match self.storage.open(&node_file.path) {
            Ok(inner) => inner,
            Err(e) => {
                diagnostics::node_file_unreadable(err, &node_file.path, &e.to_string())?;
                return Ok(None);
            }
        };

        info!(node_file = %node_file.path.display(), "Opened node file");
        LogReader::new(inner)
            .map(Some)
            .map_err(|source| scan_failure(node_file, source))
    }
}

/// Blame the node file for read failures, but not for a failing output sink.
fn scan_failure(node_file: &NodeFile, source: FormatError) -> DumpError {
    match source {
        FormatError::Sink(e) => DumpError::Output(e),
        source => DumpError::Format {
            path: node_file.path.clone(),
            source,
        },
    }
}

fn scan_for_container<R: Read>(
    reader: &mut LogReader<R>,
    container_id: &str,
    out: &mut dyn Write,
    upload_time: DateTime<Utc>,
    log_types: Option<&[String]>,
) -> Result<DumpOutcome, FormatError> {
    match scanner::find_record(reader, container_id)? {
        Some(mut segments) => printer::dump_segments(&mut segments, out, upload_time, log_types),
        None => Ok(DumpOutcome::NotFound),
    }
}

/// Dump every record of one node file under a banner per container.
/// Returns whether any segment was emitted.
fn dump_every_record<R: Read>(
    reader: &mut LogReader<R>,
    node_file: &NodeFile,
    out: &mut dyn Write,
) -> Result<bool, FormatError> {
    let node_name = node_file.name();
    let mut found = false;
    while let Some((key, mut segments)) = reader.next_record()? {
        printer::write_container_header(out, key.as_str(), &node_name, None)
            .map_err(FormatError::Sink)?;
        let outcome =
            printer::dump_segments(&mut segments, out, node_file.modification_time, None)?;
        found |= outcome.is_found();
    }
    Ok(found)
}

/// Print metadata for the matching records of one node file; the first match
/// ends the scan when a single container is requested.
fn dump_record_metadata<R: Read>(
    reader: &mut LogReader<R>,
    node_file: &NodeFile,
    container_id: Option<&str>,
    out: &mut dyn Write,
) -> Result<bool, FormatError> {
    let node_name = node_file.name();
    let mut found = false;
    while let Some((key, mut segments)) = reader.next_record()? {
        if container_id.is_some_and(|id| id != key.as_str()) {
            continue;
        }
        printer::write_container_header(
            out,
            key.as_str(),
            &node_name,
            Some(node_file.modification_time),
        )
        .map_err(FormatError::Sink)?;
        printer::dump_metadata(&mut segments, out)?;
        found = true;
        if container_id.is_some() {
            break;
        }
    }
    Ok(found)
}
