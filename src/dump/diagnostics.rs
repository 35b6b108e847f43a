//! Operator-facing notices written to the failure sink.
//!
//! Each notice is mirrored as a `warn!` event so it also lands in collected logs.

use std::io::{self, Write};
use std::path::Path;
use tracing::warn;

/// Best-effort name of the user running this process. Never fails.
pub fn current_user() -> String {
    ["USER", "LOGNAME", "USERNAME"]
        .iter()
        .find_map(|var| std::env::var(var).ok().filter(|v| !v.is_empty()))
        .unwrap_or_else(|| "unknown".to_string())
}

pub fn log_dir_not_exist(err: &mut dyn Write, dir: &Path) -> io::Result<()> {
    warn!(dir = %dir.display(), "Application log directory does not exist");
    writeln!(err, "{} does not exist.", dir.display())?;
    writeln!(err, "Log aggregation has not completed or is not enabled.")
}

pub fn log_dir_no_access_permission(
    err: &mut dyn Write,
    dir: &Path,
    owner: &str,
    message: &str,
) -> io::Result<()> {
    let user = current_user();
    warn!(
        dir = %dir.display(),
        owner,
        user = %user,
        error = message,
        "No permission to access application log directory"
    );
    writeln!(
        err,
        "Guessed logs' owner is {} and current user {} does not have permission to access {}. Error message found: {}",
        owner,
        user,
        dir.display(),
        message
    )
}

pub fn container_log_not_found(err: &mut dyn Write, container_id: &str) -> io::Result<()> {
    warn!(container = container_id, "Container logs not found");
    writeln!(
        err,
        "Logs for container {} are not present in this log-file.",
        container_id
    )
}

pub fn empty_log_dir(err: &mut dyn Write, dir: &Path) -> io::Result<()> {
    warn!(dir = %dir.display(), "Application log directory has no log files");
    writeln!(err, "{} does not have any log files.", dir.display())
}

pub fn node_file_unreadable(err: &mut dyn Write, path: &Path, message: &str) -> io::Result<()> {
    warn!(path = %path.display(), error = message, "Skipping unreadable node file");
    writeln!(err, "Unable to read {}: {}", path.display(), message)
}
