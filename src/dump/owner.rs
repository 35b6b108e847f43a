use super::diagnostics;
use super::paths::{owner_wildcard, remote_app_log_dir, ApplicationId};
use super::DumpError;
use crate::config::Config;
use crate::storage::{LogStorage, StorageError};
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Determine whose directory actually holds the logs of `app_id`.
///
/// `best_guess` wins when its directory exists. Otherwise every owner level is
/// searched with a wildcard and a single match decides. No match, several
/// matches, or a permission failure on either lookup yields `None`.
pub fn resolve_owner<S: LogStorage>(
    storage: &S,
    config: &Config,
    app_id: &ApplicationId,
    best_guess: &str,
    err: &mut dyn Write,
) -> Result<Option<String>, DumpError> {
    let guessed_dir = remote_app_log_dir(config, app_id, best_guess);
    match storage.exists(&guessed_dir) {
        Ok(true) => {
            debug!(owner = best_guess, "Guessed owner holds the application logs");
            return Ok(Some(best_guess.to_string()));
        }
        Ok(false) => {}
        Err(e) => return denied_or_fatal(e, err, &guessed_dir, best_guess),
    }

    // Match every owner level at once
    let pattern = owner_wildcard(config, app_id);
    let matches = match storage.glob(&pattern) {
        Ok(matches) => matches,
        Err(e) => return denied_or_fatal(e, err, &pattern, best_guess),
    };

    if matches.len() != 1 {
        debug!(
            pattern = %pattern.display(),
            matches = matches.len(),
            "Owner could not be determined unambiguously"
        );
        return Ok(None);
    }

    Ok(owner_from_app_dir(&matches[0], config.suffix().is_some()))
}

/// `<root>/<owner>[/<suffix>]/<app>` -> `<owner>`
fn owner_from_app_dir(app_dir: &Path, has_suffix: bool) -> Option<String> {
    let mut parent = app_dir.parent()?;
    if has_suffix {
        parent = parent.parent()?;
    }
    parent
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
}

fn denied_or_fatal(
    error: StorageError,
    err: &mut dyn Write,
    attempted: &Path,
    best_guess: &str,
) -> Result<Option<String>, DumpError> {
    match error {
        StorageError::AccessDenied { message, .. } => {
            diagnostics::log_dir_no_access_permission(err, attempted, best_guess, &message)?;
            Ok(None)
        }
        other => Err(other.into()),
    }
}
