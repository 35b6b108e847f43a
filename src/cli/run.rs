use crate::config::{Config, ConfigError};
use crate::dump::diagnostics::current_user;
use crate::dump::paths::ApplicationId;
use crate::dump::{ApplicationIdError, ContainerQuery, DumpError, DumpOutcome, LogFetcher};
use crate::format::FormatError;
use crate::storage::{LocalStorage, LogStorage};
use std::io::Write;
use thiserror::Error;
use tracing::info;

pub use crate::config::Overrides;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    ApplicationId(#[from] ApplicationIdError),

    #[error(transparent)]
    Dump(#[from] DumpError),

    #[error("log format error: {0}")]
    Format(#[from] FormatError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Load the config file (if any) and apply command-line overrides.
pub fn load_settings(overrides: &Overrides) -> Result<Config, RunError> {
    Ok(Config::locate(overrides)?)
}

pub fn fetcher(config: Config) -> LogFetcher<LocalStorage> {
    LogFetcher::new(LocalStorage::new(), config)
}

/// Pick the owner whose directory to read: the resolved owner when the store
/// can tell, otherwise the guess itself.
///
/// `None` means an owner lookup was denied and the notice is already on `err`; the
/// caller reports not-found instead of listing the same directory again.
pub fn effective_owner<S: LogStorage>(
    fetcher: &LogFetcher<S>,
    app_id: &ApplicationId,
    owner: Option<&str>,
    err: &mut dyn Write,
) -> Result<Option<String>, RunError> {
    let guess = owner.map_or_else(current_user, str::to_string);

    // The resolver only writes to its sink when a lookup was denied
    let mut notices = Vec::new();
    let resolved = fetcher.resolve_owner(app_id, &guess, &mut notices)?;
    if !notices.is_empty() {
        err.write_all(&notices)?;
        return Ok(None);
    }

    match resolved {
        Some(resolved) => {
            if resolved != guess {
                info!(guess = %guess, owner = %resolved, "Resolved application owner");
            }
            Ok(Some(resolved))
        }
        None => Ok(Some(guess)),
    }
}

pub struct DumpArgs<'a> {
    pub app_id: &'a str,
    pub container_id: &'a str,
    pub node_id: Option<&'a str>,
    pub log_types: &'a [String],
    pub owner: Option<&'a str>,
}

pub fn dump(
    config: Config,
    args: &DumpArgs<'_>,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<DumpOutcome, RunError> {
    let app_id: ApplicationId = args.app_id.parse()?;
    let fetcher = fetcher(config);
    let Some(owner) = effective_owner(&fetcher, &app_id, args.owner, err)? else {
        return Ok(DumpOutcome::NotFound);
    };

    let query = ContainerQuery {
        app_id: &app_id,
        container_id: args.container_id,
        node_id: args.node_id,
        owner: &owner,
    };
    let outcome = if args.log_types.is_empty() {
        fetcher.dump_container_logs(&query, out, err)?
    } else {
        fetcher.dump_container_logs_for_types(&query, args.log_types, out, err)?
    };
    Ok(outcome)
}

pub fn dump_all(
    config: Config,
    app_id: &str,
    owner: Option<&str>,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<DumpOutcome, RunError> {
    let app_id: ApplicationId = app_id.parse()?;
    let fetcher = fetcher(config);
    let Some(owner) = effective_owner(&fetcher, &app_id, owner, err)? else {
        return Ok(DumpOutcome::NotFound);
    };
    Ok(fetcher.dump_all_containers_logs(&app_id, &owner, out, err)?)
}

pub fn metadata(
    config: Config,
    app_id: &str,
    container_id: Option<&str>,
    node_id: Option<&str>,
    owner: Option<&str>,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<DumpOutcome, RunError> {
    let app_id: ApplicationId = app_id.parse()?;
    let fetcher = fetcher(config);
    let Some(owner) = effective_owner(&fetcher, &app_id, owner, err)? else {
        return Ok(DumpOutcome::NotFound);
    };
    Ok(fetcher.print_log_metadata(&app_id, container_id, node_id, &owner, out, err)?)
}

pub fn nodes(
    config: Config,
    app_id: &str,
    owner: Option<&str>,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<DumpOutcome, RunError> {
    let app_id: ApplicationId = app_id.parse()?;
    let fetcher = fetcher(config);
    let Some(owner) = effective_owner(&fetcher, &app_id, owner, err)? else {
        return Ok(DumpOutcome::NotFound);
    };
    Ok(fetcher.print_nodes_list(&app_id, &owner, out, err)?)
}

/// Print the owner holding the application's logs, without falling back to the guess.
pub fn owner(
    config: Config,
    app_id: &str,
    owner: Option<&str>,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<DumpOutcome, RunError> {
    let app_id: ApplicationId = app_id.parse()?;
    let fetcher = fetcher(config);
    let guess = owner.map_or_else(current_user, str::to_string);

    match fetcher.resolve_owner(&app_id, &guess, err)? {
        Some(resolved) => {
            writeln!(out, "{}", resolved)?;
            Ok(DumpOutcome::Found)
        }
        None => {
            writeln!(
                err,
                "Unable to determine the owner of {} from {}",
                app_id,
                fetcher.config().remote_app_log_dir.display()
            )?;
            Ok(DumpOutcome::NotFound)
        }
    }
}
