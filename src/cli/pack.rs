use super::run::RunError;
use crate::dump::paths::TMP_FILE_SUFFIX;
use crate::format::LogWriter;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Parse a `<container id>=<log dir>` argument.
pub fn parse_container_spec(spec: &str) -> Result<(String, PathBuf), RunError> {
    match spec.split_once('=') {
        Some((id, dir)) if !id.is_empty() && !dir.is_empty() => {
            Ok((id.to_string(), PathBuf::from(dir)))
        }
        _ => Err(RunError::InvalidArgument(format!(
            "expected <container id>=<log dir>, got '{}'",
            spec
        ))),
    }
}

/// Write one node file holding a record per container log directory.
///
/// The file is written under a temporary-upload name and renamed into place
/// once complete, so readers never scan a partial file.
pub fn pack(output: &Path, containers: &[String], out: &mut dyn Write) -> Result<(), RunError> {
    let specs = containers
        .iter()
        .map(String::as_str)
        .map(parse_container_spec)
        .collect::<Result<Vec<_>, _>>()?;

    let mut tmp_name = OsString::from(output.as_os_str());
    tmp_name.push(TMP_FILE_SUFFIX);
    let tmp_path = PathBuf::from(tmp_name);

    let written = write_node_file(&tmp_path, &specs);
    let segments = match written {
        Ok(segments) => segments,
        Err(e) => {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }
    };
    fs::rename(&tmp_path, output)?;

    info!(output = %output.display(), containers = specs.len(), segments, "Node file written");
    writeln!(
        out,
        "Wrote {} containers ({} log files) to {}",
        specs.len(),
        segments,
        output.display()
    )?;
    Ok(())
}

fn write_node_file(path: &Path, specs: &[(String, PathBuf)]) -> Result<usize, RunError> {
    let file = File::create(path)?;
    let mut writer = LogWriter::new(BufWriter::new(file))?;
    let mut segments = 0;
    for (container_id, dir) in specs {
        segments += writer.append_container_dir(container_id, dir)?;
    }
    writer.finish()?;
    Ok(segments)
}
