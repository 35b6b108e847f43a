use super::{FormatError, LogSegment, MAGIC, VERSION};
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Appends container records to an aggregated log file.
pub struct LogWriter<W: Write> {
    inner: W,
}

impl<W: Write> LogWriter<W> {
    /// Wrap `inner` and write the file header.
    pub fn new(mut inner: W) -> Result<Self, FormatError> {
        inner.write_all(&MAGIC)?;
        inner.write_all(&VERSION.to_be_bytes())?;
        Ok(Self { inner })
    }

    pub fn append(&mut self, key: &str, segments: &[LogSegment]) -> Result<(), FormatError> {
        let key_len = encoded_len(key, "container key")?;

        let mut value_len = 0u64;
        for segment in segments {
            encoded_len(&segment.log_type, "segment type")?;
            value_len += 2 + segment.log_type.len() as u64 + 8 + segment.data.len() as u64;
        }

        self.inner.write_all(&key_len.to_be_bytes())?;
        self.inner.write_all(key.as_bytes())?;
        self.inner.write_all(&value_len.to_be_bytes())?;
        for segment in segments {
            self.inner
                .write_all(&(segment.log_type.len() as u16).to_be_bytes())?;
            self.inner.write_all(segment.log_type.as_bytes())?;
            self.inner
                .write_all(&(segment.data.len() as u64).to_be_bytes())?;
            self.inner.write_all(&segment.data)?;
        }

        Ok(())
    }

    /// Append one record whose segments are the regular files of a container's
    /// log directory, named by file name, in name order. Returns the segment count.
    pub fn append_container_dir(&mut self, key: &str, dir: &Path) -> Result<usize, FormatError> {
        let mut paths = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                paths.push(entry.path());
            }
        }
        paths.sort();

        let mut segments = Vec::with_capacity(paths.len());
        for path in paths {
            let log_type = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            segments.push(LogSegment::new(log_type, fs::read(&path)?));
        }

        debug!(
            container = key,
            dir = %dir.display(),
            segments = segments.len(),
            "Appending container log directory"
        );
        self.append(key, &segments)?;
        Ok(segments.len())
    }

    /// Flush and hand back the underlying writer.
    pub fn finish(mut self) -> Result<W, FormatError> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

fn encoded_len(text: &str, what: &str) -> Result<u16, FormatError> {
    u16::try_from(text.len()).map_err(|_| {
        FormatError::Encode(format!(
            "{} is {} bytes, longer than {}",
            what,
            text.len(),
            u16::MAX
        ))
    })
}
