use super::{ContainerKey, FormatError, SegmentHeader, MAGIC, VERSION};
use std::io::{self, Read, Write};

const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Outcome of asking a [`SegmentStream`] for its next segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentRead {
    Segment(SegmentHeader),
    EndOfRecord,
}

/// Forward-only reader over the records of one node file.
pub struct LogReader<R> {
    inner: R,
    // Unread bytes of the current record, including any pending payload
    record_remaining: u64,
    payload_remaining: u64,
}

impl<R: Read> LogReader<R> {
    /// Wrap `inner` and validate the file header.
    pub fn new(mut inner: R) -> Result<Self, FormatError> {
        let mut magic = [0u8; 4];
        read_exact_or_corrupt(&mut inner, &mut magic, "file header")?;
        if magic != MAGIC {
            return Err(FormatError::Corrupt(format!(
                "bad magic {:02x?}, not an aggregated log file",
                magic
            )));
        }

        let mut version = [0u8; 4];
        read_exact_or_corrupt(&mut inner, &mut version, "file header")?;
        let version = u32::from_be_bytes(version);
        if version != VERSION {
            return Err(FormatError::Corrupt(format!(
                "unsupported format version {}",
                version
            )));
        }

        Ok(Self {
            inner,
            record_remaining: 0,
            payload_remaining: 0,
        })
    }

    /// Advance to the next record, discarding whatever is left of the current one.
    ///
    /// Returns `None` once the file is exhausted at a record boundary.
    pub fn next_record(
        &mut self,
    ) -> Result<Option<(ContainerKey, SegmentStream<'_, R>)>, FormatError> {
        self.discard_record()?;

        // EOF is only clean on a record boundary; a partial length is truncation
        let mut key_len = [0u8; 2];
        match fill(&mut self.inner, &mut key_len)? {
            0 => return Ok(None),
            2 => {}
            _ => return Err(truncated("record key length")),
        }
        let key_len = u16::from_be_bytes(key_len) as usize;

        let mut key = vec![0u8; key_len];
        read_exact_or_corrupt(&mut self.inner, &mut key, "record key")?;
        let key = String::from_utf8(key)
            .map_err(|_| FormatError::Corrupt("record key is not valid UTF-8".to_string()))?;

        let mut value_len = [0u8; 8];
        read_exact_or_corrupt(&mut self.inner, &mut value_len, "record length")?;
        self.record_remaining = u64::from_be_bytes(value_len);
        self.payload_remaining = 0;

        Ok(Some((ContainerKey::new(key), SegmentStream { reader: self })))
    }

    /// The unread remainder of the current record.
    pub fn segments(&mut self) -> SegmentStream<'_, R> {
        SegmentStream { reader: self }
    }

    fn discard_record(&mut self) -> Result<(), FormatError> {
        let remaining = self.record_remaining;
        self.discard(remaining)?;
        self.record_remaining = 0;
        self.payload_remaining = 0;
        Ok(())
    }

    fn discard(&mut self, count: u64) -> Result<(), FormatError> {
        if count == 0 {
            return Ok(());
        }
        let copied = io::copy(&mut (&mut self.inner).take(count), &mut io::sink())?;
        if copied < count {
            return Err(truncated("record"));
        }
        Ok(())
    }

    /// Read bytes that must lie within the current record.
    fn read_in_record(&mut self, buf: &mut [u8], what: &str) -> Result<(), FormatError> {
        let len = buf.len() as u64;
        if len > self.record_remaining {
            return Err(FormatError::Corrupt(format!("{} overruns its record", what)));
        }
        read_exact_or_corrupt(&mut self.inner, buf, what)?;
        self.record_remaining -= len;
        Ok(())
    }
}

/// The segments of one record, positioned right after its key.
pub struct SegmentStream<'a, R> {
    reader: &'a mut LogReader<R>,
}

impl<R: Read> SegmentStream<'_, R> {
    /// Read the next segment header, skipping any payload left unread.
    pub fn next_segment(&mut self) -> Result<SegmentRead, FormatError> {
        self.skip_payload()?;

        if self.reader.record_remaining == 0 {
            return Ok(SegmentRead::EndOfRecord);
        }

        let mut type_len = [0u8; 2];
        self.reader.read_in_record(&mut type_len, "segment type length")?;
        let mut log_type = vec![0u8; u16::from_be_bytes(type_len) as usize];
        self.reader.read_in_record(&mut log_type, "segment type")?;
        let log_type = String::from_utf8(log_type)
            .map_err(|_| FormatError::Corrupt("segment type is not valid UTF-8".to_string()))?;

        let mut length = [0u8; 8];
        self.reader.read_in_record(&mut length, "segment length")?;
        let length = u64::from_be_bytes(length);
        // Check the declared payload against what the record has left
        if length > self.reader.record_remaining {
            return Err(FormatError::Corrupt(format!(
                "segment '{}' of {} bytes overruns its record",
                log_type, length
            )));
        }
        self.reader.payload_remaining = length;

        Ok(SegmentRead::Segment(SegmentHeader { log_type, length }))
    }

    /// Copy the current segment's unread payload into `out`.
    pub fn copy_payload<W: Write + ?Sized>(&mut self, out: &mut W) -> Result<u64, FormatError> {
        let capacity = self.reader.payload_remaining.min(COPY_BUFFER_SIZE as u64) as usize;
        let mut buf = vec![0u8; capacity];
        let mut copied = 0u64;
        while self.reader.payload_remaining > 0 {
            let want = self.reader.payload_remaining.min(capacity as u64) as usize;
            let n = match self.reader.inner.read(&mut buf[..want]) {
                Ok(0) => return Err(truncated("segment payload")),
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            out.write_all(&buf[..n]).map_err(FormatError::Sink)?;
            self.reader.payload_remaining -= n as u64;
            self.reader.record_remaining -= n as u64;
            copied += n as u64;
        }
        Ok(copied)
    }

    pub fn skip_payload(&mut self) -> Result<(), FormatError> {
        let pending = self.reader.payload_remaining;
        self.reader.discard(pending)?;
        self.reader.payload_remaining = 0;
        self.reader.record_remaining -= pending;
        Ok(())
    }

    /// Consume the rest of the record without interpreting it.
    pub fn skip_to_end(&mut self) -> Result<(), FormatError> {
        self.reader.discard_record()
    }
}

/// Fill `buf` from `reader`, returning how many bytes arrived before EOF.
fn fill<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

fn read_exact_or_corrupt<R: Read>(
    reader: &mut R,
    buf: &mut [u8],
    what: &str,
) -> Result<(), FormatError> {
    if fill(reader, buf)? < buf.len() {
        return Err(truncated(what));
    }
    Ok(())
}

fn truncated(what: &str) -> FormatError {
    FormatError::Corrupt(format!("unexpected end of file in {}", what))
}
