use crate::format::{FormatError, LogReader, SegmentStream};
use std::io::Read;
use tracing::trace;

/// Advance `reader` record by record until `container_id` turns up.
///
/// Records before the match are consumed in full. Returns `None` when the
/// file is exhausted first.
pub fn find_record<'r, R: Read>(
    reader: &'r mut LogReader<R>,
    container_id: &str,
) -> Result<Option<SegmentStream<'r, R>>, FormatError> {
    loop {
        let matched = match reader.next_record()? {
            None => return Ok(None),
            Some((key, mut segments)) => {
                if key.as_str() == container_id {
                    true
                } else {
                    trace!(container = %key, "Skipping record");
                    segments.skip_to_end()?;
                    false
                }
            }
        };

        if matched {
            return Ok(Some(reader.segments()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{LogSegment, LogWriter, SegmentRead};
    use std::io::Cursor;

    fn node_file(records: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = LogWriter::new(Vec::new()).unwrap();
        for (key, stdout) in records {
            writer
                .append(key, &[LogSegment::new("stdout", *stdout)])
                .unwrap();
        }
        writer.finish().unwrap()
    }

    #[test]
    fn test_finds_later_record() {
        let bytes = node_file(&[("container_1", "one"), ("container_2", "two")]);
        let mut reader = LogReader::new(Cursor::new(bytes)).unwrap();

        let mut segments = find_record(&mut reader, "container_2").unwrap().unwrap();
        assert!(matches!(segments.next_segment().unwrap(), SegmentRead::Segment(_)));
        let mut payload = Vec::new();
        segments.copy_payload(&mut payload).unwrap();
        assert_eq!(payload, b"two");
    }

    #[test]
    fn test_missing_record() {
        let bytes = node_file(&[("container_1", "one")]);
        let mut reader = LogReader::new(Cursor::new(bytes)).unwrap();
        assert!(find_record(&mut reader, "container_9").unwrap().is_none());
    }

    #[test]
    fn test_key_prefix_does_not_match() {
        let bytes = node_file(&[("container_10", "ten")]);
        let mut reader = LogReader::new(Cursor::new(bytes)).unwrap();
        assert!(find_record(&mut reader, "container_1").unwrap().is_none());
    }
}
