//! Rendering of record segments: full log content or metadata only.

use super::DumpOutcome;
use crate::format::{FormatError, SegmentRead, SegmentStream};
use chrono::{DateTime, Utc};
use std::io::{Read, Write};

pub fn format_upload_time(time: DateTime<Utc>) -> String {
    time.format("%a %b %d %H:%M:%S %Z %Y").to_string()
}

/// Emit every segment of a positioned record until its end, optionally
/// keeping only the segments whose type is in `log_types`.
///
/// Skipped segments are still consumed so the stream stays aligned.
pub fn dump_segments<R: Read>(
    segments: &mut SegmentStream<'_, R>,
    out: &mut dyn Write,
    upload_time: DateTime<Utc>,
    log_types: Option<&[String]>,
) -> Result<DumpOutcome, FormatError> {
    let mut found = false;
    loop {
        let header = match segments.next_segment()? {
            SegmentRead::Segment(header) => header,
            SegmentRead::EndOfRecord => break,
        };

        let wanted = log_types.map_or(true, |types| types.iter().any(|t| *t == header.log_type));
        if !wanted {
            segments.skip_payload()?;
            continue;
        }

        emit(write!(
            out,
            "LogType:{}\nLog Upload Time:{}\nLogLength:{}\nLog Contents:\n",
            header.log_type,
            format_upload_time(upload_time),
            header.length
        ))?;
        segments.copy_payload(out)?;
        emit(write!(out, "End of LogType:{}\n\n", header.log_type))?;
        found = true;
    }
    Ok(DumpOutcome::from_found(found))
}

/// Walk a positioned record printing only segment types and lengths.
/// Returns the number of segments seen.
pub fn dump_metadata<R: Read>(
    segments: &mut SegmentStream<'_, R>,
    out: &mut dyn Write,
) -> Result<usize, FormatError> {
    let mut count = 0;
    while let SegmentRead::Segment(header) = segments.next_segment()? {
        emit(write!(
            out,
            "LogType:{}\nLogLength:{}\n",
            header.log_type, header.length
        ))?;
        segments.skip_payload()?;
        count += 1;
    }
    Ok(count)
}

/// Failures writing to the output sink are kept apart from read failures.
fn emit(written: std::io::Result<()>) -> Result<(), FormatError> {
    written.map_err(FormatError::Sink)
}

/// Banner printed before each record when walking every container.
pub fn write_container_header(
    out: &mut dyn Write,
    container_id: &str,
    node_file_name: &str,
    upload_time: Option<DateTime<Utc>>,
) -> std::io::Result<()> {
    let banner = format!("Container: {} on {}", container_id, node_file_name);
    write!(out, "\n\n{}\n", banner)?;
    if let Some(time) = upload_time {
        writeln!(out, "Log Upload Time:{}", format_upload_time(time))?;
    }
    writeln!(out, "{}", "=".repeat(banner.chars().count()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{LogReader, LogSegment, LogWriter};
    use chrono::TimeZone;
    use std::io::Cursor;

    fn record(segments: &[LogSegment]) -> LogReader<Cursor<Vec<u8>>> {
        let mut writer = LogWriter::new(Vec::new()).unwrap();
        writer.append("container_1", segments).unwrap();
        LogReader::new(Cursor::new(writer.finish().unwrap())).unwrap()
    }

    fn upload_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap()
    }

    #[test]
    fn test_upload_time_format() {
        assert_eq!(format_upload_time(upload_time()), "Tue Mar 05 14:07:09 UTC 2024");
    }

    #[test]
    fn test_dump_all_segments() {
        let mut reader = record(&[
            LogSegment::new("stdout", "hello\n"),
            LogSegment::new("stderr", ""),
        ]);
        let (_, mut segments) = reader.next_record().unwrap().unwrap();

        let mut out = Vec::new();
        let outcome = dump_segments(&mut segments, &mut out, upload_time(), None).unwrap();
        assert_eq!(outcome, DumpOutcome::Found);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "LogType:stdout\n\
             Log Upload Time:Tue Mar 05 14:07:09 UTC 2024\n\
             LogLength:6\n\
             Log Contents:\n\
             hello\n\
             End of LogType:stdout\n\
             \n\
             LogType:stderr\n\
             Log Upload Time:Tue Mar 05 14:07:09 UTC 2024\n\
             LogLength:0\n\
             Log Contents:\n\
             End of LogType:stderr\n\
             \n"
        );
    }

    #[test]
    fn test_filtered_dump_keeps_order_and_skips_others() {
        let mut reader = record(&[
            LogSegment::new("stdout", "out"),
            LogSegment::new("syslog", "sys"),
            LogSegment::new("stderr", "err"),
        ]);
        let (_, mut segments) = reader.next_record().unwrap().unwrap();

        let types = vec!["stderr".to_string(), "stdout".to_string()];
        let mut out = Vec::new();
        let outcome = dump_segments(&mut segments, &mut out, upload_time(), Some(&types)).unwrap();
        assert_eq!(outcome, DumpOutcome::Found);

        let text = String::from_utf8(out).unwrap();
        let stdout_at = text.find("LogType:stdout").unwrap();
        let stderr_at = text.find("LogType:stderr").unwrap();
        assert!(stdout_at < stderr_at);
        assert!(!text.contains("syslog"));
        assert!(!text.contains("sys\n"));
    }

    #[test]
    fn test_filter_excluding_everything_is_not_found() {
        let mut reader = record(&[LogSegment::new("stdout", "out")]);
        let (_, mut segments) = reader.next_record().unwrap().unwrap();

        let types = vec!["gc.log".to_string()];
        let mut out = Vec::new();
        let outcome = dump_segments(&mut segments, &mut out, upload_time(), Some(&types)).unwrap();
        assert_eq!(outcome, DumpOutcome::NotFound);
        assert!(out.is_empty());
    }

    #[test]
    fn test_empty_record_is_not_found() {
        let mut reader = record(&[]);
        let (_, mut segments) = reader.next_record().unwrap().unwrap();
        let mut out = Vec::new();
        let outcome = dump_segments(&mut segments, &mut out, upload_time(), None).unwrap();
        assert_eq!(outcome, DumpOutcome::NotFound);
    }

    #[test]
    fn test_metadata_never_prints_payload() {
        let mut reader = record(&[
            LogSegment::new("stdout", "secret payload"),
            LogSegment::new("stderr", "x"),
        ]);
        let (_, mut segments) = reader.next_record().unwrap().unwrap();

        let mut out = Vec::new();
        let count = dump_metadata(&mut segments, &mut out).unwrap();
        assert_eq!(count, 2);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "LogType:stdout\nLogLength:14\nLogType:stderr\nLogLength:1\n"
        );
    }

    #[test]
    fn test_container_header() {
        let mut out = Vec::new();
        write_container_header(&mut out, "c_1", "host1_8041", None).unwrap();
        let banner = "Container: c_1 on host1_8041";
        assert_eq!(
            String::from_utf8(out).unwrap(),
            format!("\n\n{}\n{}\n", banner, "=".repeat(banner.len()))
        );
    }
}
