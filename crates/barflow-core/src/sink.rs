//! JSON file sink for the flattened table.

use std::fs::{File, Permissions};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::PersistenceError;
use crate::flatten::FlatRow;

/// Write `rows` as a pretty-printed JSON array of records, replacing any
/// existing file at `path`.
///
/// Rows are written to a temporary file next to `path` and moved over it only
/// once fully flushed, so a failure leaves the previous file (or no file)
/// rather than a truncated one.
pub fn write_json(path: &Path, rows: &[FlatRow]) -> Result<(), PersistenceError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut staged = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(staged.as_file_mut());
        serde_json::to_writer_pretty(&mut writer, rows)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
    }
    staged.as_file().sync_all()?;
    staged.as_file().set_permissions(target_permissions(path, staged.as_file())?)?;
    staged.persist(path)?;
    Ok(())
}

/// Permissions the output should end up with: those of the file being
/// replaced, or world-readable when there is none. Temp files are created
/// owner-only.
fn target_permissions(path: &Path, staged: &File) -> std::io::Result<Permissions> {
    match std::fs::metadata(path) {
        Ok(existing) => Ok(existing.permissions()),
        Err(error) if error.kind() == ErrorKind::NotFound => {
            #[cfg_attr(not(unix), allow(unused_mut))]
            let mut permissions = staged.metadata()?.permissions();
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                permissions.set_mode(0o644);
            }
            Ok(permissions)
        }
        Err(error) => Err(error),
    }
}

/// Read a file produced by [`write_json`] back into rows.
pub fn read_json(path: &Path) -> Result<Vec<FlatRow>, PersistenceError> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tempfile::tempdir;

    use super::*;
    use crate::enrich::enrich;
    use crate::flatten::flatten;
    use crate::orchestrator::{FetchOutcome, TickerPayload};
    use crate::{RawBar, ResponseMetadata, Ticker, UtcDateTime};

    fn rows() -> Vec<FlatRow> {
        let bars = enrich(vec![
            RawBar {
                open: 100.0,
                high: 106.0,
                low: 99.0,
                close: 105.0,
                volume: 1_000.0,
                vwap: Some(102.5),
                transactions: Some(10),
                timestamp_ms: 1_735_794_000_000,
            },
            RawBar {
                open: 106.0,
                high: 107.0,
                low: 102.0,
                close: 103.0,
                volume: 1_500.0,
                vwap: None,
                transactions: None,
                timestamp_ms: 1_735_880_400_000,
            },
        ])
        .expect("valid bars");

        flatten(&[FetchOutcome {
            ticker: Ticker::parse("AAPL").expect("valid"),
            url: String::from("https://api.test/AAPL?apiKey=REDACTED"),
            start_time: UtcDateTime::parse("2025-01-04T12:00:00Z").expect("valid"),
            duration: Duration::from_millis(42),
            result: Ok(TickerPayload {
                metadata: ResponseMetadata {
                    ticker: String::from("AAPL"),
                    status: String::from("OK"),
                    adjusted: Some(false),
                    count: None,
                    query_count: Some(2),
                    results_count: Some(2),
                    request_id: Some(String::from("abc")),
                },
                bars,
            }),
        }])
    }

    #[test]
    fn written_file_reads_back_into_the_same_rows() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("results.json");
        let rows = rows();

        write_json(&path, &rows).expect("write succeeds");

        assert_eq!(read_json(&path).expect("read succeeds"), rows);
    }

    #[test]
    fn output_is_an_array_of_records_with_derived_columns() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("results.json");

        write_json(&path, &rows()).expect("write succeeds");

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).expect("readable")).expect("json");
        let records = value.as_array().expect("array of records");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["outcome"], "undefined");
        assert_eq!(records[1]["outcome"], "bear");
        assert_eq!(records[0]["utc_instant"], "2025-01-02T05:00:00Z");
        assert_eq!(records[0]["status"], "success");
        assert_eq!(records[0]["duration_ms"], 42);
        assert_eq!(records[0]["url"], "https://api.test/AAPL?apiKey=REDACTED");
    }

    #[test]
    fn existing_file_is_overwritten_not_appended() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("results.json");
        std::fs::write(&path, "stale contents that are not json").expect("seed file");

        write_json(&path, &rows()[..1]).expect("write succeeds");

        assert_eq!(read_json(&path).expect("valid json").len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn replacing_a_file_keeps_its_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("results.json");
        std::fs::write(&path, "[]").expect("seed file");
        std::fs::set_permissions(&path, Permissions::from_mode(0o640)).expect("chmod");

        write_json(&path, &rows()).expect("write succeeds");

        let mode = std::fs::metadata(&path).expect("metadata").permissions().mode();
        assert_eq!(mode & 0o777, 0o640);
    }

    #[cfg(unix)]
    #[test]
    fn new_file_is_readable_by_others() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("results.json");

        write_json(&path, &rows()).expect("write succeeds");

        let mode = std::fs::metadata(&path).expect("metadata").permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[test]
    fn missing_directory_fails_without_creating_output() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("missing").join("results.json");

        let err = write_json(&path, &rows()).expect_err("parent does not exist");

        assert!(matches!(err, PersistenceError::Io(_)));
        assert!(!path.exists());
    }
}
