//! CSV artifact writing
//!
//! Files are UTF-8 with a byte-order mark so spreadsheet tools pick the
//! right encoding, with the fixed header `rating,date,content`.

use crate::output::OutputResult;
use crate::storage::{RecordSink, StorageResult, StoredRecord, UpsertStats};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Column names, in order
pub const CSV_HEADER: [&str; 3] = ["rating", "date", "content"];

/// Location of a source's artifact inside the CSV directory
pub fn csv_path(dir: &Path, source: &str) -> PathBuf {
    dir.join(format!("reviews_{}.csv", source))
}

fn write_rows(path: &Path, records: &[StoredRecord]) -> Result<(), csv::Error> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = BufWriter::new(File::create(path)?);
    file.write_all(UTF8_BOM)?;

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(file);
    writer.write_record(CSV_HEADER)?;
    for record in records {
        writer.write_record([&record.rating, &record.date, &record.content])?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes records to a CSV file, replacing any previous content
///
/// # Arguments
///
/// * `path` - Destination file; missing parent directories are created
/// * `records` - Rows in output order
pub fn write_records_csv(path: &Path, records: &[StoredRecord]) -> OutputResult<()> {
    write_rows(path, records)?;
    Ok(())
}

/// Sink that mirrors one run's records into a CSV artifact
///
/// The file is rewritten on every flush, so after a checkpoint it holds
/// every record admitted up to that point. The collector hands each record
/// over exactly once, so rows are appended without a key check: two
/// retained reviews with the same text, rating and day stay two rows.
pub struct CsvSink {
    path: PathBuf,
    rows: Vec<StoredRecord>,
}

impl CsvSink {
    /// Creates a sink for `path`; nothing is written until the first flush
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            rows: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of rows in the artifact
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl RecordSink for CsvSink {
    fn upsert_insert_only(&mut self, records: &[StoredRecord]) -> StorageResult<UpsertStats> {
        if records.is_empty() {
            return Ok(UpsertStats::default());
        }

        self.rows.extend_from_slice(records);
        write_rows(&self.path, &self.rows)?;

        Ok(UpsertStats {
            inserted: records.len(),
            already_present: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(key: &str, rating: &str, date: &str, content: &str) -> StoredRecord {
        StoredRecord {
            key: key.to_string(),
            source: "shop".to_string(),
            rating: rating.to_string(),
            date: date.to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_csv_has_bom_header_and_quoting() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.csv");

        write_records_csv(
            &path,
            &[
                stored("a", "5", "2024-01-02", "plain"),
                stored("b", "", "", "has, comma and \"quotes\"\nand a newline"),
            ],
        )
        .unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));

        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        assert_eq!(
            text,
            "rating,date,content\n5,2024-01-02,plain\n,,\"has, comma and \"\"quotes\"\"\nand a newline\"\n"
        );
    }

    #[test]
    fn test_csv_roundtrips_through_reader() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_records_csv(&path, &[stored("a", "4.5", "", "좋은 책")]).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        let mut reader = csv::Reader::from_reader(&bytes[UTF8_BOM.len()..]);
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();

        assert_eq!(
            reader.headers().unwrap(),
            &csv::StringRecord::from(vec!["rating", "date", "content"])
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][2], "좋은 책");
    }

    #[test]
    fn test_csv_sink_rewrites_on_each_flush() {
        let dir = tempfile::tempdir().unwrap();
        let path = csv_path(dir.path(), "shop");
        assert!(path.ends_with("reviews_shop.csv"));

        let mut sink = CsvSink::new(&path);
        assert_eq!(sink.upsert_insert_only(&[]).unwrap().inserted, 0);
        assert!(!path.exists());

        sink.upsert_insert_only(&[stored("a", "1", "", "first")]).unwrap();
        let stats = sink
            .upsert_insert_only(&[stored("b", "2", "", "second")])
            .unwrap();

        assert_eq!(stats.inserted, 1);
        assert_eq!(sink.len(), 2);

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert!(text.contains("first"));
        assert!(text.contains("second"));
    }

    #[test]
    fn test_csv_sink_keeps_identical_reviews_as_separate_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = csv_path(dir.path(), "shop");

        // Same signature, retained twice because the page gave them distinct ids
        let mut sink = CsvSink::new(&path);
        let stats = sink
            .upsert_insert_only(&[
                stored("same-key", "10", "2024-01-01", "좋아요"),
                stored("same-key", "10", "2024-01-01", "좋아요"),
            ])
            .unwrap();

        assert_eq!(stats.inserted, 2);
        assert_eq!(sink.len(), 2);

        let text = std::fs::read_to_string(&path).unwrap();
        let rows: Vec<&str> = text.lines().skip(1).collect();
        assert_eq!(rows, vec!["10,2024-01-01,좋아요", "10,2024-01-01,좋아요"]);
    }
}
