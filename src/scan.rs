//! Tolerant CSV scanning over a dataset category directory
//!
//! A category directory holds append-only delimited files that are scanned
//! in ascending filename order. The scanner never fails a whole scan for a
//! local problem:
//! - a missing directory yields no records
//! - a file that cannot be opened or has an unreadable header is logged and
//!   skipped
//! - a malformed row is logged and skipped
//!
//! Records are surfaced through a visitor so fold loops can borrow directly
//! from the reader's buffers. Field access goes through [`RawRecord`], which
//! resolves columns by header name (including the alternate spellings some
//! files use, see [`crate::types::columns`]).

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// Header-name to column-index mapping for one file
pub struct HeaderIndex {
    by_name: HashMap<String, usize>,
}

impl HeaderIndex {
    fn new(headers: &csv::StringRecord) -> Self {
        let by_name = headers
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.to_string(), idx))
            .collect();
        Self { by_name }
    }

    fn position(&self, column: &str) -> Option<usize> {
        self.by_name.get(column).copied()
    }
}

/// A single row from a source file, addressed by column name
///
/// Ephemeral: valid only for the duration of the visitor call.
pub struct RawRecord<'a> {
    header: &'a HeaderIndex,
    values: &'a csv::StringRecord,
}

impl<'a> RawRecord<'a> {
    /// Trimmed value of a column, or `None` when the column is absent from
    /// this file or the row is too short to reach it.
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let idx = self.header.position(column)?;
        self.values.get(idx).map(str::trim)
    }

    /// First present column among alternate spellings.
    ///
    /// Only falls through on a *missing* column; an empty value in a present
    /// column is returned as the empty string.
    pub fn first_of(&self, alternates: &[&str]) -> Option<&'a str> {
        alternates.iter().find_map(|column| self.get(column))
    }
}

/// List a category directory's data files in ascending filename order.
///
/// Files lacking the `.csv` extension (any casing) are ignored; a missing
/// directory yields an empty list.
pub fn list_files(dir: &Path) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };
    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
        })
        .collect();
    files.sort();
    files
}

/// Visit every record in every data file under `dir`.
pub fn for_each_record(dir: &Path, visit: impl FnMut(&RawRecord)) {
    for_each_record_sampled(dir, usize::MAX, usize::MAX, visit);
}

/// Visit records under `dir`, bounded to the first `max_files` files and the
/// first `max_rows_per_file` rows of each.
///
/// This is the primitive behind the engine's approximation mode; exhaustive
/// aggregations use [`for_each_record`].
pub fn for_each_record_sampled(
    dir: &Path,
    max_files: usize,
    max_rows_per_file: usize,
    mut visit: impl FnMut(&RawRecord),
) {
    for path in list_files(dir).into_iter().take(max_files) {
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping unreadable data file");
                continue;
            }
        };

        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(file);
        let header = match reader.headers() {
            Ok(headers) => HeaderIndex::new(headers),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping file with unreadable header");
                continue;
            }
        };

        let mut rows = 0usize;
        for record in reader.records() {
            if rows >= max_rows_per_file {
                break;
            }
            match record {
                Ok(values) => {
                    rows += 1;
                    let raw = RawRecord {
                        header: &header,
                        values: &values,
                    };
                    visit(&raw);
                }
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "Skipping malformed row");
                }
            }
        }
    }
}

/// Count the data rows of the first file under `dir` (header excluded).
///
/// Used for estimated record counts in the dataset summary; returns 0 when
/// the directory is missing or empty.
pub fn first_file_row_count(dir: &Path) -> usize {
    let mut count = 0usize;
    for_each_record_sampled(dir, 1, usize::MAX, |_| count += 1);
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &Path, name: &str, contents: &str) {
        let mut file = File::create(dir.join(name)).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
    }

    #[test]
    fn test_missing_directory_yields_nothing() {
        let mut seen = 0;
        for_each_record(Path::new("/definitely/not/here"), |_| seen += 1);
        assert_eq!(seen, 0);
        assert!(list_files(Path::new("/definitely/not/here")).is_empty());
    }

    #[test]
    fn test_files_sorted_and_extension_filtered() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "b.csv", "state\nKerala\n");
        write_file(tmp.path(), "a.CSV", "state\nGoa\n");
        write_file(tmp.path(), "notes.txt", "ignored");

        let files = list_files(tmp.path());
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("a.CSV"));
        assert!(files[1].ends_with("b.csv"));

        let mut states = Vec::new();
        for_each_record(tmp.path(), |rec| {
            states.push(rec.get("state").unwrap_or("").to_string());
        });
        assert_eq!(states, vec!["Goa", "Kerala"]);
    }

    #[test]
    fn test_get_trims_and_tolerates_short_rows() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "data.csv", "state,district\n Kerala ,\nGoa\n");

        let mut rows = Vec::new();
        for_each_record(tmp.path(), |rec| {
            rows.push((
                rec.get("state").map(str::to_string),
                rec.get("district").map(str::to_string),
            ));
        });
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].0.as_deref(), Some("Kerala"));
        assert_eq!(rows[0].1.as_deref(), Some(""));
        // Short row: district column missing entirely
        assert_eq!(rows[1].0.as_deref(), Some("Goa"));
        assert_eq!(rows[1].1, None);
    }

    #[test]
    fn test_first_of_alternates() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "data.csv", "state,demo_age_17_\nKerala,12\n");

        let mut value = None;
        for_each_record(tmp.path(), |rec| {
            value = rec
                .first_of(crate::types::columns::DEMO_AGE_17_PLUS)
                .map(str::to_string);
        });
        assert_eq!(value.as_deref(), Some("12"));
    }

    #[test]
    fn test_sampling_limits() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "1.csv", "n\n1\n2\n3\n");
        write_file(tmp.path(), "2.csv", "n\n4\n5\n");

        let mut seen = Vec::new();
        for_each_record_sampled(tmp.path(), 1, 2, |rec| {
            seen.push(rec.get("n").unwrap_or("").to_string());
        });
        assert_eq!(seen, vec!["1", "2"]);

        assert_eq!(first_file_row_count(tmp.path()), 3);
    }
}
