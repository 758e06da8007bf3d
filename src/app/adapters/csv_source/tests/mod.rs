//! Tests for the CSV source adapter


use std::io::Write;
use tempfile::NamedTempFile;

/// Write `content` to a temporary CSV file
pub fn create_test_csv(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}
