use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Create a temporary docs directory for IO tests
pub fn create_test_docs_dir() -> TempDir {
    tempfile::tempdir().unwrap()
}

/// Create a test markdown file with content
pub fn create_test_file(docs_dir: &TempDir, filename: &str, content: &str) -> PathBuf {
    let file_path = docs_dir.path().join(filename);
    fs::write(&file_path, content).unwrap();
    file_path
}
