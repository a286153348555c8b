use crate::models::Document;
use relative_path::RelativePath;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid docs directory: {0}")]
    InvalidDocsDir(String),
}

/// Read a markdown file and return its content
pub fn read_file(relative_path: &RelativePath, docs_root: &Path) -> Result<String, IoError> {
    let absolute_path = relative_path.to_path(docs_root);
    if !absolute_path.exists() {
        return Err(IoError::NotFound(absolute_path));
    }
    fs::read_to_string(&absolute_path).map_err(IoError::Io)
}

/// Write content to a markdown file
pub fn write_file(
    relative_path: &RelativePath,
    docs_root: &Path,
    content: &str,
) -> Result<(), IoError> {
    let absolute_path = relative_path.to_path(docs_root);

    // Create parent directories if they don't exist
    if let Some(parent) = absolute_path.parent() {
        fs::create_dir_all(parent).map_err(IoError::Io)?;
    }

    fs::write(&absolute_path, content).map_err(IoError::Io)
}

/// Read a markdown file and import it as a block document
pub fn load_document(relative_path: &RelativePath, docs_root: &Path) -> Result<Document, IoError> {
    let text = read_file(relative_path, docs_root)?;
    let document = Document::from_markdown(&text);
    tracing::debug!(
        target: "blockmark::io",
        path = %relative_path,
        blocks = document.len(),
        "document loaded"
    );
    Ok(document)
}

/// Export a block document and persist it
pub fn save_document(
    relative_path: &RelativePath,
    docs_root: &Path,
    document: &Document,
) -> Result<(), IoError> {
    write_file(relative_path, docs_root, &document.to_markdown())?;
    tracing::debug!(
        target: "blockmark::io",
        path = %relative_path,
        blocks = document.len(),
        "document saved"
    );
    Ok(())
}

/// Scan for markdown files in the docs directory
pub fn scan_markdown_files(docs_root: &Path) -> Result<Vec<PathBuf>, IoError> {
    if !docs_root.exists() {
        return Err(IoError::InvalidDocsDir(
            "docs directory not found".to_string(),
        ));
    }

    let mut files = Vec::new();
    scan_directory_recursive(docs_root, &mut files)?;
    files.sort();
    Ok(files)
}

fn scan_directory_recursive(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), IoError> {
    let entries = fs::read_dir(dir).map_err(IoError::Io)?;

    for entry in entries {
        let entry = entry.map_err(IoError::Io)?;
        let path = entry.path();

        if path.is_dir() {
            scan_directory_recursive(&path, files)?;
        } else if let Some(ext) = path.extension()
            && ext == "md"
        {
            files.push(path);
        }
    }

    Ok(())
}

pub fn validate_docs_dir(path: &Path) -> Result<(), IoError> {
    if !path.exists() || !path.is_dir() {
        return Err(IoError::InvalidDocsDir(
            "Directory does not exist".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BlockKind;
    use crate::tests::{create_test_docs_dir, create_test_file};

    #[test]
    fn test_scan_finds_markdown_files() {
        // Given a docs directory with markdown files
        let docs_dir = create_test_docs_dir();
        create_test_file(&docs_dir, "test1.md", "- First item\n- Second item\n");
        create_test_file(&docs_dir, "test2.md", "- Parent\n  - Child\n");

        // When scanning for files
        let files = scan_markdown_files(docs_dir.path()).unwrap();

        // Then we find the expected files
        assert_eq!(files.len(), 2);
        assert!(files.iter().any(|f| f.file_name().unwrap() == "test1.md"));
        assert!(files.iter().any(|f| f.file_name().unwrap() == "test2.md"));
    }

    #[test]
    fn test_scan_invalid_docs_directory() {
        let nonexistent_path = PathBuf::from("/this/path/does/not/exist");

        let result = scan_markdown_files(&nonexistent_path);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("docs directory"));
    }

    #[test]
    fn test_scan_nested_directories() {
        // Given a docs directory with nested structure
        let docs_dir = create_test_docs_dir();
        create_test_file(&docs_dir, "root.md", "# Root file\n");

        let sub_dir = docs_dir.path().join("subfolder");
        std::fs::create_dir(&sub_dir).unwrap();
        std::fs::write(sub_dir.join("nested.md"), "# Nested file\n").unwrap();

        // When scanning for files
        let files = scan_markdown_files(docs_dir.path()).unwrap();

        // Then we find both root and nested files
        assert_eq!(files.len(), 2);
        assert!(files.iter().any(|f| f.file_name().unwrap() == "root.md"));
        assert!(files.iter().any(|f| f.file_name().unwrap() == "nested.md"));
    }

    #[test]
    fn test_scan_ignores_non_markdown_files() {
        let docs_dir = create_test_docs_dir();
        create_test_file(&docs_dir, "document.md", "# Markdown\n");
        create_test_file(&docs_dir, "image.png", "fake image data");
        create_test_file(&docs_dir, "config.json", "{}");

        let files = scan_markdown_files(docs_dir.path()).unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file_name().unwrap(), "document.md");
    }

    #[test]
    fn test_validate_docs_dir_exists() {
        let docs_dir = create_test_docs_dir();
        assert!(validate_docs_dir(docs_dir.path()).is_ok());
    }

    #[test]
    fn test_validate_docs_dir_not_exists() {
        let result = validate_docs_dir(Path::new("/nonexistent/path"));
        assert!(matches!(result, Err(IoError::InvalidDocsDir(_))));
    }

    #[test]
    fn test_read_file_success() {
        let docs_dir = create_test_docs_dir();
        create_test_file(&docs_dir, "test.md", "# Test Content\n\nParagraph\n");

        let content = read_file(RelativePath::new("test.md"), docs_dir.path()).unwrap();
        assert_eq!(content, "# Test Content\n\nParagraph\n");
    }

    #[test]
    fn test_read_file_not_found() {
        let docs_dir = create_test_docs_dir();
        let result = read_file(RelativePath::new("nonexistent.md"), docs_dir.path());
        assert!(matches!(result, Err(IoError::NotFound(_))));
    }

    #[test]
    fn test_write_file_creates_parent_directories() {
        let docs_dir = create_test_docs_dir();
        let relative_path = RelativePath::new("folder/subfolder/new_file.md");
        let content = "# New File in Nested Folder\n";

        write_file(relative_path, docs_dir.path(), content).unwrap();

        let written = read_file(relative_path, docs_dir.path()).unwrap();
        assert_eq!(written, content);
        assert!(docs_dir.path().join("folder").join("subfolder").is_dir());
    }

    #[test]
    fn test_write_file_overwrites_existing() {
        let docs_dir = create_test_docs_dir();
        create_test_file(&docs_dir, "existing.md", "# Original Content\n");

        let relative_path = RelativePath::new("existing.md");
        write_file(relative_path, docs_dir.path(), "# Updated Content\n").unwrap();

        let written = read_file(relative_path, docs_dir.path()).unwrap();
        assert_eq!(written, "# Updated Content\n");
    }

    #[test]
    fn test_load_document_imports_blocks() {
        // Given a markdown file on disk
        let docs_dir = create_test_docs_dir();
        create_test_file(&docs_dir, "doc.md", "# Title\n\n- [ ] item\n");

        // When loading it as a document
        let document = load_document(RelativePath::new("doc.md"), docs_dir.path()).unwrap();

        // Then the blocks match the file content
        assert_eq!(document.len(), 2);
        assert_eq!(document.blocks()[0].kind, BlockKind::Heading { level: 1 });
        assert_eq!(
            document.blocks()[1].kind,
            BlockKind::Task { checked: false }
        );
    }

    #[test]
    fn test_save_document_writes_canonical_markdown() {
        let docs_dir = create_test_docs_dir();
        let document = Document::from_markdown("# Title\n\n- a\n- b\n");

        save_document(RelativePath::new("out/doc.md"), docs_dir.path(), &document).unwrap();

        let written = read_file(RelativePath::new("out/doc.md"), docs_dir.path()).unwrap();
        assert_eq!(written, "# Title\n\n- a\n- b\n");
    }

    #[test]
    fn test_load_missing_document_reports_not_found() {
        let docs_dir = create_test_docs_dir();
        let result = load_document(RelativePath::new("gone.md"), docs_dir.path());
        assert!(matches!(result, Err(IoError::NotFound(_))));
    }
}
