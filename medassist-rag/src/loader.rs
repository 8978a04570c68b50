//! Reading documents from plain-text and PDF files.
//!
//! Text files become one [`Document`] each; PDFs become one document per page
//! with a 0-based `page` entry. Every document carries the file it came from
//! under `source`.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::document::{Document, PAGE_KEY, SOURCE_KEY};
use crate::error::{RagError, Result};

/// File types the loader can read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// UTF-8 plain text (`.txt`).
    Text,
    /// Portable Document Format (`.pdf`).
    Pdf,
}

impl FileKind {
    /// Classify a path by its extension, case-insensitively.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "txt" => Some(FileKind::Text),
            "pdf" => Some(FileKind::Pdf),
            _ => None,
        }
    }

    fn extension(self) -> &'static str {
        match self {
            FileKind::Text => "txt",
            FileKind::Pdf => "pdf",
        }
    }
}

/// Load a single `.txt` or `.pdf` file.
///
/// # Errors
///
/// - [`RagError::UnsupportedFileType`] for any other extension
/// - [`RagError::IngestionError`] if the file cannot be read or parsed
pub fn load_file(path: &Path) -> Result<Vec<Document>> {
    let kind =
        FileKind::from_path(path).ok_or_else(|| RagError::UnsupportedFileType(path.to_path_buf()))?;
    let source = path.display().to_string();

    match kind {
        FileKind::Text => {
            let text = fs::read_to_string(path).map_err(|e| ingestion_err(path, e))?;
            Ok(vec![Document::new(text).with_metadata(SOURCE_KEY, source)])
        }
        FileKind::Pdf => {
            let bytes = fs::read(path).map_err(|e| ingestion_err(path, e))?;
            let pages = pdf_extract::extract_text_from_mem_by_pages(&bytes)
                .map_err(|e| ingestion_err(path, format!("PDF extraction error: {e}")))?;
            debug!(path = %path.display(), pages = pages.len(), "extracted PDF");
            Ok(pages
                .into_iter()
                .enumerate()
                .map(|(page, text)| {
                    Document::new(text)
                        .with_metadata(SOURCE_KEY, source.clone())
                        .with_metadata(PAGE_KEY, page.to_string())
                })
                .collect())
        }
    }
}

/// Load every supported file under `dir`.
///
/// Text files are collected recursively; PDFs only from the top level.
/// Files are visited in sorted path order. A file that fails to load is
/// logged and skipped. A missing directory yields an empty vector.
///
/// # Errors
///
/// Returns [`RagError::IngestionError`] only if `dir` exists but is not a
/// directory.
pub fn load_directory(dir: &Path) -> Result<Vec<Document>> {
    if !dir.exists() {
        debug!(path = %dir.display(), "documents directory does not exist");
        return Ok(Vec::new());
    }
    if !dir.is_dir() {
        return Err(ingestion_err(dir, "not a directory"));
    }

    let mut documents = Vec::new();
    for path in discover_files(dir) {
        match load_file(&path) {
            Ok(docs) => documents.extend(docs),
            Err(e) => warn!(path = %path.display(), error = %e, "skipping document"),
        }
    }
    Ok(documents)
}

fn discover_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "failed to read directory entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| match FileKind::from_path(entry.path()) {
            Some(FileKind::Text) => true,
            Some(FileKind::Pdf) => entry.depth() == 1,
            None => false,
        })
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    files
}

/// Load an uploaded file from memory.
///
/// The bytes are written to a temporary file with the upload's extension,
/// loaded, and the temporary file is removed whether or not loading
/// succeeds. `source` is set to `file_name`.
///
/// # Errors
///
/// Same as [`load_file`], plus [`RagError::IngestionError`] if the
/// temporary file cannot be written.
pub fn load_upload(file_name: &str, bytes: &[u8]) -> Result<Vec<Document>> {
    load_upload_in(&std::env::temp_dir(), file_name, bytes)
}

/// Like [`load_upload`] with the temporary file created inside `dir`.
pub fn load_upload_in(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<Vec<Document>> {
    let name_path = Path::new(file_name);
    let kind = FileKind::from_path(name_path)
        .ok_or_else(|| RagError::UnsupportedFileType(name_path.to_path_buf()))?;

    let mut temp = tempfile::Builder::new()
        .prefix("medassist-upload-")
        .suffix(&format!(".{}", kind.extension()))
        .tempfile_in(dir)
        .map_err(|e| ingestion_err(name_path, e))?;
    temp.write_all(bytes).map_err(|e| ingestion_err(name_path, e))?;
    temp.flush().map_err(|e| ingestion_err(name_path, e))?;

    // `temp` is deleted when dropped, on every return path
    let documents = load_file(temp.path()).map_err(|e| match e {
        RagError::IngestionError { message, .. } => {
            RagError::IngestionError { path: name_path.to_path_buf(), message }
        }
        other => other,
    })?;

    Ok(documents
        .into_iter()
        .map(|doc| doc.with_metadata(SOURCE_KEY, file_name))
        .collect())
}

fn ingestion_err(path: &Path, message: impl ToString) -> RagError {
    RagError::IngestionError { path: path.to_path_buf(), message: message.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_text_file_with_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flu.txt");
        fs::write(&path, "Influenza is a viral infection.").unwrap();

        let docs = load_file(&path).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].text, "Influenza is a viral infection.");
        assert_eq!(docs[0].source(), Some(path.display().to_string().as_str()));
    }

    #[test]
    fn rejects_unknown_extension() {
        let err = load_file(Path::new("notes.docx")).unwrap_err();
        assert!(matches!(err, RagError::UnsupportedFileType(_)));
    }

    #[test]
    fn extension_match_is_case_insensitive() {
        assert_eq!(FileKind::from_path(Path::new("A.TXT")), Some(FileKind::Text));
        assert_eq!(FileKind::from_path(Path::new("b.Pdf")), Some(FileKind::Pdf));
        assert_eq!(FileKind::from_path(Path::new("noext")), None);
    }

    #[test]
    fn missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_directory(&dir.path().join("absent")).unwrap().is_empty());
    }

    #[test]
    fn directory_walk_is_recursive_for_text_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("b.txt"), "second").unwrap();
        fs::write(dir.path().join("a.txt"), "first").unwrap();
        fs::write(dir.path().join("nested").join("c.txt"), "third").unwrap();
        fs::write(dir.path().join("ignored.md"), "nope").unwrap();

        let texts: Vec<String> =
            load_directory(dir.path()).unwrap().into_iter().map(|d| d.text).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
    }

    #[test]
    fn nested_pdfs_are_not_discovered() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("deep.pdf"), b"%PDF-1.4").unwrap();
        fs::write(dir.path().join("top.pdf"), b"%PDF-1.4").unwrap();

        let found = discover_files(dir.path());
        assert_eq!(found, vec![dir.path().join("top.pdf")]);
    }

    #[test]
    fn broken_pdf_is_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("broken.pdf"), b"not a pdf").unwrap();
        fs::write(dir.path().join("ok.txt"), "fine").unwrap();

        let docs = load_directory(dir.path()).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].text, "fine");
    }

    #[test]
    fn upload_sets_source_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let docs =
            load_upload_in(dir.path(), "asthma.txt", b"Asthma affects the airways.").unwrap();

        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].source(), Some("asthma.txt"));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn failed_upload_still_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_upload_in(dir.path(), "scan.pdf", b"garbage").unwrap_err();

        assert!(matches!(
            err,
            RagError::IngestionError { ref path, .. } if path == Path::new("scan.pdf")
        ));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn unsupported_upload_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_upload_in(dir.path(), "image.png", b"\x89PNG"),
            Err(RagError::UnsupportedFileType(_))
        ));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
