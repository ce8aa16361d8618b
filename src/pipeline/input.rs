//! Source resolution: validate a path or byte buffer before pdfium sees it.
//!
//! A missing file, a directory, or a file that does not start with the
//! `%PDF` magic bytes is reported as [`Cv2JsonError::DocumentUnreadable`]
//! here, so those requests never reach the text layer or the model.

use crate::error::Cv2JsonError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// One PDF to process. Read once per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceDocument {
    /// A file on disk.
    Path(PathBuf),
    /// An in-memory PDF, e.g. an uploaded file. `name` is used in messages only.
    Bytes { name: String, data: Vec<u8> },
}

impl SourceDocument {
    pub fn from_bytes(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        SourceDocument::Bytes {
            name: name.into(),
            data: data.into(),
        }
    }

    /// Name used in logs and error messages.
    pub fn display_name(&self) -> String {
        match self {
            SourceDocument::Path(p) => p.display().to_string(),
            SourceDocument::Bytes { name, .. } => name.clone(),
        }
    }
}

impl From<PathBuf> for SourceDocument {
    fn from(path: PathBuf) -> Self {
        SourceDocument::Path(path)
    }
}

impl From<&Path> for SourceDocument {
    fn from(path: &Path) -> Self {
        SourceDocument::Path(path.to_path_buf())
    }
}

impl From<&str> for SourceDocument {
    fn from(path: &str) -> Self {
        SourceDocument::Path(PathBuf::from(path))
    }
}

impl From<String> for SourceDocument {
    fn from(path: String) -> Self {
        SourceDocument::Path(PathBuf::from(path))
    }
}

/// Check that the source exists, is readable and looks like a PDF.
pub fn validate_source(source: &SourceDocument) -> Result<(), Cv2JsonError> {
    match source {
        SourceDocument::Path(path) => validate_local(path),
        SourceDocument::Bytes { name, data } => {
            check_magic(data).map_err(|detail| Cv2JsonError::unreadable(name.clone(), detail))
        }
    }
}

fn validate_local(path: &Path) -> Result<(), Cv2JsonError> {
    let document = path.display().to_string();

    if !path.exists() {
        return Err(Cv2JsonError::unreadable(document, "file not found"));
    }
    if path.is_dir() {
        return Err(Cv2JsonError::unreadable(document, "path is a directory"));
    }

    let mut file = std::fs::File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::PermissionDenied {
            Cv2JsonError::unreadable(document.clone(), "permission denied")
        } else {
            Cv2JsonError::unreadable(document.clone(), e.to_string())
        }
    })?;

    let mut head = Vec::with_capacity(PDF_MAGIC.len());
    file.by_ref()
        .take(PDF_MAGIC.len() as u64)
        .read_to_end(&mut head)
        .map_err(|e| Cv2JsonError::unreadable(document.clone(), e.to_string()))?;
    check_magic(&head).map_err(|detail| Cv2JsonError::unreadable(document.clone(), detail))?;

    debug!("Resolved local PDF: {}", path.display());
    Ok(())
}

fn check_magic(data: &[u8]) -> Result<(), String> {
    if data.is_empty() {
        return Err("file is empty".to_string());
    }
    if data.len() < PDF_MAGIC.len() || &data[..PDF_MAGIC.len()] != PDF_MAGIC {
        let shown = &data[..data.len().min(PDF_MAGIC.len())];
        return Err(format!("not a PDF (first bytes: {shown:?})"));
    }
    Ok(())
}
