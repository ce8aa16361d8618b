//! Text extraction: read the text layer of every page via pdfium.
//!
//! Pages are visited in ascending order. Each page's text is split on `\n`,
//! every line is passed through the configured [`TextFilter`], and the lines
//! are joined back with `\n`. Pages are appended to one accumulator with no
//! separator of their own, so page boundaries fall wherever the page text
//! itself ended.
//!
//! pdfium is blocking, so the work runs inside `spawn_blocking`. The library
//! is process-wide: binding initialises it and dropping a [`Pdfium`] tears it
//! down for every user. Bind, read and drop therefore happen under
//! `PDFIUM_LOCK`, so overlapping requests take turns on the text layer.

use crate::config::{ExtractionConfig, TextFilter};
use crate::error::Cv2JsonError;
use crate::output::ExtractedText;
use crate::pipeline::input::{self, SourceDocument};
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// Serialises every pdfium session in the process.
static PDFIUM_LOCK: Mutex<()> = Mutex::new(());

/// Extract the filtered plain text of a PDF.
pub async fn extract_text(
    source: &SourceDocument,
    config: &ExtractionConfig,
) -> Result<ExtractedText, Cv2JsonError> {
    input::validate_source(source)?;

    let source = source.clone();
    let filter = config.text_filter;
    let password = config.password.clone();
    let library = config.pdfium_library.clone();

    let extracted = tokio::task::spawn_blocking(move || {
        let pages = {
            let _session = PDFIUM_LOCK.lock().unwrap_or_else(|e| e.into_inner());
            let pdfium = bind_pdfium(library.as_deref())?;
            read_pages(&pdfium, &source, password.as_deref())?
        };
        Ok::<_, Cv2JsonError>(assemble_pages(&pages, filter))
    })
    .await
    .map_err(|e| Cv2JsonError::Internal(format!("Text extraction task panicked: {}", e)))??;

    if extracted.stripped_chars > 0 {
        warn!(
            "Text filter {:?} removed {} characters; accented or non-Latin text is lost",
            filter, extracted.stripped_chars
        );
    }
    if extracted.text.trim().is_empty() {
        warn!("No extractable text found; scanned PDFs are not supported");
    }
    info!(
        "Extracted {} chars from {} pages",
        extracted.text.len(),
        extracted.page_count
    );

    Ok(extracted)
}

/// Filter and concatenate page texts in order.
pub fn assemble_pages<S: AsRef<str>>(pages: &[S], filter: TextFilter) -> ExtractedText {
    let mut text = String::new();
    let mut stripped_chars = 0;

    for page in pages {
        let (cleaned, stripped) = clean_page(page.as_ref(), filter);
        text.push_str(&cleaned);
        stripped_chars += stripped;
    }

    ExtractedText {
        text,
        page_count: pages.len(),
        stripped_chars,
    }
}

/// Filter one page's text line by line.
///
/// Returns the cleaned text and the number of removed code points (line
/// separators excluded).
pub fn clean_page(page: &str, filter: TextFilter) -> (String, usize) {
    let mut stripped = 0;
    let lines: Vec<String> = page
        .split('\n')
        .map(|line| {
            let kept: String = line.chars().filter(|&c| keeps(filter, c)).collect();
            stripped += line.chars().count() - kept.chars().count();
            kept
        })
        .collect();
    (lines.join("\n"), stripped)
}

fn keeps(filter: TextFilter, c: char) -> bool {
    match filter {
        TextFilter::AsciiOnly => matches!(c, ' '..='~'),
        TextFilter::KeepUnicode => c == '\t' || !c.is_control(),
    }
}

/// Bind pdfium: explicit path, then the working directory, then the system.
fn bind_pdfium(library: Option<&Path>) -> Result<Pdfium, Cv2JsonError> {
    let bindings = match library {
        Some(path) => {
            let path = if path.is_dir() {
                Pdfium::pdfium_platform_library_name_at_path(path)
            } else {
                path.to_path_buf()
            };
            Pdfium::bind_to_library(&path)
                .map_err(|e| Cv2JsonError::PdfiumBindingFailed(format!("{}: {:?}", path.display(), e)))?
        }
        None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|e| Cv2JsonError::PdfiumBindingFailed(format!("{:?}", e)))?,
    };
    Ok(Pdfium::new(bindings))
}

/// Open the document and return the raw text of every page.
fn read_pages(
    pdfium: &Pdfium,
    source: &SourceDocument,
    password: Option<&str>,
) -> Result<Vec<String>, Cv2JsonError> {
    let name = source.display_name();
    let document = match source {
        SourceDocument::Path(path) => pdfium.load_pdf_from_file(path, password),
        SourceDocument::Bytes { data, .. } => pdfium.load_pdf_from_byte_slice(data, password),
    }
    .map_err(|e| load_error(&name, password.is_some(), e))?;

    let pages = document.pages();
    let total = pages.len() as usize;
    debug!("PDF loaded: {} pages", total);

    let mut texts = Vec::with_capacity(total);
    for (idx, page) in pages.iter().enumerate() {
        let text = page.text().map_err(|e| {
            Cv2JsonError::unreadable(
                name.clone(),
                format!("text layer of page {} is unreadable: {:?}", idx + 1, e),
            )
        })?;
        texts.push(text.all());
    }

    Ok(texts)
}

fn load_error(name: &str, had_password: bool, e: PdfiumError) -> Cv2JsonError {
    match e {
        PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::PasswordError) => {
            if had_password {
                Cv2JsonError::unreadable(name, "wrong password")
            } else {
                Cv2JsonError::unreadable(name, "PDF is encrypted and requires a password")
            }
        }
        PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::SecurityError) => {
            Cv2JsonError::unreadable(name, "PDF security settings prevent opening it")
        }
        other => Cv2JsonError::unreadable(name, format!("corrupt or unsupported PDF: {other:?}")),
    }
}

/// Extract text from a file path with default settings.
pub async fn extract_text_from_path(
    path: impl Into<PathBuf>,
) -> Result<ExtractedText, Cv2JsonError> {
    extract_text(&SourceDocument::Path(path.into()), &ExtractionConfig::default()).await
}
