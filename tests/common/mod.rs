//! Shared helpers for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use cv2json::{Cv2JsonError, ModelInvoker, ModelResponse};
use once_cell::sync::Lazy;
use pdfium_render::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Deterministic stand-in for the hosted model.
pub struct FakeInvoker {
    answer: Result<String, (Option<u16>, String)>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl FakeInvoker {
    pub fn answering(content: impl Into<String>) -> Self {
        Self {
            answer: Ok(content.into()),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(status: Option<u16>, detail: impl Into<String>) -> Self {
        Self {
            answer: Err((status, detail.into())),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ModelInvoker for FakeInvoker {
    async fn invoke(&self, prompt: &str) -> Result<ModelResponse, Cv2JsonError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.answer {
            Ok(content) => Ok(ModelResponse::new(content.clone())),
            Err((status, detail)) => Err(Cv2JsonError::ModelInvocation {
                provider: "fake".to_string(),
                status: *status,
                detail: detail.clone(),
            }),
        }
    }

    fn describe(&self) -> String {
        "fake".to_string()
    }
}

/// pdfium keeps process-wide state; tests that bind it run one at a time.
pub static PDFIUM_LOCK: Lazy<tokio::sync::Mutex<()>> = Lazy::new(|| tokio::sync::Mutex::new(()));

fn bind() -> Option<Pdfium> {
    Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| Pdfium::bind_to_system_library())
        .ok()
        .map(Pdfium::new)
}

/// Build a PDF with one page per entry, each page holding one line of text.
///
/// Returns `None` when no pdfium library can be bound.
pub fn make_pdf(pages: &[&str]) -> Option<Vec<u8>> {
    let pdfium = bind()?;
    let mut document = pdfium.create_new_pdf().unwrap();
    let font = document.fonts_mut().helvetica();

    for line in pages {
        let mut page = document
            .pages_mut()
            .create_page_at_end(PdfPagePaperSize::a4())
            .unwrap();
        page.objects_mut()
            .create_text_object(
                PdfPoints::new(72.0),
                PdfPoints::new(720.0),
                line,
                font,
                PdfPoints::new(12.0),
            )
            .unwrap();
    }

    Some(document.save_to_bytes().unwrap())
}

/// Skip the current test when pdfium is unavailable.
#[macro_export]
macro_rules! pdf_or_skip {
    ($pages:expr) => {{
        match common::make_pdf($pages) {
            Some(bytes) => bytes,
            None => {
                println!("SKIP: no pdfium library found (place libpdfium next to Cargo.toml)");
                return;
            }
        }
    }};
}
