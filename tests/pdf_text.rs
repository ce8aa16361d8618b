//! End-to-end tests on real PDFs generated with pdfium.
//!
//! The model is replaced by a [`common::FakeInvoker`], so no API key is
//! needed. Each test builds its PDF in memory and skips when no pdfium
//! library can be bound.
//!
//! Run with:
//!   LD_LIBRARY_PATH=. cargo test --test pdf_text -- --nocapture

#[macro_use]
mod common;

use common::{FakeInvoker, PDFIUM_LOCK};
use cv2json::{
    extract_text_only, ErrorKind, ExtractionConfig, ResumeExtractor, SourceDocument, TextFilter,
};
use std::sync::Arc;

fn fake_extractor(invoker: Arc<FakeInvoker>) -> ResumeExtractor {
    ResumeExtractor::with_invoker(ExtractionConfig::default(), invoker)
}

#[tokio::test]
async fn single_page_text_is_extracted_exactly() {
    let _guard = PDFIUM_LOCK.lock().await;
    let bytes = pdf_or_skip!(&["Name: Nguyen Van A"]);

    let extracted = extract_text_only(
        SourceDocument::from_bytes("cv.pdf", bytes),
        &ExtractionConfig::default(),
    )
    .await
    .unwrap();

    assert_eq!(extracted.page_count, 1);
    assert_eq!(extracted.text, "Name: Nguyen Van A");
    assert_eq!(extracted.stripped_chars, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn overlapping_extractions_both_succeed() {
    let _guard = PDFIUM_LOCK.lock().await;
    let short = pdf_or_skip!(&["Name: Jane Doe"]);
    let long = pdf_or_skip!(&["Page one", "Page two", "Page three", "Page four"]);

    let config = ExtractionConfig::default();
    let (a, b) = tokio::join!(
        extract_text_only(SourceDocument::from_bytes("a.pdf", short), &config),
        extract_text_only(SourceDocument::from_bytes("b.pdf", long), &config),
    );

    let a = a.unwrap();
    let b = b.unwrap();
    assert_eq!(a.text, "Name: Jane Doe");
    assert_eq!(b.page_count, 4);
    assert!(b.text.contains("Page one") && b.text.contains("Page four"), "got: {:?}", b.text);
}

#[tokio::test]
async fn pages_are_read_in_order() {
    let _guard = PDFIUM_LOCK.lock().await;
    let bytes = pdf_or_skip!(&["First page", "Second page", "Third page"]);

    let config = ExtractionConfig::builder()
        .text_filter(TextFilter::AsciiOnly)
        .build()
        .unwrap();
    let extracted = extract_text_only(SourceDocument::from_bytes("cv.pdf", bytes), &config)
        .await
        .unwrap();

    assert_eq!(extracted.page_count, 3);
    let first = extracted.text.find("First page").unwrap();
    let second = extracted.text.find("Second page").unwrap();
    let third = extracted.text.find("Third page").unwrap();
    assert!(first < second && second < third, "got: {:?}", extracted.text);
    assert!(extracted
        .text
        .chars()
        .all(|c| c == '\n' || (' '..='~').contains(&c)));
}

#[tokio::test]
async fn full_pipeline_with_fake_model() {
    let _guard = PDFIUM_LOCK.lock().await;
    let bytes = pdf_or_skip!(&["Name: Nguyen Van A"]);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cv.pdf");
    std::fs::write(&path, bytes).unwrap();

    let invoker = Arc::new(FakeInvoker::answering(
        r#"```json
{"name": "Nguyen Van A", "skills": [{"skill_name": "Rust"}]}
```"#,
    ));
    let output = fake_extractor(invoker.clone()).extract(path.as_path()).await.unwrap();

    assert_eq!(invoker.calls(), 1);
    assert_eq!(output.resume.name, "Nguyen Van A");
    assert_eq!(output.resume.skills[0].skill_name, "Rust");
    assert_eq!(output.resume.skills[0].description, "");
    assert_eq!(output.resume.email, "");
    assert_eq!(output.stats.page_count, 1);

    let prompt = invoker.last_prompt().unwrap();
    assert!(prompt.contains("Name: Nguyen Van A"));
    assert!(prompt.contains("Here is the output schema"));
    assert!(!prompt.contains("{resume_text}"));
}

#[tokio::test]
async fn model_failure_surfaces_unchanged() {
    let _guard = PDFIUM_LOCK.lock().await;
    let bytes = pdf_or_skip!(&["Name: Jane Doe"]);

    let invoker = Arc::new(FakeInvoker::failing(Some(429), "Rate limit is exceeded"));
    let err = fake_extractor(invoker.clone())
        .extract(SourceDocument::from_bytes("cv.pdf", bytes))
        .await
        .unwrap_err();

    assert_eq!(invoker.calls(), 1);
    assert_eq!(err.kind(), ErrorKind::ModelInvocation);
    assert!(err.to_string().contains("Rate limit is exceeded"));
}

#[tokio::test]
async fn schema_mismatch_is_reported() {
    let _guard = PDFIUM_LOCK.lock().await;
    let bytes = pdf_or_skip!(&["Name: Jane Doe"]);

    let invoker = Arc::new(FakeInvoker::answering(
        r#"{"email": "jane@example.com", "education": [{"degree": "BSc"}]}"#,
    ));
    let err = fake_extractor(invoker)
        .extract(SourceDocument::from_bytes("cv.pdf", bytes))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::SchemaValidation);
    match err {
        cv2json::Cv2JsonError::SchemaValidation { fields, .. } => {
            assert_eq!(fields, vec!["name", "education[0].organization"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn non_json_answer_is_schema_error() {
    let _guard = PDFIUM_LOCK.lock().await;
    let bytes = pdf_or_skip!(&["Name: Jane Doe"]);

    let invoker = Arc::new(FakeInvoker::answering("Sorry, I cannot help with that."));
    let err = fake_extractor(invoker)
        .extract(SourceDocument::from_bytes("cv.pdf", bytes))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SchemaValidation);
}

#[tokio::test]
async fn corrupt_pdf_never_reaches_model() {
    let _guard = PDFIUM_LOCK.lock().await;
    // Only needed to know pdfium is present.
    let _ = pdf_or_skip!(&[]);

    let invoker = Arc::new(FakeInvoker::answering("{}"));
    let err = fake_extractor(invoker.clone())
        .extract(SourceDocument::from_bytes(
            "broken.pdf",
            b"%PDF-1.7\nthis is not really a pdf".to_vec(),
        ))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::DocumentUnreadable);
    assert!(err.to_string().contains("broken.pdf"));
    assert_eq!(invoker.calls(), 0);
}
