//! Pipeline behaviour that needs neither pdfium nor a network.

mod common;

use common::FakeInvoker;
use cv2json::{
    extract_from_bytes, extract_resume, extract_to_file, AzureSettings, ErrorKind,
    ExtractionConfig, ResumeExtractor,
};
use std::sync::Arc;

fn config_with(invoker: Arc<FakeInvoker>) -> ExtractionConfig {
    ExtractionConfig::builder().invoker(invoker).build().unwrap()
}

#[tokio::test]
async fn missing_file_fails_without_model_call() {
    let invoker = Arc::new(FakeInvoker::answering(r#"{"name": "Jane"}"#));
    let err = extract_resume("/no/such/dir/resume.pdf", &config_with(invoker.clone()))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::DocumentUnreadable);
    assert!(err.to_string().contains("resume.pdf"));
    assert_eq!(invoker.calls(), 0);
}

#[tokio::test]
async fn non_pdf_bytes_fail_without_model_call() {
    let invoker = Arc::new(FakeInvoker::answering(r#"{"name": "Jane"}"#));
    let config = config_with(invoker.clone());

    for data in [Vec::new(), b"Name: Jane Doe\n".to_vec(), b"PK\x03\x04".to_vec()] {
        let err = extract_from_bytes("upload.docx", data, &config).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DocumentUnreadable);
    }
    assert_eq!(invoker.calls(), 0);
}

#[tokio::test]
async fn failed_extraction_writes_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("cv.json");
    let invoker = Arc::new(FakeInvoker::answering(r#"{"name": "Jane"}"#));

    let err = extract_to_file("/no/such/cv.pdf", &out, &config_with(invoker))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::DocumentUnreadable);
    assert!(!out.exists());
    assert!(!out.with_extension("json.tmp").exists());
}

#[test]
fn extractor_is_shareable() {
    fn assert_send_sync<T: Send + Sync + Clone>() {}
    assert_send_sync::<ResumeExtractor>();
}

#[test]
fn explicit_invoker_wins_over_azure() {
    let invoker = Arc::new(FakeInvoker::answering("{}"));
    let config = ExtractionConfig::builder()
        .azure(AzureSettings::new("https://x.openai.azure.com", "k", "dep"))
        .invoker(invoker)
        .build()
        .unwrap();

    let extractor = ResumeExtractor::new(config).unwrap();
    assert!(format!("{extractor:?}").contains("fake"));
}

#[test]
fn no_backend_is_environment_error() {
    let err = ResumeExtractor::new(ExtractionConfig::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Environment);
    assert!(err.to_string().contains("not configured"));
}
