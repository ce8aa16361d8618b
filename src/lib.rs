//! # cv2json
//!
//! Turn a PDF résumé into a structured JSON record with one hosted-model call.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input     check the file exists and starts with %PDF
//!  ├─ 2. Text      read the text layer of every page via pdfium
//!  ├─ 3. Prompt    résumé text + extraction template + schema instructions
//!  ├─ 4. Model     one chat completion (Azure OpenAI or any edgequake-llm provider)
//!  └─ 5. Validate  parse the JSON answer and check it against the schema
//! ```
//!
//! Only PDFs with a text layer are supported; scanned images yield empty
//! text. Every request ends in either a [`StructuredResume`] or a single
//! [`Cv2JsonError`] whose [`ErrorKind`] says which stage failed.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cv2json::{extract_resume, AzureSettings, ExtractionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExtractionConfig::builder()
//!         .azure(AzureSettings::new(
//!             std::env::var("AZURE_OPENAI_ENDPOINT")?,
//!             std::env::var("AZURE_OPENAI_API_KEY")?,
//!             std::env::var("AZURE_OPENAI_DEPLOYMENT_NAME")?,
//!         ))
//!         .build()?;
//!     let output = extract_resume("cv.pdf", &config).await?;
//!     println!("{}", serde_json::to_string_pretty(&output.resume)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `cv2json` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! cv2json = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod schema;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{AzureSettings, ExtractionConfig, ExtractionConfigBuilder, TextFilter};
pub use error::{Cv2JsonError, ErrorKind};
pub use extract::{
    extract_from_bytes, extract_resume, extract_resume_sync, extract_text_only, extract_to_file,
    ResumeExtractor,
};
pub use output::{
    Course, Education, ExtractedText, ExtractionOutput, ExtractionStats, ModelResponse, Skill,
    StructuredResume, TokenUsage,
};
pub use pipeline::input::SourceDocument;
pub use pipeline::llm::{AzureOpenAiInvoker, ModelInvoker, ProviderInvoker};
pub use progress::{ExtractionProgressCallback, NoopProgressCallback, ProgressCallback, Stage};
pub use schema::{SchemaDescriptor, RESUME_SCHEMA};
