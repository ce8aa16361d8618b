//! Error types for the cv2json library.
//!
//! Every request-level failure falls into one of three kinds, in the order
//! the pipeline can produce them:
//!
//! 1. [`Cv2JsonError::DocumentUnreadable`]: the PDF could not be opened or
//!    parsed. Detected before any model call.
//! 2. [`Cv2JsonError::ModelInvocation`]: the hosted model call failed
//!    (network, auth, quota, provider rejection).
//! 3. [`Cv2JsonError::SchemaValidation`]: the model answered, but the answer
//!    does not fit the résumé schema.
//!
//! The remaining variants describe a broken environment (no provider
//! configured, pdfium missing, bad configuration) rather than a bad request.
//! [`Cv2JsonError::kind`] collapses all of them into an [`ErrorKind`] so a
//! boundary layer can pick a status code without matching on messages.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the cv2json library.
#[derive(Debug, Error)]
pub enum Cv2JsonError {
    // ── Document errors ───────────────────────────────────────────────────
    /// The source does not exist, is not a PDF, or cannot be parsed as one.
    #[error("Cannot read PDF '{document}': {detail}")]
    DocumentUnreadable { document: String, detail: String },

    // ── Model errors ──────────────────────────────────────────────────────
    /// The hosted model call failed. `status` is the HTTP status when the
    /// provider answered with one.
    #[error("{}", model_invocation_message(.provider, .status, .detail))]
    ModelInvocation {
        provider: String,
        status: Option<u16>,
        detail: String,
    },

    // ── Validation errors ─────────────────────────────────────────────────
    /// The model response is not valid JSON or does not match the schema.
    /// `fields` lists every offending field path; it is empty when the
    /// response could not be parsed at all.
    #[error("{}", schema_validation_message(.fields, .detail))]
    SchemaValidation { fields: Vec<String>, detail: String },

    // ── Environment errors ────────────────────────────────────────────────
    /// No model backend was configured.
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Place libpdfium next to the binary, install it system-wide, or pass\n\
--pdfium-lib /path/to/libpdfium.\n"
    )]
    PdfiumBindingFailed(String),

    /// Could not create or write the output JSON file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification of a [`Cv2JsonError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    DocumentUnreadable,
    ModelInvocation,
    SchemaValidation,
    /// Configuration, library binding, or I/O problems outside a single request.
    Environment,
}

impl Cv2JsonError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Cv2JsonError::DocumentUnreadable { .. } => ErrorKind::DocumentUnreadable,
            Cv2JsonError::ModelInvocation { .. } => ErrorKind::ModelInvocation,
            Cv2JsonError::SchemaValidation { .. } => ErrorKind::SchemaValidation,
            Cv2JsonError::ProviderNotConfigured { .. }
            | Cv2JsonError::InvalidConfig(_)
            | Cv2JsonError::PdfiumBindingFailed(_)
            | Cv2JsonError::OutputWriteFailed { .. }
            | Cv2JsonError::Internal(_) => ErrorKind::Environment,
        }
    }

    pub(crate) fn unreadable(document: impl Into<String>, detail: impl Into<String>) -> Self {
        Cv2JsonError::DocumentUnreadable {
            document: document.into(),
            detail: detail.into(),
        }
    }

    pub(crate) fn invalid_response(detail: impl Into<String>) -> Self {
        Cv2JsonError::SchemaValidation {
            fields: Vec::new(),
            detail: detail.into(),
        }
    }
}

fn model_invocation_message(provider: &str, status: &Option<u16>, detail: &str) -> String {
    match status {
        Some(code) => format!("Model call to '{provider}' failed (HTTP {code}): {detail}"),
        None => format!("Model call to '{provider}' failed: {detail}"),
    }
}

fn schema_validation_message(fields: &[String], detail: &str) -> String {
    if fields.is_empty() {
        format!("Model response does not match the résumé schema: {detail}")
    } else {
        format!(
            "Model response does not match the résumé schema ({}): {detail}",
            fields.join(", ")
        )
    }
}
