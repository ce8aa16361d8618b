//! Pipeline stages for PDF-to-résumé extraction.
//!
//! Each submodule implements exactly one transformation step and can be
//! tested on its own.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ text ──▶ prompt ──▶ llm ──▶ validate
//! (path)   (pdfium)  (template) (model) (schema)
//! ```
//!
//! 1. [`input`]    : check the path or byte buffer is a readable PDF
//! 2. [`text`]     : read the text layer page by page in `spawn_blocking`,
//!    since pdfium is blocking
//! 3. [`prompt`]   : fill the extraction template with the text and the
//!    schema's format instructions
//! 4. [`llm`]      : the single model call; the only stage with network I/O
//! 5. [`validate`] : parse the answer and check it against the résumé schema

pub mod input;
pub mod llm;
pub mod prompt;
pub mod text;
pub mod validate;
