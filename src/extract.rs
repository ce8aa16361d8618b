//! Résumé extraction entry points.
//!
//! [`ResumeExtractor`] owns a validated configuration and a resolved model
//! invoker, and runs one PDF at a time through the pipeline:
//!
//! ```text
//! validate_source ─▶ extract_text ─▶ build_prompt ─▶ invoke ─▶ validate_response
//! ```
//!
//! A request either yields a complete [`StructuredResume`] or exactly one
//! error. The model is called once per request, and never when the document
//! cannot be read. The free functions below are thin wrappers for one-off
//! calls.

use crate::config::ExtractionConfig;
use crate::error::Cv2JsonError;
use crate::output::{ExtractedText, ExtractionOutput, ExtractionStats, StructuredResume};
use crate::pipeline::input::SourceDocument;
use crate::pipeline::llm::{self, ModelInvoker};
use crate::pipeline::{prompt, text, validate};
use crate::progress::{ProgressCallback, Stage};
use crate::schema::RESUME_SCHEMA;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Reusable, thread-safe extractor.
///
/// Cloning is cheap; concurrent requests share the configuration and the
/// model client but nothing else.
#[derive(Clone)]
pub struct ResumeExtractor {
    config: Arc<ExtractionConfig>,
    invoker: Arc<dyn ModelInvoker>,
}

impl std::fmt::Debug for ResumeExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResumeExtractor")
            .field("config", &self.config)
            .field("invoker", &self.invoker.describe())
            .finish()
    }
}

impl ResumeExtractor {
    /// Build an extractor, resolving the model backend from `config`.
    pub fn new(config: ExtractionConfig) -> Result<Self, Cv2JsonError> {
        let invoker = llm::resolve_invoker(&config)?;
        Ok(Self::with_invoker(config, invoker))
    }

    /// Build an extractor around an explicit invoker.
    pub fn with_invoker(config: ExtractionConfig, invoker: Arc<dyn ModelInvoker>) -> Self {
        Self {
            config: Arc::new(config),
            invoker,
        }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Run one PDF through the pipeline.
    pub async fn extract(
        &self,
        source: impl Into<SourceDocument>,
    ) -> Result<ExtractionOutput, Cv2JsonError> {
        let source = source.into();
        let total_start = Instant::now();
        let callback = self.config.progress_callback.as_ref();
        info!(
            "Extracting résumé from {} via {}",
            source.display_name(),
            self.invoker.describe()
        );

        // ── Step 1: Text layer ───────────────────────────────────────────
        let (extracted, text_duration_ms) = run_stage(callback, Stage::ExtractText, async {
            text::extract_text(&source, &self.config).await
        })
        .await?;

        // ── Step 2: Prompt ───────────────────────────────────────────────
        let (prompt, _) = run_stage(callback, Stage::BuildPrompt, async {
            Ok(prompt::build_prompt(&RESUME_SCHEMA, &extracted.text, &self.config))
        })
        .await?;
        debug!("Prompt is {} chars", prompt.len());

        // ── Step 3: Model call ───────────────────────────────────────────
        let (response, llm_duration_ms) = run_stage(callback, Stage::InvokeModel, async {
            self.invoker.invoke(&prompt).await
        })
        .await?;
        debug!(
            "Model answered in {}ms with {} chars",
            llm_duration_ms,
            response.content.len()
        );

        // ── Step 4: Validation ───────────────────────────────────────────
        let (resume, _) = run_stage(callback, Stage::Validate, async {
            validate::validate_response(&response.content)
        })
        .await?;

        let stats = ExtractionStats {
            page_count: extracted.page_count,
            text_chars: extracted.text.chars().count(),
            stripped_chars: extracted.stripped_chars,
            prompt_chars: prompt.chars().count(),
            prompt_tokens: response.usage.as_ref().map(|u| u.prompt_tokens),
            completion_tokens: response.usage.as_ref().map(|u| u.completion_tokens),
            text_duration_ms,
            llm_duration_ms,
            total_duration_ms: total_start.elapsed().as_millis() as u64,
        };

        info!(
            "Extraction complete: {} pages, {} education, {} courses, {} skills, {}ms total",
            stats.page_count,
            resume.education.len(),
            resume.courses.len(),
            resume.skills.len(),
            stats.total_duration_ms
        );

        Ok(ExtractionOutput { resume, stats })
    }
}

/// Time a stage and report it to the progress callback.
async fn run_stage<T, F>(
    callback: Option<&ProgressCallback>,
    stage: Stage,
    fut: F,
) -> Result<(T, u64), Cv2JsonError>
where
    F: Future<Output = Result<T, Cv2JsonError>>,
{
    if let Some(cb) = callback {
        cb.on_stage_start(stage);
    }
    let start = Instant::now();
    let result = fut.await;
    let elapsed_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(value) => {
            if let Some(cb) = callback {
                cb.on_stage_complete(stage, elapsed_ms);
            }
            Ok((value, elapsed_ms))
        }
        Err(e) => {
            debug!("{} failed after {}ms: {}", stage.label(), elapsed_ms, e);
            if let Some(cb) = callback {
                cb.on_stage_error(stage, &e.to_string());
            }
            Err(e)
        }
    }
}

/// Extract a résumé from a PDF path or buffer.
///
/// This is the primary one-shot entry point. Build a [`ResumeExtractor`]
/// instead when processing many documents with the same configuration.
///
/// ```rust,no_run
/// use cv2json::{extract_resume, AzureSettings, ExtractionConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ExtractionConfig::builder()
///     .azure(AzureSettings::new(
///         "https://my-resource.openai.azure.com",
///         std::env::var("AZURE_OPENAI_API_KEY")?,
///         "gpt-4o-mini",
///     ))
///     .build()?;
/// let output = extract_resume("cv.pdf", &config).await?;
/// println!("{}", serde_json::to_string_pretty(&output.resume)?);
/// # Ok(())
/// # }
/// ```
pub async fn extract_resume(
    source: impl Into<SourceDocument>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, Cv2JsonError> {
    ResumeExtractor::new(config.clone())?.extract(source).await
}

/// Extract a résumé from PDF bytes held in memory.
pub async fn extract_from_bytes(
    name: impl Into<String>,
    bytes: impl Into<Vec<u8>>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, Cv2JsonError> {
    extract_resume(SourceDocument::from_bytes(name, bytes), config).await
}

/// Synchronous wrapper around [`extract_resume`].
///
/// Creates a temporary tokio runtime internally.
pub fn extract_resume_sync(
    source: impl Into<SourceDocument>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, Cv2JsonError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Cv2JsonError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(extract_resume(source, config))
}

/// Extract a résumé and write it as pretty JSON.
///
/// Uses atomic write (temp file + rename) so a failed request never leaves a
/// partial file behind.
pub async fn extract_to_file(
    source: impl Into<SourceDocument>,
    output_path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<ExtractionStats, Cv2JsonError> {
    let output = extract_resume(source, config).await?;
    write_json(output_path.as_ref(), &output.resume).await?;
    Ok(output.stats)
}

pub(crate) async fn write_json(path: &Path, resume: &StructuredResume) -> Result<(), Cv2JsonError> {
    let write_err = |e: std::io::Error| Cv2JsonError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    let mut json = serde_json::to_string_pretty(resume)
        .map_err(|e| Cv2JsonError::Internal(format!("Failed to serialise résumé: {e}")))?;
    json.push('\n');

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, json).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;
    Ok(())
}

/// Read the filtered text layer only. Does not require a model backend.
pub async fn extract_text_only(
    source: impl Into<SourceDocument>,
    config: &ExtractionConfig,
) -> Result<ExtractedText, Cv2JsonError> {
    text::extract_text(&source.into(), config).await
}
