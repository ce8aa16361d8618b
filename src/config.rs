//! Configuration types for résumé extraction.
//!
//! Everything the pipeline needs is carried by an [`ExtractionConfig`], built
//! once at process start through [`ExtractionConfigBuilder`] and shared
//! read-only across concurrent requests. The library never reads environment
//! variables itself; the CLI maps its flags and env vars onto the builder.

use crate::error::Cv2JsonError;
use crate::pipeline::llm::ModelInvoker;
use crate::progress::ProgressCallback;
use crate::prompts::{FORMAT_INSTRUCTIONS_SLOT, RESUME_TEXT_SLOT};
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// API version used when none is given.
pub const DEFAULT_AZURE_API_VERSION: &str = "2024-02-15-preview";

/// Output language requested from the model when none is given.
pub const DEFAULT_TARGET_LANGUAGE: &str = "English";

/// Connection parameters for an Azure OpenAI chat deployment.
#[derive(Clone, PartialEq, Eq)]
pub struct AzureSettings {
    /// Resource endpoint, e.g. `https://my-resource.openai.azure.com`.
    pub endpoint: String,
    pub api_key: String,
    /// Deployment name of the chat model.
    pub deployment: String,
    pub api_version: String,
}

impl AzureSettings {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        deployment: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            deployment: deployment.into(),
            api_version: DEFAULT_AZURE_API_VERSION.to_string(),
        }
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    fn validate(&self) -> Result<(), Cv2JsonError> {
        if self.endpoint.trim().is_empty() {
            return Err(Cv2JsonError::InvalidConfig(
                "Azure endpoint must not be empty".into(),
            ));
        }
        if !(self.endpoint.starts_with("https://") || self.endpoint.starts_with("http://")) {
            return Err(Cv2JsonError::InvalidConfig(format!(
                "Azure endpoint must be an http(s) URL, got '{}'",
                self.endpoint
            )));
        }
        if self.api_key.is_empty() {
            return Err(Cv2JsonError::InvalidConfig(
                "Azure API key must not be empty".into(),
            ));
        }
        if self.deployment.trim().is_empty() {
            return Err(Cv2JsonError::InvalidConfig(
                "Azure deployment name must not be empty".into(),
            ));
        }
        if self.api_version.trim().is_empty() {
            return Err(Cv2JsonError::InvalidConfig(
                "Azure API version must not be empty".into(),
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for AzureSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureSettings")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("deployment", &self.deployment)
            .field("api_version", &self.api_version)
            .finish()
    }
}

/// Which characters survive text extraction.
///
/// The ASCII filter drops accented letters and non-Latin scripts before the
/// model sees the text. Use [`TextFilter::KeepUnicode`] to keep them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextFilter {
    /// Keep printable ASCII (`0x20..=0x7E`) only. (default)
    #[default]
    AsciiOnly,
    /// Keep every code point except control characters (tab is kept).
    KeepUnicode,
}

/// Configuration for résumé extraction.
///
/// # Example
/// ```rust
/// use cv2json::{AzureSettings, ExtractionConfig};
///
/// let config = ExtractionConfig::builder()
///     .azure(AzureSettings::new(
///         "https://my-resource.openai.azure.com",
///         "secret",
///         "gpt-4o-mini",
///     ))
///     .target_language("Vietnamese")
///     .build()
///     .unwrap();
/// assert_eq!(config.target_language, "Vietnamese");
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Azure OpenAI connection. Used when no `invoker` is set.
    pub azure: Option<AzureSettings>,

    /// edgequake-llm provider name (e.g. "openai", "anthropic", "ollama").
    /// Used when neither `invoker` nor `azure` nor `provider` is set.
    pub provider_name: Option<String>,

    /// Model identifier for `provider_name`. If None, uses "gpt-4.1-nano".
    pub model: Option<String>,

    /// Pre-constructed edgequake-llm provider.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Pre-constructed invoker. Takes precedence over every other backend.
    pub invoker: Option<Arc<dyn ModelInvoker>>,

    /// Language the model translates extracted content into. Default: English.
    pub target_language: String,

    /// Character filter applied to every extracted line. Default: ASCII only.
    pub text_filter: TextFilter,

    /// Sampling temperature. Default: 0.1.
    pub temperature: f32,

    /// Maximum completion tokens. Default: 4096.
    pub max_tokens: usize,

    /// Ask for a JSON object response. Azure sets `response_format`; other
    /// providers get an explicit instruction appended to the prompt.
    /// Default: false.
    pub json_mode: bool,

    /// Request timeout for the model call in seconds. Default: None, the
    /// transport default applies.
    pub api_timeout_secs: Option<u64>,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Custom prompt template. Must contain `{resume_text}` and
    /// `{format_instructions}`; `{target_language}` is optional.
    pub prompt_template: Option<String>,

    /// Path to a pdfium shared library. If None, the working directory and
    /// then the system library path are tried.
    pub pdfium_library: Option<PathBuf>,

    /// Per-stage progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            azure: None,
            provider_name: None,
            model: None,
            provider: None,
            invoker: None,
            target_language: DEFAULT_TARGET_LANGUAGE.to_string(),
            text_filter: TextFilter::default(),
            temperature: 0.1,
            max_tokens: 4096,
            json_mode: false,
            api_timeout_secs: None,
            password: None,
            prompt_template: None,
            pdfium_library: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("azure", &self.azure)
            .field("provider_name", &self.provider_name)
            .field("model", &self.model)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("invoker", &self.invoker.as_ref().map(|i| i.describe()))
            .field("target_language", &self.target_language)
            .field("text_filter", &self.text_filter)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("json_mode", &self.json_mode)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("prompt_template", &self.prompt_template.as_ref().map(|t| t.len()))
            .field("pdfium_library", &self.pdfium_library)
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn azure(mut self, settings: AzureSettings) -> Self {
        self.config.azure = Some(settings);
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn invoker(mut self, invoker: Arc<dyn ModelInvoker>) -> Self {
        self.config.invoker = Some(invoker);
        self
    }

    pub fn target_language(mut self, language: impl Into<String>) -> Self {
        self.config.target_language = language.into();
        self
    }

    pub fn text_filter(mut self, filter: TextFilter) -> Self {
        self.config.text_filter = filter;
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n.max(1);
        self
    }

    pub fn json_mode(mut self, v: bool) -> Self {
        self.config.json_mode = v;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = Some(secs);
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn prompt_template(mut self, template: impl Into<String>) -> Self {
        self.config.prompt_template = Some(template.into());
        self
    }

    pub fn pdfium_library(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library = Some(path.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, Cv2JsonError> {
        let c = &self.config;
        if let Some(ref azure) = c.azure {
            azure.validate()?;
        }
        if c.target_language.trim().is_empty() {
            return Err(Cv2JsonError::InvalidConfig(
                "Target language must not be empty".into(),
            ));
        }
        if c.api_timeout_secs == Some(0) {
            return Err(Cv2JsonError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        if let Some(ref template) = c.prompt_template {
            for slot in [RESUME_TEXT_SLOT, FORMAT_INSTRUCTIONS_SLOT] {
                if !template.contains(slot) {
                    return Err(Cv2JsonError::InvalidConfig(format!(
                        "Prompt template is missing the {slot} placeholder"
                    )));
                }
            }
        }
        Ok(self.config)
    }
}
