//! Model invocation: send one prompt, return the raw answer.
//!
//! [`ModelInvoker`] is the seam between the pipeline and the hosted model.
//! Two implementations ship with the crate:
//!
//! * [`AzureOpenAiInvoker`] talks to an Azure OpenAI chat deployment directly
//!   over HTTPS, with endpoint, key, deployment and API version fixed at
//!   construction.
//! * [`ProviderInvoker`] wraps any [`edgequake_llm::LLMProvider`] (OpenAI,
//!   Anthropic, Gemini, Ollama, …).
//!
//! Every call makes exactly one request. Nothing is retried here; failures
//! surface as [`Cv2JsonError::ModelInvocation`] with the provider's detail.

use crate::config::{AzureSettings, ExtractionConfig};
use crate::error::Cv2JsonError;
use crate::output::{ModelResponse, TokenUsage};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use serde::Deserialize;
use serde_json::{json, Value};
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Default model for named edgequake-llm providers.
pub const DEFAULT_PROVIDER_MODEL: &str = "gpt-4.1-nano";

/// Capability to turn a prompt into a model response.
///
/// Implementations are shared across concurrent requests and must not hold
/// per-request state.
#[async_trait]
pub trait ModelInvoker: Send + Sync {
    /// Send `prompt` and return the model's raw text.
    async fn invoke(&self, prompt: &str) -> Result<ModelResponse, Cv2JsonError>;

    /// Short description for logs, e.g. `azure:gpt-4o-mini`.
    fn describe(&self) -> String {
        "custom".to_string()
    }
}

// ── Azure OpenAI ─────────────────────────────────────────────────────────

/// Sampling options sent with each request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RequestOptions {
    pub temperature: f32,
    pub max_tokens: usize,
    pub json_mode: bool,
}

impl RequestOptions {
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            json_mode: config.json_mode,
        }
    }
}

/// Direct client for an Azure OpenAI chat-completions deployment.
pub struct AzureOpenAiInvoker {
    client: reqwest::Client,
    url: reqwest::Url,
    api_key: String,
    deployment: String,
    options: RequestOptions,
}

impl AzureOpenAiInvoker {
    /// Build the invoker. The HTTP client is created once and reused.
    pub fn new(
        settings: &AzureSettings,
        options: RequestOptions,
        timeout: Option<Duration>,
    ) -> Result<Self, Cv2JsonError> {
        let url = chat_completions_url(settings)?;

        let mut builder = reqwest::Client::builder();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        let client = builder
            .build()
            .map_err(|e| Cv2JsonError::InvalidConfig(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            url,
            api_key: settings.api_key.clone(),
            deployment: settings.deployment.clone(),
            options,
        })
    }

    pub fn url(&self) -> &reqwest::Url {
        &self.url
    }

    fn error(&self, status: Option<u16>, detail: impl Into<String>) -> Cv2JsonError {
        Cv2JsonError::ModelInvocation {
            provider: self.describe(),
            status,
            detail: detail.into(),
        }
    }
}

#[async_trait]
impl ModelInvoker for AzureOpenAiInvoker {
    async fn invoke(&self, prompt: &str) -> Result<ModelResponse, Cv2JsonError> {
        let body = chat_request_body(prompt, &self.options);
        debug!("POST {} ({} prompt chars)", self.url, prompt.len());

        let response = self
            .client
            .post(self.url.clone())
            .header("api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    self.error(None, format!("request timed out: {e}"))
                } else {
                    self.error(None, e.to_string())
                }
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| self.error(Some(status.as_u16()), e.to_string()))?;

        if !status.is_success() {
            return Err(self.error(Some(status.as_u16()), provider_error_detail(&text)));
        }

        parse_chat_response(&text).map_err(|detail| self.error(Some(status.as_u16()), detail))
    }

    fn describe(&self) -> String {
        format!("azure:{}", self.deployment)
    }
}

/// `{endpoint}/openai/deployments/{deployment}/chat/completions?api-version={v}`
pub fn chat_completions_url(settings: &AzureSettings) -> Result<reqwest::Url, Cv2JsonError> {
    let base = format!(
        "{}/openai/deployments/{}/chat/completions",
        settings.endpoint.trim_end_matches('/'),
        settings.deployment.trim()
    );
    let mut url = reqwest::Url::parse(&base)
        .map_err(|e| Cv2JsonError::InvalidConfig(format!("Azure endpoint '{}': {e}", settings.endpoint)))?;
    url.query_pairs_mut()
        .append_pair("api-version", settings.api_version.trim());
    Ok(url)
}

/// JSON body of a single-turn chat request.
pub fn chat_request_body(prompt: &str, options: &RequestOptions) -> Value {
    let mut body = json!({
        "messages": [{ "role": "user", "content": prompt }],
        "temperature": options.temperature,
        "max_tokens": options.max_tokens,
    });
    if options.json_mode {
        body["response_format"] = json!({ "type": "json_object" });
    }
    body
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatChoiceMessage>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

/// Pull the first choice's content out of a chat-completions response.
pub fn parse_chat_response(body: &str) -> Result<ModelResponse, String> {
    let completion: ChatCompletion = serde_json::from_str(body)
        .map_err(|e| format!("unexpected response body: {e}"))?;

    let choice = completion
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| "response contained no choices".to_string())?;

    if choice.finish_reason.as_deref() == Some("content_filter") {
        return Err("response was blocked by the provider's content filter".to_string());
    }

    let content = choice
        .message
        .and_then(|m| m.content)
        .ok_or_else(|| "response message has no content".to_string())?;

    Ok(ModelResponse {
        content,
        usage: completion.usage.map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
        }),
    })
}

/// Best-effort extraction of `error.message` from a provider error body.
fn provider_error_detail(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            let error = v.get("error")?;
            let message = error.get("message")?.as_str()?.to_string();
            Some(match error.get("code").and_then(Value::as_str) {
                Some(code) => format!("{code}: {message}"),
                None => message,
            })
        })
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "empty error response".to_string()
            } else {
                trimmed.chars().take(500).collect()
            }
        })
}

// ── edgequake-llm providers ──────────────────────────────────────────────

/// Appended to the prompt in JSON mode. edgequake-llm's completion options
/// carry no response-format switch, so the request is made in the prompt.
pub const JSON_MODE_INSTRUCTION: &str =
    "Respond with a single JSON object only, with no text before or after it.";

/// Prompt actually sent to an edgequake-llm provider.
pub fn provider_prompt<'a>(prompt: &'a str, options: &RequestOptions) -> Cow<'a, str> {
    if options.json_mode {
        Cow::Owned(format!("{prompt}\n\n{JSON_MODE_INSTRUCTION}"))
    } else {
        Cow::Borrowed(prompt)
    }
}

/// Adapts an [`LLMProvider`] to [`ModelInvoker`].
pub struct ProviderInvoker {
    provider: Arc<dyn LLMProvider>,
    label: String,
    options: RequestOptions,
}

impl ProviderInvoker {
    pub fn new(provider: Arc<dyn LLMProvider>, label: impl Into<String>, options: RequestOptions) -> Self {
        Self {
            provider,
            label: label.into(),
            options,
        }
    }

    /// Instantiate a named provider via [`ProviderFactory`].
    pub fn from_name(name: &str, model: &str, options: RequestOptions) -> Result<Self, Cv2JsonError> {
        let provider = ProviderFactory::create_llm_provider(name, model).map_err(|e| {
            Cv2JsonError::ProviderNotConfigured {
                provider: name.to_string(),
                hint: format!("{e}"),
            }
        })?;
        Ok(Self::new(provider, format!("{name}:{model}"), options))
    }
}

#[async_trait]
impl ModelInvoker for ProviderInvoker {
    async fn invoke(&self, prompt: &str) -> Result<ModelResponse, Cv2JsonError> {
        let prompt = provider_prompt(prompt, &self.options);
        let messages = vec![ChatMessage::user(prompt.as_ref())];
        let options = CompletionOptions {
            temperature: Some(self.options.temperature),
            max_tokens: Some(self.options.max_tokens),
            ..Default::default()
        };

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| Cv2JsonError::ModelInvocation {
                provider: self.label.clone(),
                status: None,
                detail: format!("{}", e),
            })?;

        Ok(ModelResponse {
            content: response.content,
            usage: Some(TokenUsage {
                prompt_tokens: response.prompt_tokens as u64,
                completion_tokens: response.completion_tokens as u64,
            }),
        })
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}

// ── Resolution ───────────────────────────────────────────────────────────

/// Pick the model backend, from most-specific to least-specific.
///
/// 1. `config.invoker`: used as-is (tests, custom middleware).
/// 2. `config.azure`: direct Azure OpenAI deployment.
/// 3. `config.provider`: pre-built edgequake-llm provider.
/// 4. `config.provider_name` (+ `config.model`): built via [`ProviderFactory`].
///
/// There is no environment auto-detection; with none of the above set this
/// returns [`Cv2JsonError::ProviderNotConfigured`].
pub fn resolve_invoker(config: &ExtractionConfig) -> Result<Arc<dyn ModelInvoker>, Cv2JsonError> {
    if let Some(ref invoker) = config.invoker {
        return Ok(Arc::clone(invoker));
    }

    let options = RequestOptions::from_config(config);

    if let Some(ref azure) = config.azure {
        let timeout = config.api_timeout_secs.map(Duration::from_secs);
        let invoker = AzureOpenAiInvoker::new(azure, options, timeout)?;
        info!("Using Azure OpenAI deployment '{}'", azure.deployment);
        return Ok(Arc::new(invoker));
    }

    if let Some(ref provider) = config.provider {
        let label = config.model.clone().unwrap_or_else(|| "provider".to_string());
        return Ok(Arc::new(ProviderInvoker::new(Arc::clone(provider), label, options)));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or(DEFAULT_PROVIDER_MODEL);
        info!("Using provider '{}' with model '{}'", name, model);
        return Ok(Arc::new(ProviderInvoker::from_name(name, model, options)?));
    }

    Err(Cv2JsonError::ProviderNotConfigured {
        provider: "none".to_string(),
        hint: "Configure an Azure OpenAI deployment (endpoint, API key, deployment name) \
or name an LLM provider."
            .to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> AzureSettings {
        AzureSettings::new("https://res.openai.azure.com/", "k", "gpt-4o-mini")
    }

    #[test]
    fn url_layout() {
        let url = chat_completions_url(&settings()).unwrap();
        assert_eq!(
            url.as_str(),
            "https://res.openai.azure.com/openai/deployments/gpt-4o-mini/chat/completions?api-version=2024-02-15-preview"
        );
    }

    #[test]
    fn request_body_has_single_user_message() {
        let options = RequestOptions {
            temperature: 0.1,
            max_tokens: 512,
            json_mode: false,
        };
        let body = chat_request_body("hello", &options);
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "hello");
        assert_eq!(body["max_tokens"], 512);
        assert!(body.get("response_format").is_none());

        let body = chat_request_body("hello", &RequestOptions { json_mode: true, ..options });
        assert_eq!(body["response_format"]["type"], "json_object");
    }

    #[test]
    fn parses_first_choice_and_usage() {
        let body = r#"{
            "choices": [{"index": 0, "finish_reason": "stop",
                         "message": {"role": "assistant", "content": "{\"name\": \"A\"}"}}],
            "usage": {"prompt_tokens": 812, "completion_tokens": 95, "total_tokens": 907}
        }"#;
        let r = parse_chat_response(body).unwrap();
        assert_eq!(r.content, r#"{"name": "A"}"#);
        assert_eq!(
            r.usage,
            Some(TokenUsage {
                prompt_tokens: 812,
                completion_tokens: 95
            })
        );
    }

    #[test]
    fn content_filter_is_an_error() {
        let body = r#"{"choices": [{"finish_reason": "content_filter", "message": {"content": null}}]}"#;
        let err = parse_chat_response(body).unwrap_err();
        assert!(err.contains("content filter"));
    }

    #[test]
    fn empty_choices_is_an_error() {
        assert!(parse_chat_response(r#"{"choices": []}"#).is_err());
        assert!(parse_chat_response("not json").is_err());
    }

    #[test]
    fn provider_error_detail_prefers_message() {
        let body = r#"{"error": {"code": "401", "message": "Access denied due to invalid subscription key."}}"#;
        assert_eq!(
            provider_error_detail(body),
            "401: Access denied due to invalid subscription key."
        );
        assert_eq!(provider_error_detail("  "), "empty error response");
        assert_eq!(provider_error_detail("Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn provider_prompt_carries_json_mode() {
        let mut options = RequestOptions {
            temperature: 0.1,
            max_tokens: 512,
            json_mode: false,
        };
        assert_eq!(provider_prompt("extract", &options), "extract");

        options.json_mode = true;
        let prompt = provider_prompt("extract", &options);
        assert!(prompt.starts_with("extract\n\n"));
        assert!(prompt.ends_with(JSON_MODE_INSTRUCTION));
    }

    #[test]
    fn resolve_without_backend_fails() {
        let err = match resolve_invoker(&ExtractionConfig::default()) {
            Ok(_) => panic!("expected an error"),
            Err(e) => e,
        };
        assert!(matches!(err, Cv2JsonError::ProviderNotConfigured { .. }));
    }

    #[test]
    fn resolve_prefers_azure() {
        let config = ExtractionConfig::builder()
            .azure(settings())
            .provider_name("openai")
            .build()
            .unwrap();
        let invoker = resolve_invoker(&config).unwrap();
        assert_eq!(invoker.describe(), "azure:gpt-4o-mini");
    }
}
