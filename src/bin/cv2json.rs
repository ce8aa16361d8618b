//! CLI binary for cv2json.
//!
//! A thin shim over the library crate that maps CLI flags and environment
//! variables to `ExtractionConfig`, prints the résumé JSON, and turns the
//! error kind into the process exit status.

use anyhow::{Context, Result};
use clap::Parser;
use cv2json::pipeline::prompt::build_prompt;
use cv2json::{
    extract_resume, extract_text_only, extract_to_file, AzureSettings, Cv2JsonError, ErrorKind,
    ExtractionConfig, ExtractionProgressCallback, ExtractionStats, ProgressCallback, Stage,
    TextFilter, RESUME_SCHEMA,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner that shows the current stage and logs one line per finished stage.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("cv2json");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }
}

impl ExtractionProgressCallback for CliProgressCallback {
    fn on_stage_start(&self, stage: Stage) {
        self.bar.set_message(format!("{}…", stage.label()));
    }

    fn on_stage_complete(&self, stage: Stage, elapsed_ms: u64) {
        self.bar.println(format!(
            "  {} {:<20} {}",
            green("✓"),
            stage.label(),
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        ));
        if stage == Stage::Validate {
            self.bar.finish_and_clear();
        }
    }

    fn on_stage_error(&self, stage: Stage, error: &str) {
        let first_line = error.lines().next().unwrap_or(error);
        let msg = if first_line.chars().count() > 80 {
            let cut: String = first_line.chars().take(79).collect();
            format!("{cut}\u{2026}")
        } else {
            first_line.to_string()
        };

        self.bar.println(format!("  {} {:<20} {}", red("✗"), stage.label(), red(&msg)));
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract to stdout using Azure OpenAI settings from the environment
  cv2json resume.pdf

  # Write to a file, output in Vietnamese
  cv2json --language Vietnamese resume.pdf -o resume.json

  # Use another provider through edgequake-llm
  cv2json --provider openai --model gpt-4.1-mini resume.pdf

  # Inspect what the model would see (no API call)
  cv2json --text-only resume.pdf
  cv2json --print-prompt --keep-unicode resume.pdf

EXIT STATUS:
  0  success
  2  the PDF could not be read
  3  the model call failed
  4  the model answer does not match the résumé schema
  1  any other error (configuration, pdfium, output file)

ENVIRONMENT VARIABLES:
  AZURE_OPENAI_ENDPOINT         Resource endpoint, e.g. https://x.openai.azure.com
  AZURE_OPENAI_API_KEY          API key
  AZURE_OPENAI_DEPLOYMENT_NAME  Chat deployment name
  AZURE_OPENAI_API_VERSION      API version (default 2024-02-15-preview)
  CV2JSON_LANGUAGE              Output language (default English)
  OPENAI_API_KEY, ...           Read by edgequake-llm when --provider is set
  RUST_LOG                      Override the log filter
"#;

/// Extract structured résumé data from PDF files.
#[derive(Parser, Debug)]
#[command(
    name = "cv2json",
    version,
    about = "Extract structured résumé data from PDF files using an LLM",
    long_about = "Read the text layer of a PDF résumé and ask a hosted language model to \
return it as a JSON record (name, contact details, education, courses, skills). Azure \
OpenAI is used by default; any edgequake-llm provider can be selected with --provider.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF file to read.
    input: PathBuf,

    /// Write JSON to this file instead of stdout.
    #[arg(short, long, env = "CV2JSON_OUTPUT")]
    output: Option<PathBuf>,

    /// Azure OpenAI resource endpoint.
    #[arg(long, env = "AZURE_OPENAI_ENDPOINT")]
    azure_endpoint: Option<String>,

    /// Azure OpenAI API key.
    #[arg(long, env = "AZURE_OPENAI_API_KEY", hide_env_values = true)]
    azure_api_key: Option<String>,

    /// Azure OpenAI chat deployment name.
    #[arg(long, env = "AZURE_OPENAI_DEPLOYMENT_NAME")]
    azure_deployment: Option<String>,

    /// Azure OpenAI API version.
    #[arg(long, env = "AZURE_OPENAI_API_VERSION", default_value = cv2json::config::DEFAULT_AZURE_API_VERSION)]
    azure_api_version: String,

    /// edgequake-llm provider (openai, anthropic, gemini, ollama, ...) instead of Azure.
    #[arg(long, env = "CV2JSON_PROVIDER")]
    provider: Option<String>,

    /// Model ID for --provider.
    #[arg(long, env = "CV2JSON_MODEL")]
    model: Option<String>,

    /// Language the extracted values are translated into.
    #[arg(long, env = "CV2JSON_LANGUAGE", default_value = cv2json::config::DEFAULT_TARGET_LANGUAGE)]
    language: String,

    /// Keep non-ASCII characters (accents, CJK) in the extracted text.
    #[arg(long, env = "CV2JSON_KEEP_UNICODE")]
    keep_unicode: bool,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "CV2JSON_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Text file with a custom prompt template ({resume_text}, {format_instructions}).
    #[arg(long, env = "CV2JSON_PROMPT_TEMPLATE")]
    prompt_template: Option<PathBuf>,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "CV2JSON_TEMPERATURE", default_value_t = 0.1)]
    temperature: f32,

    /// Max LLM output tokens.
    #[arg(long, env = "CV2JSON_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// Model call timeout in seconds. No timeout when unset.
    #[arg(long, env = "CV2JSON_API_TIMEOUT")]
    api_timeout: Option<u64>,

    /// Ask the model for a JSON object response only.
    #[arg(long, env = "CV2JSON_JSON_MODE")]
    json_mode: bool,

    /// Path to libpdfium or the directory containing it.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Print the extracted text and exit. No model call.
    #[arg(long, conflicts_with = "print_prompt")]
    text_only: bool,

    /// Print the prompt that would be sent and exit. No model call.
    #[arg(long)]
    print_prompt: bool,

    /// Print single-line JSON instead of pretty JSON.
    #[arg(long)]
    compact: bool,

    /// Print timing and token statistics to stderr.
    #[arg(long)]
    stats: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "CV2JSON_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "CV2JSON_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "CV2JSON_QUIET", conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    fn wants_model(&self) -> bool {
        !self.text_only && !self.print_prompt
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner gives the feedback that matters, so INFO logs are hidden
    // while it is shown.
    let show_progress = !cli.quiet && !cli.no_progress && cli.wants_model();
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match run(&cli, show_progress).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", red("error:"), e);
            ExitCode::from(exit_status(&e))
        }
    }
}

/// Exit status for a failed run.
fn exit_status(e: &anyhow::Error) -> u8 {
    match e.downcast_ref::<Cv2JsonError>().map(Cv2JsonError::kind) {
        Some(ErrorKind::DocumentUnreadable) => 2,
        Some(ErrorKind::ModelInvocation) => 3,
        Some(ErrorKind::SchemaValidation) => 4,
        Some(ErrorKind::Environment) | None => 1,
    }
}

async fn run(cli: &Cli, show_progress: bool) -> Result<()> {
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ExtractionProgressCallback>)
    } else {
        None
    };

    let config = build_config(cli, progress_cb).await?;

    // ── Offline modes ────────────────────────────────────────────────────
    if !cli.wants_model() {
        let extracted = extract_text_only(cli.input.as_path(), &config)
            .await
            .context("Text extraction failed")?;
        let body = if cli.text_only {
            extracted.text.clone()
        } else {
            build_prompt(&RESUME_SCHEMA, &extracted.text, &config)
        };
        write_stdout(&body)?;
        if cli.stats {
            eprintln!(
                "{} pages  {} chars  {} stripped",
                extracted.page_count,
                extracted.text.chars().count(),
                extracted.stripped_chars
            );
        }
        return Ok(());
    }

    // ── Extraction ───────────────────────────────────────────────────────
    if let Some(ref output_path) = cli.output {
        let stats = extract_to_file(cli.input.as_path(), output_path, &config)
            .await
            .context("Extraction failed")?;

        if !cli.quiet {
            eprintln!(
                "{}  {} pages  {}ms  →  {}",
                green("✔"),
                stats.page_count,
                stats.total_duration_ms,
                bold(&output_path.display().to_string()),
            );
        }
        if cli.stats {
            print_stats(&stats);
        }
    } else {
        let output = extract_resume(cli.input.as_path(), &config)
            .await
            .context("Extraction failed")?;

        let json = if cli.compact {
            serde_json::to_string(&output.resume)
        } else {
            serde_json::to_string_pretty(&output.resume)
        }
        .context("Failed to serialise résumé")?;
        write_stdout(&json)?;

        if cli.stats {
            print_stats(&output.stats);
        }
    }

    Ok(())
}

/// Map CLI args to `ExtractionConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ExtractionConfig> {
    let prompt_template = if let Some(ref path) = cli.prompt_template {
        Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read prompt template from {:?}", path))?,
        )
    } else {
        None
    };

    let mut builder = ExtractionConfig::builder()
        .target_language(cli.language.clone())
        .text_filter(if cli.keep_unicode {
            TextFilter::KeepUnicode
        } else {
            TextFilter::AsciiOnly
        })
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens)
        .json_mode(cli.json_mode);

    if let Some(secs) = cli.api_timeout {
        builder = builder.api_timeout_secs(secs);
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(template) = prompt_template {
        builder = builder.prompt_template(template);
    }
    if let Some(ref lib) = cli.pdfium_lib {
        builder = builder.pdfium_library(lib.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    // Offline modes never touch a model, so the backend is left unset.
    if cli.wants_model() {
        match cli.provider.as_deref() {
            Some(name) if !name.eq_ignore_ascii_case("azure") => {
                builder = builder.provider_name(name);
                if let Some(ref model) = cli.model {
                    builder = builder.model(model.clone());
                }
            }
            _ => {
                builder = builder.azure(azure_settings(cli)?);
            }
        }
    }

    builder.build().context("Invalid configuration")
}

fn azure_settings(cli: &Cli) -> Result<AzureSettings> {
    let missing: Vec<&str> = [
        ("AZURE_OPENAI_ENDPOINT", &cli.azure_endpoint),
        ("AZURE_OPENAI_API_KEY", &cli.azure_api_key),
        ("AZURE_OPENAI_DEPLOYMENT_NAME", &cli.azure_deployment),
    ]
    .into_iter()
    .filter(|(_, v)| v.as_deref().map_or(true, str::is_empty))
    .map(|(name, _)| name)
    .collect();

    match (&cli.azure_endpoint, &cli.azure_api_key, &cli.azure_deployment) {
        (Some(endpoint), Some(key), Some(deployment)) if missing.is_empty() => Ok(
            AzureSettings::new(endpoint, key, deployment).with_api_version(&cli.azure_api_version),
        ),
        _ => Err(Cv2JsonError::ProviderNotConfigured {
            provider: "azure".to_string(),
            hint: format!(
                "Set {} (or pass --provider to use another backend).",
                missing.join(", ")
            ),
        }
        .into()),
    }
}

fn write_stdout(body: &str) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(body.as_bytes())
        .context("Failed to write to stdout")?;
    if !body.ends_with('\n') {
        handle.write_all(b"\n").context("Failed to write to stdout")?;
    }
    Ok(())
}

fn print_stats(stats: &ExtractionStats) {
    eprintln!(
        "   {} pages  {} chars ({} stripped)  prompt {} chars",
        stats.page_count, stats.text_chars, stats.stripped_chars, stats.prompt_chars
    );
    let tokens = match (stats.prompt_tokens, stats.completion_tokens) {
        (Some(input), Some(output)) => format!("{input} tokens in  /  {output} tokens out"),
        _ => "token usage not reported".to_string(),
    };
    eprintln!(
        "   {}  ·  text {}ms  model {}ms  total {}ms",
        dim(&tokens),
        stats.text_duration_ms,
        stats.llm_duration_ms,
        stats.total_duration_ms
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("cv2json").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn exit_status_follows_error_kind() {
        let doc: anyhow::Error = Cv2JsonError::DocumentUnreadable {
            document: "cv.pdf".into(),
            detail: "file not found".into(),
        }
        .into();
        assert_eq!(exit_status(&doc.context("Extraction failed")), 2);

        let schema: anyhow::Error = Cv2JsonError::SchemaValidation {
            fields: vec!["name".into()],
            detail: "required field is missing".into(),
        }
        .into();
        assert_eq!(exit_status(&schema), 4);

        assert_eq!(exit_status(&anyhow::anyhow!("other")), 1);
    }

    #[test]
    fn text_only_conflicts_with_print_prompt() {
        let res = Cli::try_parse_from(["cv2json", "--text-only", "--print-prompt", "cv.pdf"]);
        assert!(res.is_err());
    }

    #[test]
    fn offline_modes_skip_model_config() {
        let cli = parse(&["--text-only", "cv.pdf"]);
        assert!(!cli.wants_model());
        assert!(parse(&["cv.pdf"]).wants_model());
    }

    #[test]
    fn azure_settings_require_all_three() {
        let mut cli = parse(&["cv.pdf"]);
        cli.azure_endpoint = Some("https://x.openai.azure.com".into());
        cli.azure_api_key = Some("secret".into());
        cli.azure_deployment = None;
        let err = azure_settings(&cli).unwrap_err();
        assert!(err.to_string().contains("not configured"));

        cli.azure_deployment = Some("gpt-4o-mini".into());
        let settings = azure_settings(&cli).unwrap();
        assert_eq!(settings.deployment, "gpt-4o-mini");
        assert_eq!(settings.api_version, cli.azure_api_version);
    }
}
