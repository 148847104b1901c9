//! Generate-interface-mocks command implementation.
//!
//! Sends an interface file to the chat-completions API and streams the reply
//! through the block parser. Each `filepath:` block becomes a file under
//! `--output-folder`, or is echoed to stdout when no folder is given.

use anyhow::{Context, Result};
use clap::Args;
use llm_tools_core::cli::{ExitCode, OutputFormat};
use llm_tools_core::{Config, ConfigPaths, Error};
use llm_tools_files::{DEFAULT_LANGUAGE, FileSink, FolderSink, WriterSink};
use llm_tools_openai::{
    ChatCompletionRequest, DEFAULT_BASE_URL, DEFAULT_MODEL, OpenAiClient,
    mock_generation_messages,
};
use llm_tools_stream::{ParserOptions, Pipeline, RunSummary};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Flags for `generate-interface-mocks`.
///
/// Required values are optional at parse time so that every missing value
/// is reported in one error.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct GenerateArgs {
    /// Package name for the generated mocks
    #[arg(long)]
    pub package: Option<String>,

    /// Source file containing the interface to mock
    #[arg(long = "interface-file")]
    pub interface_file: Option<PathBuf>,

    /// Folder to write the generated files to (stdout if not set)
    #[arg(long = "output-folder")]
    pub output_folder: Option<PathBuf>,

    /// Model used for generation
    #[arg(long, default_value = DEFAULT_MODEL)]
    pub model: String,

    /// OpenAI API key (falls back to the config file)
    #[arg(long = "openai-api-key", env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// Language tag expected after the opening code fence
    #[arg(long, default_value = DEFAULT_LANGUAGE)]
    pub language: String,

    /// Fail when the reply ends inside an unclosed code block
    #[arg(long)]
    pub strict: bool,

    /// API origin, for proxies and local test servers
    #[arg(
        long = "openai-base-url",
        env = "OPENAI_BASE_URL",
        default_value = DEFAULT_BASE_URL,
        hide = true
    )]
    pub openai_base_url: String,
}

/// Validated generation parameters.
#[derive(Clone, PartialEq, Eq)]
pub struct GenerateConfig {
    /// Package name passed to the model
    pub package: String,
    /// Interface source file
    pub interface_file: PathBuf,
    /// Output folder, or `None` for stdout
    pub output_folder: Option<PathBuf>,
    /// Model name
    pub model: String,
    /// API key
    pub api_key: String,
    /// Fence language tag
    pub language: String,
    /// Strict end-of-stream checking
    pub strict: bool,
    /// API origin
    pub base_url: String,
}

impl std::fmt::Debug for GenerateConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerateConfig")
            .field("package", &self.package)
            .field("interface_file", &self.interface_file)
            .field("output_folder", &self.output_folder)
            .field("model", &self.model)
            .field("api_key", &"****")
            .field("language", &self.language)
            .field("strict", &self.strict)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl GenerateArgs {
    /// Resolves the API key and checks that every required value is present.
    ///
    /// The key comes from the flag or `OPENAI_API_KEY`, then from the config
    /// file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] listing every missing value, or an
    /// error if the config file cannot be loaded.
    pub fn validate(self, paths: &ConfigPaths) -> Result<GenerateConfig> {
        let api_key = match non_empty(self.openai_api_key) {
            Some(key) => Some(key),
            None => {
                let config = Config::load(paths).context("failed to load config")?;
                non_empty(config.openai_api_key)
            }
        };

        let package = non_empty(self.package);
        let interface_file = self
            .interface_file
            .filter(|p| !p.as_os_str().is_empty());
        let model = self.model.trim().to_string();

        let mut problems = Vec::new();
        if package.is_none() {
            problems.push("package name is required");
        }
        if interface_file.is_none() {
            problems.push("interface file is required");
        }
        if model.is_empty() {
            problems.push("model is required");
        }
        if api_key.is_none() {
            problems.push("openai api key is required");
        }

        match (package, interface_file, api_key) {
            (Some(package), Some(interface_file), Some(api_key)) if problems.is_empty() => {
                Ok(GenerateConfig {
                    package,
                    interface_file,
                    output_folder: self.output_folder,
                    model,
                    api_key,
                    language: self.language,
                    strict: self.strict,
                    base_url: self.openai_base_url,
                })
            }
            _ => Err(Error::ConfigError {
                message: problems.join("; "),
            }
            .into()),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Summary printed after files were written to a folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerateResult {
    /// Folder the files were written to
    pub output_folder: String,
    /// Files written
    pub files: usize,
    /// Reply lines read
    pub lines: usize,
    /// Prose lines skipped
    pub discarded: usize,
}

/// Runs the generate-interface-mocks command.
///
/// # Errors
///
/// Returns an error if validation fails, the interface file cannot be read,
/// the request fails, or the reply cannot be parsed or written.
pub async fn run(
    args: GenerateArgs,
    paths: &ConfigPaths,
    output_format: OutputFormat,
) -> Result<ExitCode> {
    let config = args.validate(paths)?;
    debug!(?config, "generate parameters");

    let summary = generate(&config).await?;

    if let Some(folder) = &config.output_folder {
        let result = GenerateResult {
            output_folder: folder.display().to_string(),
            files: summary.parse.dispatched,
            lines: summary.parse.lines,
            discarded: summary.parse.discarded,
        };
        let formatted = crate::formatters::format_output(&result, output_format)
            .context("failed to format generate result")?;
        println!("{formatted}");
    }

    Ok(ExitCode::SUCCESS)
}

/// Requests the mocks and streams them into the configured sink.
///
/// # Errors
///
/// Each failure is wrapped with the phase it happened in: reading the
/// interface file, loading the prompt, generating the completion, or
/// streaming the result.
pub async fn generate(config: &GenerateConfig) -> Result<RunSummary> {
    let interface_source = tokio::fs::read_to_string(&config.interface_file)
        .await
        .with_context(|| format!("reading file {}", config.interface_file.display()))?;

    let messages = mock_generation_messages(&config.package, &interface_source, &config.language)
        .context("loading prompt")?;
    let request = ChatCompletionRequest::new(config.model.clone(), messages);

    let client = OpenAiClient::new(config.api_key.clone())
        .context("generating completion")?
        .with_base_url(config.base_url.clone());

    info!(
        package = %config.package,
        model = %config.model,
        interface_file = %config.interface_file.display(),
        "generating interface mocks"
    );
    let deltas = client
        .stream_chat(&request)
        .await
        .context("generating completion")?;

    let sink = output_sink(config)?;
    let options = ParserOptions::default()
        .with_language(config.language.clone())
        .strict(config.strict);

    let summary = Pipeline::new(options)
        .run(deltas, sink.as_ref())
        .await
        .context("streaming result")?;

    info!(
        files = summary.parse.dispatched,
        lines = summary.parse.lines,
        discarded = summary.parse.discarded,
        deltas = summary.producer.deltas,
        "interface mocks generated"
    );
    Ok(summary)
}

fn output_sink(config: &GenerateConfig) -> Result<Box<dyn FileSink>> {
    match &config.output_folder {
        Some(folder) => {
            let sink = FolderSink::new(folder)
                .with_context(|| format!("invalid output folder {}", folder.display()))?;
            debug!(root = %sink.root().display(), "writing files to folder");
            Ok(Box::new(sink))
        }
        None => {
            warn!("output-folder not set, writing to stdout");
            Ok(Box::new(WriterSink::stdout(config.language.clone())))
        }
    }
}
