// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, debug, error, info, warn};
use std::io::Write;
use std::path::PathBuf;

use xltrans::app_config::{self, Config};
use xltrans::app_controller::Controller;
use xltrans::file_utils::FileManager;
use xltrans::language_utils;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate shell completions for xltrans
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Check that the configured completion endpoint answers
    Check,
}

/// Check a language code against the supported table
fn parse_language(code: &str) -> Result<String, String> {
    let code = code.trim().to_lowercase();
    if language_utils::is_supported(&code) {
        Ok(code)
    } else {
        Err(format!("unsupported language '{}'. Supported: {}", code, language_utils::language_help()))
    }
}

/// xltrans - batch spreadsheet translation with an LLM
///
/// Translates the text of every workbook in a directory (cells and shapes)
/// and writes translated copies next to each other in an output directory.
#[derive(Parser, Debug)]
#[command(name = "xltrans")]
#[command(version)]
#[command(about = "Translate Excel workbooks with an OpenAI-compatible LLM")]
#[command(subcommand_negates_reqs = true)]
#[command(long_about = "xltrans translates the cell and shape text of every workbook in a directory.

EXAMPLES:
    xltrans --from ja --to en -i input           # Translate ./input into ./output
    xltrans --from ja --to vi -i docs -o out     # Custom output directory
    xltrans --from en --to de -i docs -b 50      # Smaller requests
    xltrans check                                # Test the LLM endpoint
    xltrans completions bash > xltrans.bash      # Generate bash completions

CONFIGURATION:
    Settings come from built-in defaults, an optional JSON file (--config),
    the environment (a .env file is loaded when present) and these flags,
    in that order. Environment variables:
        LLM_API_URL, LLM_API_KEY, LLM_MODEL_NAME, LLM_MODEL_NO_THINK,
        LLM_MODEL_SUFFIX, LLM_TIMEOUT_SECS, HTTP_PROXY, HTTPS_PROXY

    --from, --to and --input-dir are required for a translation run.
    Relative directories are resolved against the directory of the executable.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Source language code (e.g., 'ja', 'en', 'vi')
    #[arg(short, long = "from", required = true, value_parser = parse_language)]
    from: Option<String>,

    /// Target language code (e.g., 'en', 'ja', 'vi')
    #[arg(short, long = "to", required = true, value_parser = parse_language)]
    to: Option<String>,

    /// Directory containing the workbooks to translate
    #[arg(short, long, required = true)]
    input_dir: Option<PathBuf>,

    /// Directory receiving the translated workbooks
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Maximum number of texts per completion call
    #[arg(short, long)]
    batch_size: Option<usize>,

    /// Model name to use for translation
    #[arg(short, long)]
    model: Option<String>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji for log level
    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "🔴",
            Level::Warn => "🟡",
            Level::Info => "🟢",
            Level::Debug => "🔍",
            Level::Trace => "📋",
        }
    }

    // @returns: ANSI color for log level
    fn get_color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {} {}\x1B[0m",
                Self::get_color_for_level(record.level()),
                now,
                Self::get_emoji_for_level(record.level()),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Trace here; the effective level is set with set_max_level below
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Some(Commands::Completions { shell }) = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "xltrans", &mut std::io::stdout());
        return Ok(());
    }

    if let Some(level) = &cli.log_level {
        let level: app_config::LogLevel = level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    load_dotenv();
    let config = build_config(&cli)?;
    if cli.log_level.is_none() {
        log::set_max_level(config.log_level.to_level_filter());
    }
    debug!("Effective configuration: {:?}", RedactedConfig(&config));

    let controller = Controller::with_config(config).context("Configuration validation failed")?;

    if let Some(Commands::Check) = cli.command {
        return match controller.test_connection().await {
            Ok(()) => {
                info!("✅ Completion endpoint is reachable");
                Ok(())
            }
            Err(e) => {
                error!("Completion endpoint check failed: {}", e);
                Err(e.into())
            }
        };
    }

    let cancellation = controller.cancellation_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current batch…");
            cancellation.cancel();
        }
    });

    let summary = controller.run().await?;
    if summary.cancelled {
        warn!("Run cancelled");
    }

    Ok(())
}

/// Load `.env` from the executable's directory, or the working directory and its parents
fn load_dotenv() {
    let beside_exe = FileManager::exe_dir().ok().map(|dir| dir.join(".env"));
    match beside_exe {
        Some(path) if path.is_file() => {
            if let Err(e) = dotenv::from_path(&path) {
                warn!("Failed to load {}: {}", path.display(), e);
            }
        }
        _ => {
            dotenv::dotenv().ok();
        }
    }
}

/// Merge defaults, config file, environment and flags, in increasing precedence
fn build_config(cli: &CommandLineOptions) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_or_create(path)?,
        None => Config::default(),
    };

    config.apply_env().context("Invalid LLM environment settings")?;

    if let Some(from) = &cli.from {
        config.source_language = from.clone();
    }
    if let Some(to) = &cli.to {
        config.target_language = to.clone();
    }
    if let Some(input_dir) = &cli.input_dir {
        config.input_dir = input_dir.clone();
    }
    if let Some(output_dir) = &cli.output_dir {
        config.output_dir = output_dir.clone();
    }
    if let Some(batch_size) = cli.batch_size {
        config.translation.batch_size = batch_size;
    }
    if let Some(model) = &cli.model {
        config.llm.model = model.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone().into();
    }

    config.input_dir = FileManager::resolve_relative_to_exe(&config.input_dir)?;
    config.output_dir = FileManager::resolve_relative_to_exe(&config.output_dir)?;

    Ok(config)
}

/// Debug view of the configuration without the API key
struct RedactedConfig<'a>(&'a Config);

impl std::fmt::Debug for RedactedConfig<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let config = self.0;
        f.debug_struct("Config")
            .field("source_language", &config.source_language)
            .field("target_language", &config.target_language)
            .field("input_dir", &config.input_dir)
            .field("output_dir", &config.output_dir)
            .field("endpoint", &config.llm.endpoint)
            .field("model", &config.llm.model)
            .field("no_think", &config.llm.no_think)
            .field("prompt_suffix", &config.llm.prompt_suffix)
            .field("timeout_secs", &config.llm.timeout_secs)
            .field("batch_size", &config.translation.batch_size)
            .field("rate_limit_delay_ms", &config.translation.rate_limit_delay_ms)
            .finish()
    }
}
