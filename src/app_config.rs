use anyhow::{anyhow, Context, Result};
use log::{warn, LevelFilter};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use url::Url;

/// Application configuration module
/// This module handles the application configuration including loading,
/// environment overrides, validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language code
    pub source_language: String,

    /// Target language code
    pub target_language: String,

    /// Directory scanned for workbooks
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,

    /// Directory receiving translated workbooks
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Completion endpoint settings
    #[serde(default)]
    pub llm: LlmConfig,

    /// Batching and pacing settings
    #[serde(default)]
    pub translation: TranslationCommonConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Settings for the OpenAI-compatible completion endpoint
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LlmConfig {
    /// Base URL of the API, e.g. "https://api.openai.com/v1"
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// API key sent as a bearer token
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Strip `<think>...</think>` blocks from responses
    #[serde(default)]
    pub no_think: bool,

    /// Literal text appended to every user prompt
    #[serde(default)]
    pub prompt_suffix: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: String::new(),
            model: default_model(),
            no_think: false,
            prompt_suffix: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Common translation settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationCommonConfig {
    /// Maximum number of text units sent in one completion call
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Delay in milliseconds after each successful completion call
    #[serde(default = "default_rate_limit_delay_ms")]
    pub rate_limit_delay_ms: u64,
}

impl Default for TranslationCommonConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            rate_limit_delay_ms: default_rate_limit_delay_ms(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Environment variables read by [`Config::apply_env`]
pub const ENV_API_URL: &str = "LLM_API_URL";
pub const ENV_API_KEY: &str = "LLM_API_KEY";
pub const ENV_MODEL_NAME: &str = "LLM_MODEL_NAME";
pub const ENV_NO_THINK: &str = "LLM_MODEL_NO_THINK";
pub const ENV_PROMPT_SUFFIX: &str = "LLM_MODEL_SUFFIX";
pub const ENV_TIMEOUT_SECS: &str = "LLM_TIMEOUT_SECS";

fn default_input_dir() -> PathBuf {
    PathBuf::from("input")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_batch_size() -> usize {
    100
}

fn default_rate_limit_delay_ms() -> u64 {
    2000 // 2 seconds between completion calls
}

/// Parse a boolean flag the way the environment spells it: "1" or "true"
fn parse_env_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true")
}

impl Config {
    /// Load a configuration file, writing a default one if it does not exist yet
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let file = File::open(path)
                .with_context(|| format!("Failed to open config file: {:?}", path))?;
            let reader = BufReader::new(file);
            let config: Config = serde_json::from_reader(reader)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?;
            return Ok(config);
        }

        warn!("Config file not found at {:?}, creating default config.", path);
        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write default config to file: {:?}", path))?;

        Ok(config)
    }

    /// Apply `LLM_*` overrides from the process environment
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Apply `LLM_*` overrides from an arbitrary lookup
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL) {
            self.llm.endpoint = url;
        }
        if let Some(key) = lookup(ENV_API_KEY) {
            self.llm.api_key = key;
        }
        if let Some(model) = lookup(ENV_MODEL_NAME) {
            self.llm.model = model;
        }
        if let Some(flag) = lookup(ENV_NO_THINK) {
            self.llm.no_think = parse_env_flag(&flag);
        }
        if let Some(suffix) = lookup(ENV_PROMPT_SUFFIX) {
            if !suffix.is_empty() {
                self.llm.prompt_suffix = Some(suffix);
            }
        }
        if let Some(timeout) = lookup(ENV_TIMEOUT_SECS) {
            self.llm.timeout_secs = timeout
                .trim()
                .parse()
                .with_context(|| format!("{} must be a number of seconds, got '{}'", ENV_TIMEOUT_SECS, timeout))?;
        }
        Ok(())
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        // Validate languages
        let _source_name = crate::language_utils::get_language_name(&self.source_language)?;
        let _target_name = crate::language_utils::get_language_name(&self.target_language)?;

        if self.translation.batch_size == 0 {
            return Err(anyhow!("Batch size must be at least 1"));
        }

        Url::parse(&self.llm.endpoint)
            .with_context(|| format!("Invalid LLM endpoint URL: {}", self.llm.endpoint))?;

        if self.llm.model.trim().is_empty() {
            return Err(anyhow!("LLM model name is required (set {})", ENV_MODEL_NAME));
        }

        if self.llm.timeout_secs == 0 {
            return Err(anyhow!("LLM timeout must be at least 1 second"));
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: "ja".to_string(),
            target_language: "en".to_string(),
            input_dir: default_input_dir(),
            output_dir: default_output_dir(),
            llm: LlmConfig::default(),
            translation: TranslationCommonConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
