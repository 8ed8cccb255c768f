/*!
 * Core translation service implementation.
 *
 * This module contains the TranslationService, which sends one batch per
 * completion call and always hands back one string per input text. Any
 * failure along the way degrades to returning the input unchanged.
 */

use log::{debug, error, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::{Duration, Instant};

use crate::app_config::Config;
use crate::errors::{ProviderError, TranslationError};
use crate::language_utils;
use crate::providers::Provider;

use super::codec;
use super::prompts::TranslationPromptBuilder;

// @const: Reasoning blocks emitted by thinking models, with trailing newlines
static THINK_BLOCK_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<think>.*?</think>\n*").unwrap()
});

/// Translation options for customizing the translation process
#[derive(Debug, Clone)]
pub struct TranslationOptions {
    /// Pause after every successful completion call
    pub rate_limit_delay: Duration,

    /// Upper bound for one completion call
    pub timeout: Duration,

    /// Strip `<think>` blocks from responses
    pub no_think: bool,

    /// Literal text appended to the user prompt
    pub prompt_suffix: Option<String>,
}

impl Default for TranslationOptions {
    fn default() -> Self {
        Self {
            rate_limit_delay: Duration::from_millis(2000),
            timeout: Duration::from_secs(120),
            no_think: false,
            prompt_suffix: None,
        }
    }
}

impl TranslationOptions {
    /// Build options from the application configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            rate_limit_delay: Duration::from_millis(config.translation.rate_limit_delay_ms),
            timeout: Duration::from_secs(config.llm.timeout_secs),
            no_think: config.llm.no_think,
            prompt_suffix: config.llm.prompt_suffix.clone(),
        }
    }
}

/// Outcome of one batch call
#[derive(Debug, Clone, PartialEq)]
pub struct BatchTranslation {
    /// One segment per input text
    pub segments: Vec<String>,

    /// The input came back unchanged because the call could not be made or failed
    pub passthrough: bool,

    /// The response had a different segment count and was repaired
    pub repaired: bool,
}

impl BatchTranslation {
    fn passthrough(texts: &[String]) -> Self {
        Self {
            segments: texts.to_vec(),
            passthrough: true,
            repaired: false,
        }
    }
}

/// Main translation service for workbook batches
#[derive(Debug)]
pub struct TranslationService<'a> {
    /// Provider lent by the caller for the duration of a run
    provider: &'a dyn Provider,

    /// Translation options
    pub options: TranslationOptions,
}

impl<'a> TranslationService<'a> {
    /// Create a new translation service over a borrowed provider
    pub fn new(provider: &'a dyn Provider, options: TranslationOptions) -> Self {
        Self { provider, options }
    }

    /// Translate a batch, falling back to the input texts on any failure
    pub async fn translate_batch(&self, texts: &[String], source_code: &str, target_code: &str) -> Vec<String> {
        self.translate_batch_report(texts, source_code, target_code).await.segments
    }

    /// Translate a batch and report whether the fallback was used
    pub async fn translate_batch_report(
        &self,
        texts: &[String],
        source_code: &str,
        target_code: &str,
    ) -> BatchTranslation {
        if texts.is_empty() {
            return BatchTranslation {
                segments: Vec::new(),
                passthrough: false,
                repaired: false,
            };
        }

        match self.try_translate_batch(texts, source_code, target_code).await {
            Ok(translation) => translation,
            Err(e) => {
                error!("❌ Error translating batch: {}", e);
                BatchTranslation::passthrough(texts)
            }
        }
    }

    /// Translate a batch, surfacing every failure
    ///
    /// Segment count mismatches are repaired, not returned as errors.
    pub async fn try_translate_batch(
        &self,
        texts: &[String],
        source_code: &str,
        target_code: &str,
    ) -> Result<BatchTranslation, TranslationError> {
        if texts.is_empty() {
            return Ok(BatchTranslation {
                segments: Vec::new(),
                passthrough: false,
                repaired: false,
            });
        }

        let (source_name, target_name) = language_utils::resolve_direction(source_code, target_code)
            .ok_or_else(|| TranslationError::InvalidLanguagePair {
                source_code: source_code.to_string(),
                target_code: target_code.to_string(),
            })?;

        let payload = codec::encode(texts);
        let (system_prompt, user_prompt) = TranslationPromptBuilder::new(source_name, target_name)
            .with_payload(&payload)
            .with_suffix(self.options.prompt_suffix.as_deref())
            .build();

        let start_time = Instant::now();
        let response = self.complete_with_timeout(&system_prompt, &user_prompt).await?;
        debug!(
            "Batch of {} segments answered in {:?} by {}",
            texts.len(),
            start_time.elapsed(),
            self.provider.describe()
        );

        let response = if self.options.no_think {
            strip_think(&response)
        } else {
            response
        };

        let (segments, mismatch) = codec::reconcile(&response, texts.len(), texts);
        if let Some(mismatch) = &mismatch {
            warn!("⚠️ {}", mismatch);
        }

        if !self.options.rate_limit_delay.is_zero() {
            tokio::time::sleep(self.options.rate_limit_delay).await;
        }

        Ok(BatchTranslation {
            segments,
            passthrough: false,
            repaired: mismatch.is_some(),
        })
    }

    async fn complete_with_timeout(&self, system_prompt: &str, user_prompt: &str) -> Result<String, TranslationError> {
        match tokio::time::timeout(self.options.timeout, self.provider.complete(system_prompt, user_prompt)).await {
            Ok(result) => result.map_err(TranslationError::CompletionCallFailed),
            Err(_) => Err(TranslationError::CompletionTimeout(self.options.timeout.as_secs())),
        }
    }

    /// Check that the provider answers at all
    pub async fn test_connection(&self) -> Result<(), ProviderError> {
        self.provider.test_connection().await
    }
}

/// Remove `<think>...</think>` blocks and the newlines that follow them
pub fn strip_think(response: &str) -> String {
    THINK_BLOCK_REGEX.replace_all(response, "").into_owned()
}
