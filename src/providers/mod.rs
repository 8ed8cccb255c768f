/*!
 * Provider implementations for completion services.
 *
 * This module contains client implementations for LLM providers:
 * - OpenAI: any OpenAI-compatible chat completions API
 * - Mock: scripted provider used by the test suite
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// Common trait for all LLM providers
///
/// This trait defines the interface that all provider implementations must follow,
/// allowing them to be used interchangeably in the translation service.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Complete a prompt pair using this provider
    ///
    /// # Arguments
    /// * `system_prompt` - Instructions given to the model as the system message
    /// * `user_prompt` - The user message carrying the payload
    ///
    /// # Returns
    /// * `Result<String, ProviderError>` - The text of the completion or an error
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, ProviderError>;

    /// Test the connection to the provider
    ///
    /// # Returns
    /// * `Result<(), ProviderError>` - Ok if the connection is successful, or an error
    async fn test_connection(&self) -> Result<(), ProviderError>;

    /// Short human-readable description, e.g. model and endpoint
    fn describe(&self) -> String;
}

pub mod mock;
pub mod openai;
