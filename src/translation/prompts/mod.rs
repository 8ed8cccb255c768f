/*!
 * Prompts for batch translation.
 *
 * This module provides:
 * - The fixed system prompt given to the model for every batch
 * - The user prompt carrying the delimited payload
 */

pub mod templates;

// Re-export main types
pub use templates::{PromptTemplate, TranslationPromptBuilder};
