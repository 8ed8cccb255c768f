/*!
 * Batch translation pipeline for workbook text.
 *
 * This module turns the text of a sheet into translated text in place. It
 * is split into several submodules:
 *
 * - `classifier`: Decides which texts are worth translating
 * - `batch`: Text units, their write-back references and batching
 * - `codec`: Delimited payload encoding and response alignment
 * - `prompts`: Prompt templates and builders for translation
 * - `core`: Translation service wrapping the completion call
 * - `reconciler`: Writes translated segments back to the workbook
 */

// Re-export main types for easier usage
pub use self::batch::{Batch, Reference, TextUnit};
pub use self::core::{BatchTranslation, TranslationOptions, TranslationService};
pub use self::reconciler::UnitOutcome;

// Re-export prompt types
pub use self::prompts::{PromptTemplate, TranslationPromptBuilder};

// Submodules
pub mod batch;
pub mod classifier;
pub mod codec;
pub mod core;
pub mod prompts;
pub mod reconciler;
