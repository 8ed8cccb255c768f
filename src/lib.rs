/*!
 * # xltrans - Excel workbook translator with an LLM
 *
 * A Rust library for batch translation of spreadsheet text using an
 * OpenAI-compatible chat completions API.
 *
 * ## Features
 *
 * - Translate every `.xlsx` workbook found in an input directory
 * - Cover both cell values and drawing shapes:
 *   - Text boxes and WordArt
 *   - Grouped shapes
 *   - Alternative text of pictures
 * - Batch many texts into one completion call with a segment separator
 * - Keep formulas, numbers and untouched package parts as they were
 * - Fall back to the original text when a batch cannot be translated
 * - Configurable endpoint, model, timeout and pacing through the environment
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `workbook`: Workbook access:
 *   - `workbook::xlsx`: Office Open XML package reader and writer
 *   - `workbook::drawing`: Shape text in drawing parts
 *   - `workbook::xml`: Event-level XML helpers
 * - `translation`: LLM-powered translation:
 *   - `translation::classifier`: Which texts are worth translating
 *   - `translation::batch`: Text units and batch partitioning
 *   - `translation::codec`: Segment encoding and reconciliation
 *   - `translation::core`: Completion calls per batch
 *   - `translation::reconciler`: Writing translations back
 * - `file_utils`: File system operations
 * - `app_controller`: Main application controller
 * - `language_utils`: Supported language table
 * - `providers`: Completion clients:
 *   - `providers::openai`: OpenAI-compatible API client
 *   - `providers::mock`: Scripted provider for tests
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod providers;
pub mod translation;
pub mod workbook;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::Controller;
pub use errors::{AppError, ProviderError, TranslationError, WorkbookError};
pub use language_utils::get_language_name;
pub use translation::TranslationService;
pub use workbook::{Workbook, XlsxWorkbook};
