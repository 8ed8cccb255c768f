/*!
 * Error types for the xltrans application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

/// Errors raised by the translation pipeline.
///
/// Most of these are recovered where they happen: the batch falls back to
/// the original texts and the run continues.
#[derive(Error, Debug)]
pub enum TranslationError {
    /// One of the language codes is not in the language table
    #[error("Invalid language combination: from {source_code} to {target_code}")]
    InvalidLanguagePair {
        source_code: String,
        target_code: String,
    },

    /// The model returned a different number of segments than requested
    #[error("Number of translated parts ({received}) does not match number of original texts ({expected})")]
    SegmentCountMismatch { expected: usize, received: usize },

    /// The completion call failed
    #[error("Completion call failed: {0}")]
    CompletionCallFailed(#[from] ProviderError),

    /// The completion call did not answer in time
    #[error("Completion call timed out after {0} seconds")]
    CompletionTimeout(u64),

    /// Batches must hold at least one unit
    #[error("Batch size must be at least 1")]
    InvalidBatchSize,
}

/// Errors raised by the workbook layer
#[derive(Error, Debug)]
pub enum WorkbookError {
    /// The workbook could not be opened or parsed
    #[error("Failed to open workbook {path:?}: {reason}")]
    WorkbookOpenFailed { path: PathBuf, reason: String },

    /// The workbook could not be written
    #[error("Failed to save workbook {path:?}: {reason}")]
    WorkbookSaveFailed { path: PathBuf, reason: String },

    /// No sheet with this name exists
    #[error("Sheet '{0}' not found")]
    SheetNotFound(String),

    /// No shape at this index exists on the sheet
    #[error("Shape {index} not found on sheet '{sheet}'")]
    ShapeNotFound { sheet: String, index: usize },

    /// The shape does not expose this text surface
    #[error("Shape {index} on sheet '{sheet}' has no {surface} surface")]
    UnsupportedSurface {
        sheet: String,
        index: usize,
        surface: &'static str,
    },

    /// None of the text surfaces could be read
    #[error("Could not read text of shape {index} on sheet '{sheet}': {reason}")]
    ShapeTextReadFailed {
        sheet: String,
        index: usize,
        reason: String,
    },

    /// None of the text surfaces accepted the write
    #[error("Could not update text for shape {index} on sheet '{sheet}' after trying all methods")]
    ShapeTextWriteFailed { sheet: String, index: usize },

    /// The cell address is not a valid A1 reference
    #[error("Invalid cell address: {0}")]
    InvalidCellAddress(String),

    /// Malformed XML inside the package
    #[error("XML error in {part}: {reason}")]
    Xml { part: String, reason: String },

    /// Malformed zip container
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<quick_xml::Error> for WorkbookError {
    fn from(error: quick_xml::Error) -> Self {
        Self::Xml {
            part: "<stream>".to_string(),
            reason: error.to_string(),
        }
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// The input directory is missing
    #[error("Directory does not exist: {0:?}")]
    DirectoryNotFound(PathBuf),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from the workbook layer
    #[error("Workbook error: {0}")]
    Workbook(#[from] WorkbookError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// The run was cancelled by the operator
    #[error("Run cancelled")]
    Cancelled,

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
