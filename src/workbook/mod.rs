/*!
 * Workbook access for the translation pipeline.
 *
 * The pipeline only sees the [`Workbook`] trait: sheets with used cells and
 * shapes, each holding optional text. Shapes expose their text through
 * several [`TextSurface`]s; which ones exist depends on the kind of shape,
 * so reads and writes probe the surfaces in a fixed priority order.
 *
 * - `xlsx`: in-memory `.xlsx` package implementation
 * - `drawing`: DrawingML shape text surfaces
 * - `xml`: owned XML event helpers shared by the package rewriters
 */

use log::debug;
use std::fmt;
use std::path::Path;

use crate::errors::WorkbookError;

pub mod drawing;
pub mod xlsx;
pub mod xml;

pub use self::xlsx::XlsxWorkbook;

/// One used cell with its textual value, if it has one
#[derive(Debug, Clone, PartialEq)]
pub struct CellText {
    /// A1-style address, e.g. "B7"
    pub address: String,
    /// Text of the value, `None` for numbers, booleans and errors
    pub text: Option<String>,
}

/// A text-bearing property of a shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextSurface {
    /// Primary text frame of an autoshape or text box
    TextFrame,
    /// Rich text range reachable through a grouped shape
    RichTextRange,
    /// Alternative (accessibility) text
    AlternativeText,
    /// Decorative text effect (WordArt)
    TextEffect,
    /// Text of an embedded object
    EmbeddedObject,
}

impl TextSurface {
    /// Probe order for both reads and writes
    pub const PRIORITY: [TextSurface; 5] = [
        TextSurface::TextFrame,
        TextSurface::RichTextRange,
        TextSurface::AlternativeText,
        TextSurface::TextEffect,
        TextSurface::EmbeddedObject,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TextSurface::TextFrame => "text frame",
            TextSurface::RichTextRange => "rich text range",
            TextSurface::AlternativeText => "alternative text",
            TextSurface::TextEffect => "text effect",
            TextSurface::EmbeddedObject => "embedded object",
        }
    }
}

impl fmt::Display for TextSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// An opened spreadsheet document
pub trait Workbook {
    /// Sheet names in workbook order
    fn sheet_names(&self) -> Vec<String>;

    /// Cells holding a stored value, in row-major order
    fn used_cells(&self, sheet: &str) -> Result<Vec<CellText>, WorkbookError>;

    /// Number of shapes on the sheet
    fn shape_count(&self, sheet: &str) -> Result<usize, WorkbookError>;

    /// Read one text surface of a shape; `Ok(None)` when the surface holds no text
    fn read_shape_surface(
        &self,
        sheet: &str,
        index: usize,
        surface: TextSurface,
    ) -> Result<Option<String>, WorkbookError>;

    /// Replace the text of one surface of a shape
    fn write_shape_surface(
        &mut self,
        sheet: &str,
        index: usize,
        surface: TextSurface,
        text: &str,
    ) -> Result<(), WorkbookError>;

    /// Replace the value of a cell with text
    fn write_cell(&mut self, sheet: &str, address: &str, text: &str) -> Result<(), WorkbookError>;

    /// Write the document to a new file
    fn save(&self, path: &Path) -> Result<(), WorkbookError>;
}

/// Read the text of a shape from the first surface that has any
///
/// Failing surfaces are skipped; an error is returned only when the shape
/// itself cannot be reached.
pub fn read_shape_text<W: Workbook + ?Sized>(
    workbook: &W,
    sheet: &str,
    index: usize,
) -> Result<Option<(TextSurface, String)>, WorkbookError> {
    let mut last_error = None;
    for surface in TextSurface::PRIORITY {
        match workbook.read_shape_surface(sheet, index, surface) {
            Ok(Some(text)) if !text.trim().is_empty() => return Ok(Some((surface, text))),
            Ok(_) => {}
            Err(e @ (WorkbookError::SheetNotFound(_) | WorkbookError::ShapeNotFound { .. })) => return Err(e),
            Err(e) => {
                debug!("Shape {} on sheet '{}': {} not readable: {}", index, sheet, surface, e);
                last_error = Some(e);
            }
        }
    }

    match last_error {
        Some(WorkbookError::UnsupportedSurface { .. }) | None => Ok(None),
        Some(e) => Err(WorkbookError::ShapeTextReadFailed {
            sheet: sheet.to_string(),
            index,
            reason: e.to_string(),
        }),
    }
}

/// Write the text of a shape through the first surface that accepts it
pub fn write_shape_text<W: Workbook + ?Sized>(
    workbook: &mut W,
    sheet: &str,
    index: usize,
    text: &str,
) -> Result<TextSurface, WorkbookError> {
    for surface in TextSurface::PRIORITY {
        match workbook.write_shape_surface(sheet, index, surface, text) {
            Ok(()) => return Ok(surface),
            Err(e @ (WorkbookError::SheetNotFound(_) | WorkbookError::ShapeNotFound { .. })) => return Err(e),
            Err(e) => debug!("Shape {} on sheet '{}': {} not writable: {}", index, sheet, surface, e),
        }
    }

    Err(WorkbookError::ShapeTextWriteFailed {
        sheet: sheet.to_string(),
        index,
    })
}

/// Split an A1 address into zero-based (column, row)
pub fn parse_cell_address(address: &str) -> Result<(u32, u32), WorkbookError> {
    let invalid = || WorkbookError::InvalidCellAddress(address.to_string());
    let cleaned = address.replace('$', "");
    let split = cleaned
        .find(|c: char| c.is_ascii_digit())
        .ok_or_else(invalid)?;
    let (letters, digits) = cleaned.split_at(split);
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(invalid());
    }

    let mut column: u32 = 0;
    for c in letters.chars() {
        let value = c.to_ascii_uppercase() as u32 - 'A' as u32 + 1;
        column = column.checked_mul(26).and_then(|v| v.checked_add(value)).ok_or_else(invalid)?;
    }
    let row: u32 = digits.parse().map_err(|_| invalid())?;
    if row == 0 {
        return Err(invalid());
    }

    Ok((column - 1, row - 1))
}
