/*!
 * Text unit collection and batching.
 *
 * A sheet is scanned into [`TextUnit`]s, each remembering where its
 * translation goes, and the units are cut into fixed-size [`Batch`]es that
 * keep scan order so results map back by position.
 */

use log::warn;
use std::fmt;

use crate::errors::TranslationError;
use crate::workbook::{self, Workbook};

use super::classifier;

/// Where a translated text is written back
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    /// A worksheet cell
    Cell { sheet: String, address: String },
    /// A drawing shape, by position on its sheet
    Shape { sheet: String, index: usize },
}

impl Reference {
    /// Name of the sheet the reference points into
    pub fn sheet(&self) -> &str {
        match self {
            Reference::Cell { sheet, .. } => sheet,
            Reference::Shape { sheet, .. } => sheet,
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reference::Cell { sheet, address } => write!(f, "{}!{}", sheet, address),
            Reference::Shape { sheet, index } => write!(f, "{}!shape#{}", sheet, index),
        }
    }
}

/// A normalized text and its write-back location
#[derive(Debug, Clone, PartialEq)]
pub struct TextUnit {
    pub text: String,
    pub location: Reference,
}

impl TextUnit {
    pub fn new(text: impl Into<String>, location: Reference) -> Self {
        Self {
            text: text.into(),
            location,
        }
    }
}

/// Ordered group of units translated in one call
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Batch {
    pub units: Vec<TextUnit>,
}

impl Batch {
    /// Texts of the units, in order
    pub fn texts(&self) -> Vec<String> {
        self.units.iter().map(|unit| unit.text.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

/// Split units into contiguous batches of at most `batch_size`
pub fn partition(units: Vec<TextUnit>, batch_size: usize) -> Result<Vec<Batch>, TranslationError> {
    if batch_size == 0 {
        return Err(TranslationError::InvalidBatchSize);
    }

    let mut batches = Vec::with_capacity(units.len().div_ceil(batch_size));
    let mut current = Vec::with_capacity(batch_size.min(units.len()));
    for unit in units {
        current.push(unit);
        if current.len() == batch_size {
            batches.push(Batch {
                units: std::mem::take(&mut current),
            });
        }
    }
    if !current.is_empty() {
        batches.push(Batch { units: current });
    }

    Ok(batches)
}

/// Scan a sheet for translatable cells, then shapes
///
/// Read failures are logged and skipped; whatever could be read is returned.
pub fn collect_sheet_units<W: Workbook + ?Sized>(workbook: &W, sheet: &str) -> Vec<TextUnit> {
    let mut units = Vec::new();

    match workbook.used_cells(sheet) {
        Ok(cells) => {
            for cell in cells {
                let Some(text) = cell.text else { continue };
                if classifier::is_translatable(&text) {
                    units.push(TextUnit::new(
                        classifier::normalize(&text),
                        Reference::Cell {
                            sheet: sheet.to_string(),
                            address: cell.address,
                        },
                    ));
                }
            }
        }
        Err(e) => warn!("Could not read cells of sheet '{}': {}", sheet, e),
    }

    let shape_count = match workbook.shape_count(sheet) {
        Ok(count) => count,
        Err(e) => {
            warn!("Could not list shapes of sheet '{}': {}", sheet, e);
            0
        }
    };

    for index in 0..shape_count {
        match workbook::read_shape_text(workbook, sheet, index) {
            Ok(Some((_, text))) if classifier::is_translatable(&text) => {
                units.push(TextUnit::new(
                    classifier::normalize(&text),
                    Reference::Shape {
                        sheet: sheet.to_string(),
                        index,
                    },
                ));
            }
            Ok(_) => {}
            Err(e) => warn!("Skipping shape {} on sheet '{}': {}", index, sheet, e),
        }
    }

    units
}
