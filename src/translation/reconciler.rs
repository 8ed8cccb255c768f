/*!
 * Write-back of translated segments.
 *
 * Each segment goes to the location of the unit at the same position in
 * its batch. Failures are recorded per unit and never stop the batch.
 */

use log::warn;

use crate::errors::WorkbookError;
use crate::workbook::{self, Workbook};

use super::batch::{Batch, Reference};

/// What happened to one unit of a batch
#[derive(Debug)]
pub enum UnitOutcome {
    /// The translation was written
    Written,
    /// The write was attempted and failed; the original value remains
    WriteFailed(WorkbookError),
    /// No segment existed for this position; the original value remains
    MissingTranslation,
}

impl UnitOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, UnitOutcome::Written)
    }
}

/// Write translated segments back to their locations
pub fn apply<W: Workbook + ?Sized>(workbook: &mut W, batch: &Batch, translated: &[String]) -> Vec<UnitOutcome> {
    let mut outcomes = Vec::with_capacity(batch.len());

    for (position, unit) in batch.units.iter().enumerate() {
        let Some(text) = translated.get(position) else {
            outcomes.push(UnitOutcome::MissingTranslation);
            continue;
        };

        let result = match &unit.location {
            Reference::Cell { sheet, address } => workbook.write_cell(sheet, address, text),
            Reference::Shape { sheet, index } => {
                workbook::write_shape_text(workbook, sheet, *index, text).map(|_| ())
            }
        };

        match result {
            Ok(()) => outcomes.push(UnitOutcome::Written),
            Err(e) => {
                warn!("⚠️ Could not write translation to {}: {}", unit.location, e);
                outcomes.push(UnitOutcome::WriteFailed(e));
            }
        }
    }

    outcomes
}
