pub mod core;
pub mod errors;
pub mod input;
pub mod lookups;
pub mod markup;
pub mod output;
pub mod read_unit_sheet;
pub mod sheet;

#[cfg(test)]
mod tests;

use crate::core::assessment::build_document;
use crate::errors::CompileError;
use crate::input::ingest_unit;
use crate::lookups::Lookups;
use crate::markup::{normalize, to_markup};
use crate::sheet::Sheet;
use rayon::prelude::*;
use tracing::{debug, instrument};

/// The schema-ready markup produced for one unit sheet.
#[derive(Clone, Debug, PartialEq)]
pub struct CompiledUnit {
    /// Name of the sheet the unit was read from.
    pub sheet_name: String,
    /// The unit's property name, used as the assessment reference.
    pub reference: String,
    pub markup: String,
}

/// Compiles one unit sheet into `AssessmentFull` markup.
///
/// The sheet is read and validated, cross-references are resolved while the document is
/// assembled, and the serialized document is normalized into its final form. Any error
/// aborts the unit; no partial markup is returned.
#[instrument(skip_all, fields(sheet = sheet.name()))]
pub fn compile_sheet(sheet: &Sheet, lookups: &Lookups) -> Result<CompiledUnit, CompileError> {
    let unit = ingest_unit(sheet, &lookups.thermal_bridges)?;
    debug!(unit = %unit.name, "read unit");

    let document = build_document(&unit, lookups)?;
    if document.is_empty() {
        return Err(CompileError::AssemblyFailure { unit: unit.name });
    }

    let serialization_failure = |source| CompileError::SerializationFailure {
        unit: unit.name.clone(),
        source,
    };
    let markup = to_markup(&document)
        .and_then(|markup| normalize(&markup))
        .map_err(serialization_failure)?;

    Ok(CompiledUnit {
        sheet_name: sheet.name().to_string(),
        reference: unit.name,
        markup,
    })
}

/// Compiles several unit sheets in parallel. Results are returned in sheet order, and a
/// failing unit never affects the others.
pub fn compile_sheets(
    sheets: &[Sheet],
    lookups: &Lookups,
) -> Vec<Result<CompiledUnit, CompileError>> {
    sheets
        .par_iter()
        .map(|sheet| compile_sheet(sheet, lookups))
        .collect()
}
