use crate::errors::{CompileError, UnresolvedReference};
use crate::input::{OpaqueElement, OpeningType, Unit};
use crate::lookups::LevelNaming;

/// Resolves the named cross-references of a unit: openings to their parent walls and
/// opening types, and level numbers to storey tokens.
///
/// Lookups are ordered scans; when a name appears more than once the first entry wins.
pub(crate) struct References<'a> {
    unit: &'a str,
    elements: &'a [OpaqueElement],
    opening_types: Vec<&'a OpeningType>,
    levels: &'a LevelNaming,
}

impl<'a> References<'a> {
    pub(crate) fn new(unit: &'a Unit, levels: &'a LevelNaming) -> Self {
        Self {
            unit: &unit.name,
            elements: &unit.opaque_elements,
            opening_types: unit
                .opening_types
                .iter()
                .filter(|opening_type| opening_type.is_entered())
                .collect(),
            levels,
        }
    }

    /// Opening types in the order they are written to the document.
    pub(crate) fn opening_types(&self) -> &[&'a OpeningType] {
        &self.opening_types
    }

    /// Index of the parent wall among the unit's external and sheltered walls.
    pub(crate) fn wall_index(&self, opening: &str, parent: &str) -> Result<usize, CompileError> {
        if let Some(index) = self
            .elements
            .iter()
            .filter(|element| element.category().is_wall())
            .position(|wall| wall.name == parent)
        {
            return Ok(index);
        }

        let reference = match self.elements.iter().find(|element| element.name == parent) {
            Some(element) => UnresolvedReference::ParentNotAWall {
                opening: opening.to_string(),
                parent: parent.to_string(),
                category: element.category(),
            },
            None => UnresolvedReference::ParentElementMissing {
                opening: opening.to_string(),
                parent: parent.to_string(),
            },
        };
        Err(self.unresolved(reference))
    }

    /// Index of the opening type among the types written to the document.
    pub(crate) fn opening_type_index(
        &self,
        opening: &str,
        opening_type: &str,
    ) -> Result<usize, CompileError> {
        self.opening_types
            .iter()
            .position(|candidate| candidate.name == opening_type)
            .ok_or_else(|| {
                self.unresolved(UnresolvedReference::OpeningType {
                    opening: opening.to_string(),
                    opening_type: opening_type.to_string(),
                })
            })
    }

    pub(crate) fn element_storey(
        &self,
        element: &OpaqueElement,
    ) -> Result<&'a str, CompileError> {
        self.storey_index(element.level, &element.name, element.category())
    }

    pub(crate) fn opening_storey(
        &self,
        opening: &str,
        level: Option<f64>,
    ) -> Result<&'a str, CompileError> {
        self.storey_index(level, opening, "opening")
    }

    fn storey_index(
        &self,
        level: Option<f64>,
        owner: &str,
        owner_kind: impl ToString,
    ) -> Result<&'a str, CompileError> {
        level
            .and_then(|level| self.levels.storey_index(level))
            .ok_or_else(|| {
                self.unresolved(UnresolvedReference::Level {
                    owner: owner.to_string(),
                    owner_kind: owner_kind.to_string(),
                })
            })
    }

    fn unresolved(&self, reference: UnresolvedReference) -> CompileError {
        CompileError::UnresolvedReference {
            unit: self.unit.to_string(),
            reference,
        }
    }
}
