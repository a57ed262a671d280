use crate::input::ElementCategory;
use crate::markup::MarkupError;
use thiserror::Error;

/// Errors that abort compilation of a single unit. Every variant names the unit it was
/// raised for.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("Error for {unit}: \"{field}\" has not been entered")]
    MissingRequiredField { unit: String, field: String },
    #[error("Error for {unit}: there is a mismatch between the number of \"{main}\" entries and the corresponding \"{other}\"")]
    CountMismatch {
        unit: String,
        main: String,
        other: String,
    },
    #[error("Error for {unit}: two or more opaque elements are named \"{name}\". All elements require a unique name.")]
    DuplicateName { unit: String, name: String },
    #[error("Error for {unit}: {reference}")]
    UnresolvedReference {
        unit: String,
        reference: UnresolvedReference,
    },
    #[error("Error for {unit}: the {category} \"{name}\" has been entered without corresponding properties")]
    IncompleteElement {
        unit: String,
        category: ElementCategory,
        name: String,
    },
    #[error("Error for {unit}: \"{value}\" is not a valid value for \"{field}\"")]
    InvalidValue {
        unit: String,
        field: String,
        value: String,
    },
    #[error("Error for {unit}: no output data was assembled")]
    AssemblyFailure { unit: String },
    #[error("Error for {unit}: invalid XML structure: {source}")]
    SerializationFailure {
        unit: String,
        #[source]
        source: MarkupError,
    },
}

impl CompileError {
    /// The unit the error was raised for.
    pub fn unit(&self) -> &str {
        match self {
            CompileError::MissingRequiredField { unit, .. }
            | CompileError::CountMismatch { unit, .. }
            | CompileError::DuplicateName { unit, .. }
            | CompileError::UnresolvedReference { unit, .. }
            | CompileError::IncompleteElement { unit, .. }
            | CompileError::InvalidValue { unit, .. }
            | CompileError::AssemblyFailure { unit }
            | CompileError::SerializationFailure { unit, .. } => unit,
        }
    }
}

/// The cross-reference that failed to resolve.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum UnresolvedReference {
    #[error("the parent element \"{parent}\" referred to by the \"{opening}\" opening does not exist")]
    ParentElementMissing { opening: String, parent: String },
    #[error("the parent element \"{parent}\" referred to by the \"{opening}\" opening is of type \"{category}\", not an External or Sheltered wall")]
    ParentNotAWall {
        opening: String,
        parent: String,
        category: ElementCategory,
    },
    #[error("the opening type \"{opening_type}\" referred to by the \"{opening}\" opening has not been entered")]
    OpeningType {
        opening: String,
        opening_type: String,
    },
    #[error("the level reference entered for {owner_kind} \"{owner}\" is not listed under \"Levels\"")]
    Level { owner: String, owner_kind: String },
}
