//! Types used throughout `cljb`.
//!
//! The goal of this crate is to be very lightweight, so take care with adding dependencies.

mod coordinate;
mod kind;
mod name;

pub use coordinate::{Coordinate, ModuleId};
pub use kind::SourceKind;
pub use name::{lower_camel_case, SourceSetName};

/// Errors from parsing the small value types in this crate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    #[error("source set name must not be empty")]
    EmptySourceSet,
    #[error("invalid character {found:?} in source set name '{name}'")]
    InvalidSourceSet { name: String, found: char },
    #[error("expected 'group:name' or 'group:name:version', got '{0}'")]
    InvalidCoordinate(String),
}
