//! Typed errors for the generation pipeline.
//!
//! Library components return these enums; binaries convert to
//! `anyhow::Error` at the boundary for richer context messages.

use std::fmt;

/// Errors raised while loading and resolving a specification document.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SpecError {
    /// Malformed YAML/JSON input.
    #[error("malformed specification document: {0}")]
    Parse(String),

    /// An internal `$ref` does not resolve to anything in the document.
    #[error("unresolved reference '{reference}'")]
    UnresolvedRef { reference: String },

    /// A construct the loader cannot materialise, e.g. a `$ref` into
    /// `#/paths/...` or an extension-named (`x-*`) schema.
    #[error("unsupported construct at '{pointer}': {detail}")]
    UnsupportedFeature { pointer: String, detail: String },

    #[error("error while reading from input")]
    Io(#[from] std::io::Error),

    #[error("no OpenAPI version declaration found in input")]
    NoVersionFound,

    #[error("unsupported OpenAPI version '{0}'")]
    UnsupportedVersion(String),
}

impl SpecError {
    pub(crate) fn parse(e: impl fmt::Display) -> Self {
        Self::Parse(e.to_string())
    }

    pub(crate) fn unresolved(reference: impl Into<String>) -> Self {
        Self::UnresolvedRef {
            reference: reference.into(),
        }
    }

    pub(crate) fn unsupported(pointer: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::UnsupportedFeature {
            pointer: pointer.into(),
            detail: detail.into(),
        }
    }
}

/// Errors raised by the [`TypeTracker`](crate::tracker::TypeTracker).
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum TrackerError {
    /// A ref was re-registered under a different name.
    #[error("ref '{reference}' is already bound to '{existing}'")]
    DuplicateRef { reference: String, existing: String },

    /// A definition was attached to a name that was never reserved.
    #[error("name '{0}' has not been reserved")]
    UnknownName(String),
}

/// Errors raised by the emission planner.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    /// Two IR entries collide on their emission name within one role.
    #[error("duplicate emission name '{name}' in role '{role}'")]
    RoleConflict { role: String, name: String },

    /// An IR entry references a type that exists in no bundle and no
    /// externally-declared package.
    #[error("emission references unknown type '{0}'")]
    Emission(String),

    /// Types removed by pruning that a retained entry still points at.
    /// Collection-valued: every offender of one run is reported together.
    #[error("pruned types still referenced: {}", .0.join(", "))]
    StillReferenced(Vec<String>),
}

/// Any error of the generation pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Spec(#[from] SpecError),
    #[error(transparent)]
    Tracker(#[from] TrackerError),
    #[error(transparent)]
    Plan(#[from] PlanError),
}

/// Accumulated errors for one document, reported together.
#[derive(Debug, Default)]
pub struct Errors(Vec<Error>);

impl Errors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: impl Into<Error>) {
        self.0.push(error.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Error> {
        self.0.iter()
    }

    pub fn into_result<T>(self, value: T) -> Result<T, Errors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl From<Error> for Errors {
    fn from(error: Error) -> Self {
        Self(vec![error])
    }
}

impl From<SpecError> for Errors {
    fn from(error: SpecError) -> Self {
        Self(vec![error.into()])
    }
}

impl fmt::Display for Errors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for e in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{e}")?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for Errors {}
