//! Runtime support for generated API code.
//!
//! Generated types embed these primitives instead of re-emitting them per
//! spec: the two-variant [`Either`] and the raw-payload [`RawUnion`] carry
//! the union JSON contracts, [`validation`] carries the constraint checks
//! and error types, and [`Transport`] is the seam a generated client talks
//! through.

mod either;
mod raw_union;
mod transport;

pub mod discriminator;
pub mod validation;

pub use either::{Either, EitherTag};
pub use raw_union::{RawUnion, RawUnionError, WrongVariantError};
pub use transport::{Transport, TransportError};
pub use validation::{FieldPath, Validate, ValidationError, ValidationErrors};
