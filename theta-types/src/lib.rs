//! Core type definitions for Theta.
//!
//! This crate defines the plain data types shared by every layer of the
//! persistence engine:
//! - Entity handles, type tags and blob ids
//! - Field kinds and field values (the schema vocabulary)
//! - A fixed-layout high-precision decimal
//! - Entity records, the save/load intermediate form
//!
//! Nothing here knows about locking, catalogs or the file format.

mod decimal;
mod field;
mod ids;
mod record;

pub use decimal::Decimal;
pub use field::{Field, FieldKind, FieldValue, RawBlob};
pub use ids::{BlobId, Handle, TypeTag};
pub use record::EntityRecord;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("decimal out of range: {0}")]
    DecimalOutOfRange(String),

    #[error("invalid decimal: {0}")]
    InvalidDecimal(String),
}
