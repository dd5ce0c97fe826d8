//! Error types for the entity model.

use theta_types::{BlobId, FieldKind, Handle, TypeTag};
use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Schema-level failures: catalog construction, unknown types, and
/// field values that do not match a declared schema.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Two concrete types claim the same tag.
    #[error("duplicate type tag {tag}: {first} and {second}")]
    DuplicateTypeTag {
        tag: TypeTag,
        first: &'static str,
        second: &'static str,
    },

    /// A type tried to register under the freed-slot tag.
    #[error("type tag {tag} is reserved and cannot be used by {name}")]
    ReservedTypeTag { tag: TypeTag, name: &'static str },

    /// Two blob types claim the same id.
    #[error("duplicate blob id {id}: {first} and {second}")]
    DuplicateBlobId {
        id: BlobId,
        first: &'static str,
        second: &'static str,
    },

    /// A schema declares more fields than an entity header can count.
    #[error("{type_name} declares {count} fields (max {max})")]
    TooManyFields {
        type_name: &'static str,
        count: usize,
        max: usize,
    },

    /// No catalog entry for a type tag.
    #[error("no catalog entry for type tag {0}")]
    UnknownTypeTag(TypeTag),

    /// No codec registered for a blob id.
    #[error("no codec registered for blob id {0}")]
    UnknownBlob(BlobId),

    /// A field type code with no encode/decode path.
    #[error("no codec for field type code {0}")]
    UnknownFieldCode(u8),

    /// A field value does not have its declared kind.
    #[error("{type_name} field {position}: expected {expected}, found {found}")]
    FieldMismatch {
        type_name: &'static str,
        position: usize,
        expected: FieldKind,
        found: FieldKind,
    },

    /// The number of field values differs from the schema.
    #[error("{type_name}: expected {expected} fields, found {found}")]
    FieldCount {
        type_name: &'static str,
        expected: usize,
        found: usize,
    },

    /// Blob bytes have the wrong length for their registered layout.
    #[error("blob {name}: expected {expected} bytes, found {found}")]
    BlobSize {
        name: &'static str,
        expected: usize,
        found: usize,
    },

    /// A constructor produced an entity under a different handle than its record.
    #[error("{type_name}: record handle {expected} but entity reports {found}")]
    HandleMismatch {
        type_name: &'static str,
        expected: Handle,
        found: Handle,
    },

    /// A value decoded with the right kind but is not acceptable to its type.
    #[error("invalid field value: {0}")]
    InvalidValue(String),
}
