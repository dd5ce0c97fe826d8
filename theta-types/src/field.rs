//! Field kinds and values.
//!
//! Every persisted entity is a fixed, ordered list of typed fields. A
//! [`FieldKind`] is the declared type of one position in that list and a
//! [`FieldValue`] is the runtime content. Each kind has a stable one-byte
//! type code used by the file format.

use crate::{BlobId, Decimal, Handle};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The declared type of an entity field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Bool,
    Char,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
    Decimal,
    String,
    /// A fixed-layout value with its own codec, identified by blob id.
    Blob(BlobId),
    /// A reference to another entity, stored as its handle.
    Ref,
    /// A homogeneous array.
    Array(Box<FieldKind>),
}

impl FieldKind {
    pub const CODE_BOOL: u8 = 1;
    pub const CODE_CHAR: u8 = 2;
    pub const CODE_I8: u8 = 3;
    pub const CODE_U8: u8 = 4;
    pub const CODE_I16: u8 = 5;
    pub const CODE_U16: u8 = 6;
    pub const CODE_I32: u8 = 7;
    pub const CODE_U32: u8 = 8;
    pub const CODE_I64: u8 = 9;
    pub const CODE_U64: u8 = 10;
    pub const CODE_F32: u8 = 11;
    pub const CODE_F64: u8 = 12;
    pub const CODE_DECIMAL: u8 = 13;
    pub const CODE_STRING: u8 = 14;
    pub const CODE_BLOB: u8 = 15;
    pub const CODE_REF: u8 = 16;
    pub const CODE_ARRAY: u8 = 17;

    /// Shorthand for `Array(Box::new(element))`.
    #[must_use]
    pub fn array_of(element: FieldKind) -> Self {
        Self::Array(Box::new(element))
    }

    /// One-byte type code written ahead of every field.
    #[must_use]
    pub const fn code(&self) -> u8 {
        match self {
            Self::Bool => Self::CODE_BOOL,
            Self::Char => Self::CODE_CHAR,
            Self::I8 => Self::CODE_I8,
            Self::U8 => Self::CODE_U8,
            Self::I16 => Self::CODE_I16,
            Self::U16 => Self::CODE_U16,
            Self::I32 => Self::CODE_I32,
            Self::U32 => Self::CODE_U32,
            Self::I64 => Self::CODE_I64,
            Self::U64 => Self::CODE_U64,
            Self::F32 => Self::CODE_F32,
            Self::F64 => Self::CODE_F64,
            Self::Decimal => Self::CODE_DECIMAL,
            Self::String => Self::CODE_STRING,
            Self::Blob(_) => Self::CODE_BLOB,
            Self::Ref => Self::CODE_REF,
            Self::Array(_) => Self::CODE_ARRAY,
        }
    }

    /// Maps a type code back to a kind that carries no parameters.
    ///
    /// Blob and array codes need their trailing descriptor and return `None`.
    #[must_use]
    pub const fn scalar_from_code(code: u8) -> Option<Self> {
        Some(match code {
            Self::CODE_BOOL => Self::Bool,
            Self::CODE_CHAR => Self::Char,
            Self::CODE_I8 => Self::I8,
            Self::CODE_U8 => Self::U8,
            Self::CODE_I16 => Self::I16,
            Self::CODE_U16 => Self::U16,
            Self::CODE_I32 => Self::I32,
            Self::CODE_U32 => Self::U32,
            Self::CODE_I64 => Self::I64,
            Self::CODE_U64 => Self::U64,
            Self::CODE_F32 => Self::F32,
            Self::CODE_F64 => Self::F64,
            Self::CODE_DECIMAL => Self::Decimal,
            Self::CODE_STRING => Self::String,
            Self::CODE_REF => Self::Ref,
            _ => return None,
        })
    }

    /// Whether values of this kind may hold entity references.
    #[must_use]
    pub fn holds_references(&self) -> bool {
        match self {
            Self::Ref => true,
            Self::Array(element) => element.holds_references(),
            _ => false,
        }
    }

    /// Calls `f` for every blob id mentioned by this kind.
    pub fn visit_blobs(&self, f: &mut impl FnMut(BlobId)) {
        match self {
            Self::Blob(id) => f(*id),
            Self::Array(element) => element.visit_blobs(f),
            _ => {}
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => f.write_str("bool"),
            Self::Char => f.write_str("char"),
            Self::I8 => f.write_str("i8"),
            Self::U8 => f.write_str("u8"),
            Self::I16 => f.write_str("i16"),
            Self::U16 => f.write_str("u16"),
            Self::I32 => f.write_str("i32"),
            Self::U32 => f.write_str("u32"),
            Self::I64 => f.write_str("i64"),
            Self::U64 => f.write_str("u64"),
            Self::F32 => f.write_str("f32"),
            Self::F64 => f.write_str("f64"),
            Self::Decimal => f.write_str("decimal"),
            Self::String => f.write_str("string"),
            Self::Blob(id) => write!(f, "blob#{id}"),
            Self::Ref => f.write_str("ref"),
            Self::Array(element) => write!(f, "array<{element}>"),
        }
    }
}

/// Raw bytes of a value blob, tagged with the blob type that produced them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawBlob {
    pub id: BlobId,
    pub bytes: Vec<u8>,
}

impl RawBlob {
    #[must_use]
    pub fn new(id: BlobId, bytes: Vec<u8>) -> Self {
        Self { id, bytes }
    }
}

/// The runtime content of one entity field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Bool(bool),
    Char(char),
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    Decimal(Decimal),
    String(String),
    Blob(RawBlob),
    Ref(Option<Handle>),
    Array {
        element: FieldKind,
        items: Vec<FieldValue>,
    },
}

impl FieldValue {
    /// The kind this value carries.
    #[must_use]
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Bool(_) => FieldKind::Bool,
            Self::Char(_) => FieldKind::Char,
            Self::I8(_) => FieldKind::I8,
            Self::U8(_) => FieldKind::U8,
            Self::I16(_) => FieldKind::I16,
            Self::U16(_) => FieldKind::U16,
            Self::I32(_) => FieldKind::I32,
            Self::U32(_) => FieldKind::U32,
            Self::I64(_) => FieldKind::I64,
            Self::U64(_) => FieldKind::U64,
            Self::F32(_) => FieldKind::F32,
            Self::F64(_) => FieldKind::F64,
            Self::Decimal(_) => FieldKind::Decimal,
            Self::String(_) => FieldKind::String,
            Self::Blob(blob) => FieldKind::Blob(blob.id),
            Self::Ref(_) => FieldKind::Ref,
            Self::Array { element, .. } => FieldKind::Array(Box::new(element.clone())),
        }
    }

    /// Whether this value is a valid instance of `kind`, including every
    /// array element.
    #[must_use]
    pub fn conforms_to(&self, kind: &FieldKind) -> bool {
        match (self, kind) {
            (Self::Array { element, items }, FieldKind::Array(expected)) => {
                element == expected.as_ref() && items.iter().all(|item| item.conforms_to(expected))
            }
            (Self::Blob(blob), FieldKind::Blob(id)) => blob.id == *id,
            (value, kind) => value.kind() == *kind,
        }
    }

    /// Builds an array value.
    #[must_use]
    pub fn array(element: FieldKind, items: Vec<FieldValue>) -> Self {
        Self::Array { element, items }
    }

    /// Calls `f` for every entity reference held by this value.
    pub fn visit_references(&self, f: &mut impl FnMut(Handle)) {
        match self {
            Self::Ref(Some(handle)) => f(*handle),
            Self::Array { items, .. } => items.iter().for_each(|item| item.visit_references(f)),
            _ => {}
        }
    }
}

/// A Rust type that maps onto one field kind.
///
/// Implemented for the scalar primitives, `String`, [`Decimal`],
/// [`Handle`], `Option<Handle>` and `Vec<T>` of any field type.
pub trait Field: Sized {
    /// The declared kind for this type.
    fn kind() -> FieldKind;

    /// Wraps the value.
    fn into_value(self) -> FieldValue;

    /// Unwraps a value of the matching kind.
    fn from_value(value: FieldValue) -> Option<Self>;
}

macro_rules! scalar_field {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Field for $ty {
                fn kind() -> FieldKind {
                    FieldKind::$variant
                }

                fn into_value(self) -> FieldValue {
                    FieldValue::$variant(self)
                }

                fn from_value(value: FieldValue) -> Option<Self> {
                    match value {
                        FieldValue::$variant(v) => Some(v),
                        _ => None,
                    }
                }
            }

            impl From<$ty> for FieldValue {
                fn from(value: $ty) -> Self {
                    FieldValue::$variant(value)
                }
            }
        )*
    };
}

scalar_field! {
    bool => Bool,
    char => Char,
    i8 => I8,
    u8 => U8,
    i16 => I16,
    u16 => U16,
    i32 => I32,
    u32 => U32,
    i64 => I64,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    Decimal => Decimal,
    String => String,
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl Field for Option<Handle> {
    fn kind() -> FieldKind {
        FieldKind::Ref
    }

    fn into_value(self) -> FieldValue {
        FieldValue::Ref(self)
    }

    fn from_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::Ref(handle) => Some(handle),
            _ => None,
        }
    }
}

impl From<Option<Handle>> for FieldValue {
    fn from(value: Option<Handle>) -> Self {
        FieldValue::Ref(value)
    }
}

/// A non-optional reference; an empty reference does not convert.
impl Field for Handle {
    fn kind() -> FieldKind {
        FieldKind::Ref
    }

    fn into_value(self) -> FieldValue {
        FieldValue::Ref(Some(self))
    }

    fn from_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::Ref(handle) => handle,
            _ => None,
        }
    }
}

impl From<Handle> for FieldValue {
    fn from(value: Handle) -> Self {
        FieldValue::Ref(Some(value))
    }
}

impl<T: Field> Field for Vec<T> {
    fn kind() -> FieldKind {
        FieldKind::Array(Box::new(T::kind()))
    }

    fn into_value(self) -> FieldValue {
        FieldValue::Array {
            element: T::kind(),
            items: self.into_iter().map(Field::into_value).collect(),
        }
    }

    fn from_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::Array { element, items } if element == T::kind() => {
                items.into_iter().map(T::from_value).collect()
            }
            _ => None,
        }
    }
}
