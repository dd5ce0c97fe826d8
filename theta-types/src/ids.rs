//! Identifier types used throughout the Theta core.
//!
//! Handles are small reusable integers issued by the registry. Type tags
//! and blob ids are stable integers persisted instead of type names.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one live entity.
///
/// Handles are dense: the registry issues them from zero upwards and
/// recycles freed ones. `u32::MAX` is never issued; on disk it stands for
/// an empty reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Handle(u32);

impl Handle {
    /// Raw value reserved for "no entity".
    pub const NULL_RAW: u32 = u32::MAX;

    /// Wraps a raw handle value.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw handle value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Slot index of this handle in a saved file.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Encodes an optional handle as its on-disk value.
    #[must_use]
    pub const fn to_raw(handle: Option<Handle>) -> u32 {
        match handle {
            Some(h) => h.0,
            None => Self::NULL_RAW,
        }
    }

    /// Decodes an on-disk value into an optional handle.
    #[must_use]
    pub const fn from_raw(raw: u32) -> Option<Handle> {
        if raw == Self::NULL_RAW {
            None
        } else {
            Some(Self(raw))
        }
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<Handle> for u32 {
    fn from(handle: Handle) -> Self {
        handle.0
    }
}

/// Stable identifier of a concrete entity type.
///
/// Changing a type's tag after saves exist makes those saves unreadable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeTag(u16);

impl TypeTag {
    /// Tag reserved for freed slots in the file format.
    pub const FREED_SLOT: TypeTag = TypeTag(u16::MAX);

    #[must_use]
    pub const fn new(raw: u16) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u16 {
        self.0
    }

    /// Whether this tag is reserved by the file format.
    #[must_use]
    pub const fn is_reserved(self) -> bool {
        self.0 == Self::FREED_SLOT.0
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable identifier of a fixed-layout value blob type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobId(u16);

impl BlobId {
    #[must_use]
    pub const fn new(raw: u16) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u16 {
        self.0
    }
}

impl fmt::Display for BlobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
