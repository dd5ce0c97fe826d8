use crate::{FieldValue, Handle, TypeTag};
use serde::{Deserialize, Serialize};

/// The save/load intermediate form of an entity.
///
/// `fields` follow the owning type's schema order. The handle is metadata
/// and never appears among the fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub handle: Handle,
    pub type_tag: TypeTag,
    pub fields: Vec<FieldValue>,
}

impl EntityRecord {
    #[must_use]
    pub fn new(handle: Handle, type_tag: TypeTag, fields: Vec<FieldValue>) -> Self {
        Self {
            handle,
            type_tag,
            fields,
        }
    }

    /// Every entity handle referenced from this record's fields, in field order.
    #[must_use]
    pub fn references(&self) -> Vec<Handle> {
        let mut out = Vec::new();
        for field in &self.fields {
            field.visit_references(&mut |handle| out.push(handle));
        }
        out
    }
}
