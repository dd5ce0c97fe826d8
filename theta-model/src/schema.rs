use crate::{ModelError, ModelResult, ValueBlob};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use theta_types::{Field, FieldKind, FieldValue};

/// One position in an entity's ordered field list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Optional, informational only. Never persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<Cow<'static, str>>,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub fn new(name: impl Into<Cow<'static, str>>, kind: FieldKind) -> Self {
        Self {
            name: Some(name.into()),
            kind,
        }
    }

    /// A field known only by its position.
    #[must_use]
    pub fn unnamed(kind: FieldKind) -> Self {
        Self { name: None, kind }
    }

    /// Shorthand for a field whose kind follows a Rust type.
    pub fn of<T: Field>(name: impl Into<Cow<'static, str>>) -> Self {
        Self::new(name, T::kind())
    }

    /// Shorthand for a value-blob field.
    pub fn blob<B: ValueBlob>(name: impl Into<Cow<'static, str>>) -> Self {
        Self::new(name, B::kind())
    }

    /// Shorthand for an entity reference field.
    pub fn reference(name: impl Into<Cow<'static, str>>) -> Self {
        Self::new(name, FieldKind::Ref)
    }
}

/// The ordered field list of an entity type.
///
/// Order is part of the persisted format: reordering fields breaks every
/// existing save of the type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    fields: Vec<FieldSpec>,
}

impl Schema {
    #[must_use]
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    #[must_use]
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn kinds(&self) -> impl Iterator<Item = &FieldKind> {
        self.fields.iter().map(|f| &f.kind)
    }

    /// Whether any field can hold entity references.
    #[must_use]
    pub fn has_references(&self) -> bool {
        self.kinds().any(FieldKind::holds_references)
    }

    /// Checks field count and every value's kind against this schema.
    pub fn check(&self, type_name: &'static str, values: &[FieldValue]) -> ModelResult<()> {
        if values.len() != self.fields.len() {
            return Err(ModelError::FieldCount {
                type_name,
                expected: self.fields.len(),
                found: values.len(),
            });
        }
        for (position, (spec, value)) in self.fields.iter().zip(values).enumerate() {
            if !value.conforms_to(&spec.kind) {
                return Err(ModelError::FieldMismatch {
                    type_name,
                    position,
                    expected: spec.kind.clone(),
                    found: value.kind(),
                });
            }
        }
        Ok(())
    }
}

impl FromIterator<FieldSpec> for Schema {
    fn from_iter<I: IntoIterator<Item = FieldSpec>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
