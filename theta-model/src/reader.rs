use crate::{ModelError, ModelResult, ValueBlob};
use std::vec::IntoIter;
use theta_types::{EntityRecord, Field, FieldKind, FieldValue, Handle};

/// Pulls typed values out of a record's fields in schema order.
///
/// ```ignore
/// fn load(record: EntityRecord) -> ModelResult<Self> {
///     let (handle, mut fields) = FieldReader::open(Self::NAME, record);
///     let name = fields.next()?;
///     let level = fields.next()?;
///     fields.finish()?;
///     Ok(Self { handle, name, level })
/// }
/// ```
#[derive(Debug)]
pub struct FieldReader {
    type_name: &'static str,
    fields: IntoIter<FieldValue>,
    expected_total: usize,
    position: usize,
}

impl FieldReader {
    /// Splits a record into its handle and a reader over its fields.
    #[must_use]
    pub fn open(type_name: &'static str, record: EntityRecord) -> (Handle, Self) {
        let expected_total = record.fields.len();
        let reader = Self {
            type_name,
            fields: record.fields.into_iter(),
            expected_total,
            position: 0,
        };
        (record.handle, reader)
    }

    /// Position of the next field to be read.
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    fn take(&mut self, expected: &FieldKind) -> ModelResult<FieldValue> {
        let value = self.fields.next().ok_or(ModelError::FieldCount {
            type_name: self.type_name,
            expected: self.position + 1,
            found: self.expected_total,
        })?;
        self.position += 1;
        if value.conforms_to(expected) {
            Ok(value)
        } else {
            Err(self.mismatch(expected.clone(), value.kind()))
        }
    }

    fn mismatch(&self, expected: FieldKind, found: FieldKind) -> ModelError {
        ModelError::FieldMismatch {
            type_name: self.type_name,
            position: self.position.saturating_sub(1),
            expected,
            found,
        }
    }

    /// Reads the next field as `T`.
    pub fn next<T: Field>(&mut self) -> ModelResult<T> {
        let expected = T::kind();
        let value = self.take(&expected)?;
        let found = value.kind();
        T::from_value(value).ok_or_else(|| self.mismatch(expected, found))
    }

    /// Reads the next field as an untyped value of the given kind.
    pub fn next_value(&mut self, kind: &FieldKind) -> ModelResult<FieldValue> {
        self.take(kind)
    }

    /// Reads the next field as a value blob.
    pub fn blob<B: ValueBlob>(&mut self) -> ModelResult<B> {
        match self.take(&B::kind())? {
            FieldValue::Blob(raw) => B::from_raw(&raw),
            other => Err(self.mismatch(B::kind(), other.kind())),
        }
    }

    /// Reads the next field as an array of value blobs.
    pub fn blobs<B: ValueBlob>(&mut self) -> ModelResult<Vec<B>> {
        let kind = FieldKind::array_of(B::kind());
        match self.take(&kind)? {
            FieldValue::Array { items, .. } => items
                .iter()
                .map(|item| match item {
                    FieldValue::Blob(raw) => B::from_raw(raw),
                    other => Err(self.mismatch(B::kind(), other.kind())),
                })
                .collect(),
            other => Err(self.mismatch(kind, other.kind())),
        }
    }

    /// Fails if fields remain unread.
    pub fn finish(self) -> ModelResult<()> {
        if self.position == self.expected_total {
            Ok(())
        } else {
            Err(ModelError::FieldCount {
                type_name: self.type_name,
                expected: self.position,
                found: self.expected_total,
            })
        }
    }
}
