//! Fixed-layout value blobs.
//!
//! A value blob is a small plain value (a vector, a colour, a packed id)
//! stored inline in an entity field. Each blob type declares a stable id,
//! a fixed byte size, and explicit little-endian read/write routines.

use crate::{ModelError, ModelResult};
use theta_types::{BlobId, FieldKind, FieldValue, RawBlob};

/// A fixed-layout value with its own byte codec.
pub trait ValueBlob: Sized {
    /// Stable id persisted in the file format.
    const BLOB_ID: BlobId;
    /// Human-readable name used in errors and catalog listings.
    const NAME: &'static str;
    /// Exact encoded size in bytes.
    const SIZE: usize;

    /// Writes exactly [`Self::SIZE`] bytes.
    fn write(&self, out: &mut BlobWriter);

    /// Reads the value back from exactly [`Self::SIZE`] bytes.
    fn read(input: &mut BlobReader<'_>) -> ModelResult<Self>;

    /// The field kind for this blob type.
    fn kind() -> FieldKind {
        FieldKind::Blob(Self::BLOB_ID)
    }

    fn to_raw(&self) -> RawBlob {
        let mut out = BlobWriter::with_capacity(Self::SIZE);
        self.write(&mut out);
        RawBlob::new(Self::BLOB_ID, out.into_bytes())
    }

    fn to_value(&self) -> FieldValue {
        FieldValue::Blob(self.to_raw())
    }

    fn from_raw(raw: &RawBlob) -> ModelResult<Self> {
        if raw.id != Self::BLOB_ID {
            return Err(ModelError::InvalidValue(format!(
                "blob id {} is not {} ({})",
                raw.id,
                Self::NAME,
                Self::BLOB_ID
            )));
        }
        if raw.bytes.len() != Self::SIZE {
            return Err(ModelError::BlobSize {
                name: Self::NAME,
                expected: Self::SIZE,
                found: raw.bytes.len(),
            });
        }
        let mut input = BlobReader::new(Self::NAME, &raw.bytes);
        let value = Self::read(&mut input)?;
        input.finish()?;
        Ok(value)
    }
}

/// Little-endian byte sink for [`ValueBlob::write`].
#[derive(Debug, Default)]
pub struct BlobWriter {
    bytes: Vec<u8>,
}

macro_rules! put_le {
    ($($name:ident: $ty:ty),* $(,)?) => {
        $(
            pub fn $name(&mut self, value: $ty) {
                self.bytes.extend_from_slice(&value.to_le_bytes());
            }
        )*
    };
}

impl BlobWriter {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
        }
    }

    put_le! {
        put_u8: u8,
        put_i8: i8,
        put_u16: u16,
        put_i16: i16,
        put_u32: u32,
        put_i32: i32,
        put_u64: u64,
        put_i64: i64,
        put_f32: f32,
        put_f64: f64,
    }

    pub fn put_bool(&mut self, value: bool) {
        self.bytes.push(u8::from(value));
    }

    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Little-endian byte source for [`ValueBlob::read`].
#[derive(Debug)]
pub struct BlobReader<'a> {
    name: &'static str,
    bytes: &'a [u8],
    pos: usize,
}

macro_rules! get_le {
    ($($name:ident: $ty:ty),* $(,)?) => {
        $(
            pub fn $name(&mut self) -> ModelResult<$ty> {
                let raw = self.take::<{ std::mem::size_of::<$ty>() }>()?;
                Ok(<$ty>::from_le_bytes(raw))
            }
        )*
    };
}

impl<'a> BlobReader<'a> {
    #[must_use]
    pub fn new(name: &'static str, bytes: &'a [u8]) -> Self {
        Self {
            name,
            bytes,
            pos: 0,
        }
    }

    fn take<const N: usize>(&mut self) -> ModelResult<[u8; N]> {
        let end = self.pos + N;
        let slice = self.bytes.get(self.pos..end).ok_or(ModelError::BlobSize {
            name: self.name,
            expected: end,
            found: self.bytes.len(),
        })?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        self.pos = end;
        Ok(out)
    }

    get_le! {
        get_u8: u8,
        get_i8: i8,
        get_u16: u16,
        get_i16: i16,
        get_u32: u32,
        get_i32: i32,
        get_u64: u64,
        get_i64: i64,
        get_f32: f32,
        get_f64: f64,
    }

    pub fn get_bool(&mut self) -> ModelResult<bool> {
        match self.get_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(ModelError::InvalidValue(format!(
                "{}: invalid bool byte {other}",
                self.name
            ))),
        }
    }

    /// Bytes not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    /// Fails if the blob was not fully consumed.
    pub fn finish(self) -> ModelResult<()> {
        if self.remaining() == 0 {
            Ok(())
        } else {
            Err(ModelError::BlobSize {
                name: self.name,
                expected: self.pos,
                found: self.bytes.len(),
            })
        }
    }
}
