//! Byte layout of a save file.
//!
//! ```text
//! FileHeader (24 bytes)
//!   magic     [u8; 4]  "THTA"
//!   version   u32
//!   held      i32
//!   freed     i32
//!   next      u32
//!   checksum  u32      reserved, written as 0, not validated
//! freed list  freed × u32, oldest first
//! slots       next × (EntityHeader + fields)
//! ```
//!
//! Every integer is little-endian.

use crate::{StorageError, StorageResult};
use std::io::{ErrorKind, Read};
use theta_types::{Handle, TypeTag};

pub const MAGIC: [u8; 4] = *b"THTA";
pub const FORMAT_VERSION: u32 = 1;
pub const HEADER_LEN: usize = 24;
pub const ENTITY_HEADER_LEN: usize = 8;
pub const SAVE_EXTENSION: &str = "ths";

/// Longest string payload accepted (16 MiB).
pub const MAX_STRING_LEN: usize = 16 * 1024 * 1024;
/// Most elements accepted in one array.
pub const MAX_ARRAY_LEN: usize = 16 * 1024 * 1024;
/// Deepest accepted nesting of array descriptors.
pub const MAX_KIND_DEPTH: usize = 8;

/// Upper bound on speculative preallocation while decoding.
const PREALLOC_LIMIT: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    pub version: u32,
    pub held: i32,
    pub freed: i32,
    pub next: u32,
    pub checksum: u32,
}

impl FileHeader {
    #[must_use]
    pub fn new(held: i32, freed: i32, next: u32) -> Self {
        Self {
            version: FORMAT_VERSION,
            held,
            freed,
            next,
            checksum: 0,
        }
    }

    pub fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&MAGIC);
        out.extend_from_slice(&self.version.to_le_bytes());
        out.extend_from_slice(&self.held.to_le_bytes());
        out.extend_from_slice(&self.freed.to_le_bytes());
        out.extend_from_slice(&self.next.to_le_bytes());
        out.extend_from_slice(&self.checksum.to_le_bytes());
    }

    /// Reads and validates the header. Magic and version are checked
    /// before anything else is trusted.
    pub(crate) fn read<R: Read>(input: &mut Input<R>) -> StorageResult<Self> {
        let magic: [u8; 4] = input.array("magic")?;
        if magic != MAGIC {
            return Err(StorageError::format(format!(
                "bad magic {magic:02x?}, expected {MAGIC:02x?}"
            )));
        }
        let version = input.u32("version")?;
        if version != FORMAT_VERSION {
            return Err(StorageError::format(format!(
                "unsupported version {version}, expected {FORMAT_VERSION}"
            )));
        }
        let header = Self {
            version,
            held: input.i32("held count")?,
            freed: input.i32("freed count")?,
            next: input.u32("next handle")?,
            checksum: input.u32("checksum")?,
        };
        if header.held < 0 || header.freed < 0 {
            return Err(StorageError::format(format!(
                "negative counts: {} held, {} freed",
                header.held, header.freed
            )));
        }
        if header.next == Handle::NULL_RAW {
            return Err(StorageError::format("next handle is the null sentinel"));
        }
        if header.held as u64 + header.freed as u64 != u64::from(header.next) {
            return Err(StorageError::format(format!(
                "{} held + {} freed does not match next handle {}",
                header.held, header.freed, header.next
            )));
        }
        Ok(header)
    }
}

/// Per-slot header. A slot tagged [`TypeTag::FREED_SLOT`] is a freed handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityHeader {
    pub handle: Handle,
    pub type_tag: TypeTag,
    pub field_count: u8,
    pub flags: u8,
}

impl EntityHeader {
    #[must_use]
    pub fn live(handle: Handle, type_tag: TypeTag, field_count: u8) -> Self {
        Self {
            handle,
            type_tag,
            field_count,
            flags: 0,
        }
    }

    #[must_use]
    pub fn freed(handle: Handle) -> Self {
        Self::live(handle, TypeTag::FREED_SLOT, 0)
    }

    #[must_use]
    pub fn is_freed(&self) -> bool {
        self.type_tag.is_reserved()
    }

    pub fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.handle.get().to_le_bytes());
        out.extend_from_slice(&self.type_tag.get().to_le_bytes());
        out.push(self.field_count);
        out.push(self.flags);
    }

    pub(crate) fn read<R: Read>(input: &mut Input<R>) -> StorageResult<Self> {
        Ok(Self {
            handle: Handle::new(input.u32("entity handle")?),
            type_tag: TypeTag::new(input.u16("type tag")?),
            field_count: input.u8("field count")?,
            flags: input.u8("entity flags")?,
        })
    }
}

/// Capacity to reserve for `count` decoded items.
pub(crate) fn prealloc(count: usize) -> usize {
    count.min(PREALLOC_LIMIT)
}

/// Little-endian reader that turns truncation into a format error and
/// tracks its offset for messages.
pub(crate) struct Input<R> {
    inner: R,
    offset: u64,
}

macro_rules! read_le {
    ($($name:ident: $ty:ty),* $(,)?) => {
        $(
            pub(crate) fn $name(&mut self, what: &str) -> StorageResult<$ty> {
                Ok(<$ty>::from_le_bytes(self.array(what)?))
            }
        )*
    };
}

impl<R: Read> Input<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self { inner, offset: 0 }
    }

    pub(crate) fn array<const N: usize>(&mut self, what: &str) -> StorageResult<[u8; N]> {
        let mut buf = [0u8; N];
        self.fill(&mut buf, what)?;
        Ok(buf)
    }

    pub(crate) fn bytes(&mut self, len: usize, what: &str) -> StorageResult<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.fill(&mut buf, what)?;
        Ok(buf)
    }

    fn fill(&mut self, buf: &mut [u8], what: &str) -> StorageResult<()> {
        match self.inner.read_exact(buf) {
            Ok(()) => {
                self.offset += buf.len() as u64;
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => Err(StorageError::format(format!(
                "truncated file: {what} at byte {}",
                self.offset
            ))),
            Err(e) => Err(e.into()),
        }
    }

    read_le! {
        u8: u8,
        u16: u16,
        u32: u32,
        i32: i32,
        i8: i8,
        i16: i16,
        i64: i64,
        u64: u64,
        f32: f32,
        f64: f64,
    }

    pub(crate) fn offset(&self) -> u64 {
        self.offset
    }

    /// Fails if any byte remains.
    pub(crate) fn expect_end(&mut self) -> StorageResult<()> {
        let mut probe = [0u8; 1];
        loop {
            match self.inner.read(&mut probe) {
                Ok(0) => return Ok(()),
                Ok(_) => {
                    return Err(StorageError::format(format!(
                        "trailing bytes after byte {}",
                        self.offset
                    )));
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
    }
}
