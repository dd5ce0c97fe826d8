//! Field encoding: a kind descriptor followed by the value's payload.
//!
//! Descriptors are a one-byte type code; blobs append their `u16` id and
//! arrays append their element descriptor. Array payloads are an `i32`
//! count followed by bare element payloads.

use crate::format::{Input, MAX_ARRAY_LEN, MAX_KIND_DEPTH, MAX_STRING_LEN, prealloc};
use crate::{StorageError, StorageResult};
use std::io::Read;
use theta_model::{ModelError, TypeCatalog};
use theta_types::{BlobId, Decimal, FieldKind, FieldValue, Handle, RawBlob};

/// A decoded field whose references may still be waiting for their target.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Slot {
    Resolved(FieldValue),
    Pending(Pending),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Pending {
    /// A reference bound by the fixup with this index.
    Ref(usize),
    /// An array with at least one pending element.
    Array { element: FieldKind, items: Vec<Slot> },
}

impl Slot {
    /// Replaces every pending reference with its fixup's result.
    pub(crate) fn resolve(self, fixups: &[Option<Handle>]) -> FieldValue {
        match self {
            Self::Resolved(value) => value,
            Self::Pending(Pending::Ref(token)) => {
                FieldValue::Ref(fixups.get(token).copied().flatten())
            }
            Self::Pending(Pending::Array { element, items }) => FieldValue::Array {
                element,
                items: items.into_iter().map(|s| s.resolve(fixups)).collect(),
            },
        }
    }
}

// ── Encode ──────────────────────────────────────────────────────

/// Appends `value` (descriptor and payload) to `out`.
///
/// The value is checked first: an unregistered blob, a blob of the wrong
/// size, a heterogeneous array or an oversize payload is a schema error and
/// leaves `out` untouched.
pub fn encode_field(
    out: &mut Vec<u8>,
    value: &FieldValue,
    catalog: &TypeCatalog,
) -> StorageResult<()> {
    let kind = value.kind();
    check_kind(&kind, catalog, 0)?;
    check_value(value, &kind, catalog)?;
    write_kind(out, &kind);
    write_payload(out, value);
    Ok(())
}

fn check_kind(kind: &FieldKind, catalog: &TypeCatalog, depth: usize) -> StorageResult<()> {
    match kind {
        FieldKind::Blob(id) => {
            catalog.blob(*id)?;
        }
        FieldKind::Array(element) => {
            if depth >= MAX_KIND_DEPTH {
                return Err(ModelError::InvalidValue(format!(
                    "array nesting deeper than {MAX_KIND_DEPTH}"
                ))
                .into());
            }
            check_kind(element, catalog, depth + 1)?;
        }
        _ => {}
    }
    Ok(())
}

fn check_value(value: &FieldValue, kind: &FieldKind, catalog: &TypeCatalog) -> StorageResult<()> {
    if !value.conforms_to(kind) {
        return Err(ModelError::InvalidValue(format!(
            "{} value does not conform to {kind}",
            value.kind()
        ))
        .into());
    }
    match value {
        FieldValue::Blob(raw) => {
            let spec = catalog.blob(raw.id)?;
            if raw.bytes.len() != spec.size {
                return Err(ModelError::BlobSize {
                    name: spec.name,
                    expected: spec.size,
                    found: raw.bytes.len(),
                }
                .into());
            }
        }
        FieldValue::String(s) if s.len() > MAX_STRING_LEN => {
            return Err(ModelError::InvalidValue(format!(
                "string of {} bytes exceeds {MAX_STRING_LEN}",
                s.len()
            ))
            .into());
        }
        FieldValue::Ref(Some(handle)) if handle.get() == Handle::NULL_RAW => {
            return Err(ModelError::InvalidValue("reference to the null handle".into()).into());
        }
        FieldValue::Array { element, items } => {
            if items.len() > MAX_ARRAY_LEN {
                return Err(ModelError::InvalidValue(format!(
                    "array of {} elements exceeds {MAX_ARRAY_LEN}",
                    items.len()
                ))
                .into());
            }
            for item in items {
                check_value(item, element, catalog)?;
            }
        }
        _ => {}
    }
    Ok(())
}

fn write_kind(out: &mut Vec<u8>, kind: &FieldKind) {
    out.push(kind.code());
    match kind {
        FieldKind::Blob(id) => out.extend_from_slice(&id.get().to_le_bytes()),
        FieldKind::Array(element) => write_kind(out, element),
        _ => {}
    }
}

fn write_payload(out: &mut Vec<u8>, value: &FieldValue) {
    match value {
        FieldValue::Bool(v) => out.push(u8::from(*v)),
        FieldValue::Char(v) => out.extend_from_slice(&u32::from(*v).to_le_bytes()),
        FieldValue::I8(v) => out.extend_from_slice(&v.to_le_bytes()),
        FieldValue::U8(v) => out.push(*v),
        FieldValue::I16(v) => out.extend_from_slice(&v.to_le_bytes()),
        FieldValue::U16(v) => out.extend_from_slice(&v.to_le_bytes()),
        FieldValue::I32(v) => out.extend_from_slice(&v.to_le_bytes()),
        FieldValue::U32(v) => out.extend_from_slice(&v.to_le_bytes()),
        FieldValue::I64(v) => out.extend_from_slice(&v.to_le_bytes()),
        FieldValue::U64(v) => out.extend_from_slice(&v.to_le_bytes()),
        FieldValue::F32(v) => out.extend_from_slice(&v.to_le_bytes()),
        FieldValue::F64(v) => out.extend_from_slice(&v.to_le_bytes()),
        FieldValue::Decimal(v) => {
            for word in v.to_bits() {
                out.extend_from_slice(&word.to_le_bytes());
            }
        }
        FieldValue::String(v) => {
            // Length was bounded by check_value.
            write_varint(out, v.len() as u32);
            out.extend_from_slice(v.as_bytes());
        }
        FieldValue::Blob(raw) => out.extend_from_slice(&raw.bytes),
        FieldValue::Ref(handle) => out.extend_from_slice(&Handle::to_raw(*handle).to_le_bytes()),
        FieldValue::Array { items, .. } => {
            out.extend_from_slice(&(items.len() as i32).to_le_bytes());
            for item in items {
                write_payload(out, item);
            }
        }
    }
}

/// 7-bit groups, low first, high bit set on every byte but the last.
pub(crate) fn write_varint(out: &mut Vec<u8>, mut value: u32) {
    while value >= 0x80 {
        out.push((value as u8) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

// ── Decode ──────────────────────────────────────────────────────

/// Reads one field. References are taken at face value.
pub fn decode_field<R: Read>(reader: R, catalog: &TypeCatalog) -> StorageResult<FieldValue> {
    let mut input = Input::new(reader);
    let kind = read_kind(&mut input, catalog)?;
    let slot = read_payload(&mut input, &kind, catalog, &mut |target: Handle, _: Option<usize>| {
        Slot::Resolved(FieldValue::Ref(Some(target)))
    })?;
    Ok(slot.resolve(&[]))
}

pub(crate) fn read_kind<R: Read>(
    input: &mut Input<R>,
    catalog: &TypeCatalog,
) -> StorageResult<FieldKind> {
    read_kind_at(input, catalog, 0)
}

fn read_kind_at<R: Read>(
    input: &mut Input<R>,
    catalog: &TypeCatalog,
    depth: usize,
) -> StorageResult<FieldKind> {
    let code = input.u8("field type code")?;
    match code {
        FieldKind::CODE_BLOB => {
            let id = BlobId::new(input.u16("blob id")?);
            catalog.blob(id)?;
            Ok(FieldKind::Blob(id))
        }
        FieldKind::CODE_ARRAY => {
            if depth >= MAX_KIND_DEPTH {
                return Err(StorageError::format(format!(
                    "array descriptor nested deeper than {MAX_KIND_DEPTH}"
                )));
            }
            let element = read_kind_at(input, catalog, depth + 1)?;
            Ok(FieldKind::array_of(element))
        }
        other => FieldKind::scalar_from_code(other)
            .ok_or_else(|| ModelError::UnknownFieldCode(other).into()),
    }
}

/// Reads a payload of `kind`. `on_ref` decides how each non-null reference
/// is bound; it receives the target and, inside arrays, the element index.
pub(crate) fn read_payload<R: Read>(
    input: &mut Input<R>,
    kind: &FieldKind,
    catalog: &TypeCatalog,
    on_ref: &mut dyn FnMut(Handle, Option<usize>) -> Slot,
) -> StorageResult<Slot> {
    read_element(input, kind, catalog, on_ref, None)
}

fn read_element<R: Read>(
    input: &mut Input<R>,
    kind: &FieldKind,
    catalog: &TypeCatalog,
    on_ref: &mut dyn FnMut(Handle, Option<usize>) -> Slot,
    index: Option<usize>,
) -> StorageResult<Slot> {
    let value = match kind {
        FieldKind::Bool => match input.u8("bool")? {
            0 => FieldValue::Bool(false),
            1 => FieldValue::Bool(true),
            other => {
                return Err(StorageError::format(format!(
                    "invalid bool byte {other} at byte {}",
                    input.offset() - 1
                )));
            }
        },
        FieldKind::Char => {
            let raw = input.u32("char")?;
            let c = char::from_u32(raw).ok_or_else(|| {
                StorageError::format(format!("invalid char scalar {raw:#x}"))
            })?;
            FieldValue::Char(c)
        }
        FieldKind::I8 => FieldValue::I8(input.i8("i8")?),
        FieldKind::U8 => FieldValue::U8(input.u8("u8")?),
        FieldKind::I16 => FieldValue::I16(input.i16("i16")?),
        FieldKind::U16 => FieldValue::U16(input.u16("u16")?),
        FieldKind::I32 => FieldValue::I32(input.i32("i32")?),
        FieldKind::U32 => FieldValue::U32(input.u32("u32")?),
        FieldKind::I64 => FieldValue::I64(input.i64("i64")?),
        FieldKind::U64 => FieldValue::U64(input.u64("u64")?),
        FieldKind::F32 => FieldValue::F32(input.f32("f32")?),
        FieldKind::F64 => FieldValue::F64(input.f64("f64")?),
        FieldKind::Decimal => {
            let bits = [
                input.i32("decimal lo")?,
                input.i32("decimal mid")?,
                input.i32("decimal hi")?,
                input.i32("decimal flags")?,
            ];
            let decimal = Decimal::from_bits(bits)
                .map_err(|e| StorageError::format(format!("malformed decimal: {e}")))?;
            FieldValue::Decimal(decimal)
        }
        FieldKind::String => {
            let len = read_varint(input)? as usize;
            if len > MAX_STRING_LEN {
                return Err(StorageError::format(format!(
                    "string length {len} exceeds {MAX_STRING_LEN}"
                )));
            }
            let bytes = input.bytes(len, "string")?;
            let s = String::from_utf8(bytes)
                .map_err(|e| StorageError::format(format!("invalid UTF-8 string: {e}")))?;
            FieldValue::String(s)
        }
        FieldKind::Blob(id) => {
            let spec = catalog.blob(*id)?;
            let bytes = input.bytes(spec.size, spec.name)?;
            FieldValue::Blob(RawBlob::new(*id, bytes))
        }
        FieldKind::Ref => match Handle::from_raw(input.u32("reference")?) {
            None => FieldValue::Ref(None),
            Some(target) => return Ok(on_ref(target, index)),
        },
        FieldKind::Array(element) => return read_array(input, element, catalog, on_ref),
    };
    Ok(Slot::Resolved(value))
}

fn read_array<R: Read>(
    input: &mut Input<R>,
    element: &FieldKind,
    catalog: &TypeCatalog,
    on_ref: &mut dyn FnMut(Handle, Option<usize>) -> Slot,
) -> StorageResult<Slot> {
    let count = input.i32("array length")?;
    let count = usize::try_from(count)
        .map_err(|_| StorageError::format(format!("negative array length {count}")))?;
    if count > MAX_ARRAY_LEN {
        return Err(StorageError::format(format!(
            "array length {count} exceeds {MAX_ARRAY_LEN}"
        )));
    }

    let mut items = Vec::with_capacity(prealloc(count));
    let mut pending = false;
    for i in 0..count {
        let slot = read_element(input, element, catalog, on_ref, Some(i))?;
        pending |= matches!(slot, Slot::Pending(_));
        items.push(slot);
    }

    if pending {
        Ok(Slot::Pending(Pending::Array {
            element: element.clone(),
            items,
        }))
    } else {
        let items = items.into_iter().map(|s| s.resolve(&[])).collect();
        Ok(Slot::Resolved(FieldValue::array(element.clone(), items)))
    }
}

pub(crate) fn read_varint<R: Read>(input: &mut Input<R>) -> StorageResult<u32> {
    let mut value: u32 = 0;
    for shift in (0..35).step_by(7) {
        let byte = input.u8("string length")?;
        let bits = u32::from(byte & 0x7F);
        if shift == 28 && bits > 0x0F {
            return Err(StorageError::format("string length overflows u32"));
        }
        value |= bits << shift;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(StorageError::format("string length prefix longer than 5 bytes"))
}
