//! Graph codec: a registry snapshot to and from the save format.
//!
//! Decoding is a single forward pass. A reference to a slot that has
//! already been read binds immediately; anything else becomes a pending
//! field plus a recorded fixup. Once every slot is read, fixups run in the
//! order they were recorded and bind against the complete entity table.
//! This is what lets cycles and forward references load from one read.

use crate::field_codec::{Pending, Slot, encode_field, read_kind, read_payload};
use crate::format::{EntityHeader, FileHeader, Input, prealloc};
use crate::{StorageError, StorageResult};
use std::collections::HashSet;
use std::io::Read;
use theta_model::{ModelError, TypeCatalog};
use theta_registry::Snapshot;
use theta_types::{EntityRecord, FieldValue, Handle, TypeTag};
use tracing::debug;

/// Encodes a snapshot. Every reference must point at a live entity of the
/// snapshot and every record is checked against its catalog schema; on
/// error nothing is returned.
pub fn encode_graph(snapshot: &Snapshot, catalog: &TypeCatalog) -> StorageResult<Vec<u8>> {
    snapshot.validate()?;

    let held = i32::try_from(snapshot.entities.len())
        .map_err(|_| StorageError::format("too many live entities for one file"))?;
    let freed = i32::try_from(snapshot.freed.len())
        .map_err(|_| StorageError::format("too many freed handles for one file"))?;

    // Snapshot::validate bounds every record handle by `next`.
    let mut slots: Vec<Option<&EntityRecord>> = vec![None; snapshot.next as usize];
    for record in &snapshot.entities {
        slots[record.handle.index()] = Some(record);
    }
    check_references(&slots)?;

    let mut out = Vec::new();
    FileHeader::new(held, freed, snapshot.next).write(&mut out);
    for handle in &snapshot.freed {
        out.extend_from_slice(&handle.get().to_le_bytes());
    }

    for raw in 0..snapshot.next {
        let handle = Handle::new(raw);
        let Some(record) = slots[handle.index()] else {
            EntityHeader::freed(handle).write(&mut out);
            continue;
        };
        let entry = catalog.entry(record.type_tag)?;
        entry.schema.check(entry.name, &record.fields)?;
        // Catalog registration caps field counts at u8::MAX.
        let field_count = u8::try_from(record.fields.len()).map_err(|_| {
            ModelError::TooManyFields {
                type_name: entry.name,
                count: record.fields.len(),
                max: u8::MAX as usize,
            }
        })?;
        EntityHeader::live(handle, record.type_tag, field_count).write(&mut out);
        for value in &record.fields {
            encode_field(&mut out, value, catalog)?;
        }
    }

    debug!(
        "Encoded {} entities ({} freed) into {} bytes",
        held,
        freed,
        out.len()
    );
    Ok(out)
}

/// Fails on the first reference, in slot order, to a handle that is not
/// live in `slots`. Such a file could be written but never loaded.
fn check_references(slots: &[Option<&EntityRecord>]) -> StorageResult<()> {
    for record in slots.iter().flatten() {
        for target in record.references() {
            if !matches!(slots.get(target.index()), Some(Some(_))) {
                return Err(StorageError::UnresolvedReference {
                    target,
                    owner: record.handle,
                });
            }
        }
    }
    Ok(())
}

/// A reference read before its target's slot.
#[derive(Debug, Clone, Copy)]
struct Fixup {
    owner: Handle,
    field: usize,
    element: Option<usize>,
    target: Handle,
}

struct PendingRecord {
    handle: Handle,
    type_tag: TypeTag,
    fields: Vec<Slot>,
}

/// Decodes a save file into a snapshot.
///
/// The whole stream is consumed and cross-checked (header counts, the freed
/// list against freed slots, slot order, trailing bytes) before anything is
/// returned, so a caller never sees a partial graph.
pub fn decode_graph<R: Read>(reader: R, catalog: &TypeCatalog) -> StorageResult<Snapshot> {
    let mut input = Input::new(reader);
    let header = FileHeader::read(&mut input)?;

    let freed_count = header.freed as usize;
    let mut freed = Vec::with_capacity(prealloc(freed_count));
    let mut freed_set = HashSet::with_capacity(prealloc(freed_count));
    for _ in 0..freed_count {
        let handle = Handle::new(input.u32("freed handle")?);
        if handle.get() >= header.next {
            return Err(StorageError::format(format!(
                "freed handle {handle} is beyond next handle {}",
                header.next
            )));
        }
        if !freed_set.insert(handle) {
            return Err(StorageError::format(format!(
                "freed handle {handle} listed twice"
            )));
        }
        freed.push(handle);
    }

    let mut materialized: HashSet<Handle> = HashSet::with_capacity(prealloc(header.held as usize));
    let mut fixups: Vec<Fixup> = Vec::new();
    let mut records: Vec<PendingRecord> = Vec::with_capacity(prealloc(header.held as usize));

    for raw in 0..header.next {
        let slot = EntityHeader::read(&mut input)?;
        if slot.handle.get() != raw {
            return Err(StorageError::format(format!(
                "slot {raw} carries handle {}",
                slot.handle
            )));
        }

        if slot.is_freed() {
            if slot.field_count != 0 {
                return Err(StorageError::format(format!(
                    "freed slot {} declares {} fields",
                    slot.handle, slot.field_count
                )));
            }
            if !freed_set.contains(&slot.handle) {
                return Err(StorageError::format(format!(
                    "freed slot {} missing from the freed list",
                    slot.handle
                )));
            }
            continue;
        }

        if freed_set.contains(&slot.handle) {
            return Err(StorageError::format(format!(
                "live slot {} is also listed as freed",
                slot.handle
            )));
        }

        let entry = catalog.entry(slot.type_tag)?;
        let expected = entry.field_count();
        if usize::from(slot.field_count) != expected {
            return Err(ModelError::FieldCount {
                type_name: entry.name,
                expected,
                found: usize::from(slot.field_count),
            }
            .into());
        }

        // Marked before its fields so self-references bind immediately.
        materialized.insert(slot.handle);

        let owner = slot.handle;
        let mut fields = Vec::with_capacity(expected);
        for (position, spec) in entry.schema.fields().iter().enumerate() {
            let kind = read_kind(&mut input, catalog)?;
            if kind != spec.kind {
                return Err(ModelError::FieldMismatch {
                    type_name: entry.name,
                    position,
                    expected: spec.kind.clone(),
                    found: kind,
                }
                .into());
            }
            let value = read_payload(
                &mut input,
                &kind,
                catalog,
                &mut |target: Handle, element: Option<usize>| {
                    if materialized.contains(&target) {
                        Slot::Resolved(FieldValue::Ref(Some(target)))
                    } else {
                        fixups.push(Fixup {
                            owner,
                            field: position,
                            element,
                            target,
                        });
                        Slot::Pending(Pending::Ref(fixups.len() - 1))
                    }
                },
            )?;
            fields.push(value);
        }

        records.push(PendingRecord {
            handle: owner,
            type_tag: slot.type_tag,
            fields,
        });
    }

    input.expect_end()?;

    let bound = run_fixups(&fixups, &materialized)?;
    debug!(
        "Decoded {} entities, {} freed, {} fixups",
        records.len(),
        freed.len(),
        fixups.len()
    );

    let entities = records
        .into_iter()
        .map(|record| {
            EntityRecord::new(
                record.handle,
                record.type_tag,
                record
                    .fields
                    .into_iter()
                    .map(|slot| slot.resolve(&bound))
                    .collect(),
            )
        })
        .collect();

    Ok(Snapshot::new(header.next, freed, entities))
}

/// Binds every fixup, in recorded order, against the complete table.
fn run_fixups(
    fixups: &[Fixup],
    materialized: &HashSet<Handle>,
) -> StorageResult<Vec<Option<Handle>>> {
    fixups
        .iter()
        .map(|fixup| {
            if materialized.contains(&fixup.target) {
                Ok(Some(fixup.target))
            } else {
                debug!(
                    "Unresolved reference in {} field {} element {:?} to {}",
                    fixup.owner, fixup.field, fixup.element, fixup.target
                );
                Err(StorageError::UnresolvedReference {
                    target: fixup.target,
                    owner: fixup.owner,
                })
            }
        })
        .collect()
}
